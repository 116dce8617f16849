//! Core social logic for Warbler
//!
//! This crate contains the identity store, the follow graph, the post
//! store, token-based authentication, and feed aggregation, plus the
//! service facade that a request layer drives.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod auth;
pub mod error;
pub mod feeds;
pub mod graph;
pub mod identity;
pub mod posts;
pub mod profiles;
pub mod schema;
pub mod seed;
pub mod service;
pub mod token;

pub use error::{Result, SocialError};
pub use feeds::RenderedPost;
pub use identity::User;
pub use posts::Post;
pub use profiles::UserSummary;
pub use service::SocialService;
