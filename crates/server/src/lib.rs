//! HTTP front end for Warbler
//!
//! Exposes [`social_core::SocialService`] as JSON routes over axum.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod routes;

pub use config::ServerConfig;
pub use routes::router;
