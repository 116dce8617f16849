//! User profile summaries

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::graph::SocialGraph;
use crate::identity::User;
use crate::posts::PostStore;

/// A user together with their derived counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    /// Username
    pub username: String,
    /// Number of users this user follows
    pub following_count: u64,
    /// Number of users following this user
    pub follower_count: u64,
    /// Number of posts written by this user
    pub post_count: u64,
}

/// Computes profile summaries; counts are never stored
#[derive(Debug, Clone)]
pub struct ProfileService {
    graph: SocialGraph,
    posts: PostStore,
}

impl ProfileService {
    /// Create a profile service
    pub fn new(graph: SocialGraph, posts: PostStore) -> Self {
        Self { graph, posts }
    }

    /// Summarize a single user
    pub async fn summarize(&self, user: &User) -> Result<UserSummary> {
        Ok(UserSummary {
            username: user.username.clone(),
            following_count: self.graph.following_count(&user.username).await?,
            follower_count: self.graph.follower_count(&user.username).await?,
            post_count: self.posts.count_by_author(&user.username).await?,
        })
    }

    /// Summarize each user, preserving order
    pub async fn summarize_all(&self, users: &[User]) -> Result<Vec<UserSummary>> {
        let mut summaries = Vec::with_capacity(users.len());
        for user in users {
            summaries.push(self.summarize(user).await?);
        }
        Ok(summaries)
    }
}
