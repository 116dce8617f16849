//! Feed aggregation
//!
//! A user's feed is their own posts merged with the posts of everyone they
//! follow, newest first, with timestamps rendered for display. Feeds are
//! built in full on every call; there is no pagination or cap.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::Result;
use crate::graph::SocialGraph;
use crate::identity::User;
use crate::posts::{Post, PostStore};

/// Display format for post timestamps
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A post prepared for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedPost {
    /// Post id
    pub id: i64,

    /// Username of the author
    pub author: String,

    /// Post text
    pub content: String,

    /// Creation time as local `YYYY-MM-DD HH:MM:SS`
    pub time: String,

    /// Creation time in microseconds since the Unix epoch
    pub epoch: i64,
}

/// Builds feeds from the follow graph and the post store
#[derive(Debug, Clone)]
pub struct FeedAggregator {
    graph: SocialGraph,
    posts: PostStore,
}

impl FeedAggregator {
    /// Create a feed aggregator
    pub fn new(graph: SocialGraph, posts: PostStore) -> Self {
        Self { graph, posts }
    }

    /// Build the full feed for `user`
    pub async fn build_feed(&self, user: &User) -> Result<Vec<RenderedPost>> {
        let mut collected = self.posts.list_by_author(&user.username).await?;

        let following = self.graph.list_following(&user.username).await?;
        let followed: Vec<String> = following
            .into_iter()
            .map(|u| u.username)
            .filter(|name| name != &user.username)
            .collect();
        collected.extend(self.posts.list_by_authors(&followed).await?);

        let merged = merge_posts(collected);

        tracing::debug!(
            username = %user.username,
            following = followed.len(),
            posts = merged.len(),
            "Built feed"
        );

        Ok(merged.iter().map(render_post).collect())
    }
}

/// Deduplicate by id and order newest first
///
/// Posts sharing a timestamp fall back to id order, newest id first, so the
/// result is deterministic for a given set of posts.
pub fn merge_posts(posts: Vec<Post>) -> Vec<Post> {
    let mut seen = HashSet::with_capacity(posts.len());
    let mut merged: Vec<Post> = posts.into_iter().filter(|p| seen.insert(p.id)).collect();
    merged.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    merged
}

/// Render a microsecond epoch as local `YYYY-MM-DD HH:MM:SS`
///
/// Timestamps outside chrono's representable range render as the raw number.
pub fn render_time(epoch_micros: i64) -> String {
    match DateTime::from_timestamp_micros(epoch_micros) {
        Some(utc) => utc.with_timezone(&Local).format(TIME_FORMAT).to_string(),
        None => epoch_micros.to_string(),
    }
}

/// Render a post for display
pub fn render_post(post: &Post) -> RenderedPost {
    RenderedPost {
        id: post.id,
        author: post.author.clone(),
        content: post.content.clone(),
        time: render_time(post.created_at),
        epoch: post.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityStore;
    use crate::schema::test_database;
    use chrono::TimeZone;

    struct Fixture {
        identity: IdentityStore,
        graph: SocialGraph,
        posts: PostStore,
        feeds: FeedAggregator,
    }

    async fn fixture(names: &[&str]) -> Fixture {
        let db = test_database().await;
        let identity = IdentityStore::new(db.clone());
        for name in names {
            identity.register(name, "pw").await.unwrap();
        }
        let graph = SocialGraph::new(db.clone());
        let posts = PostStore::new(db);
        let feeds = FeedAggregator::new(graph.clone(), posts.clone());
        Fixture {
            identity,
            graph,
            posts,
            feeds,
        }
    }

    fn post(id: i64, created_at: i64) -> Post {
        Post {
            id,
            author: "alice".to_string(),
            content: format!("post {}", id),
            created_at,
        }
    }

    #[tokio::test]
    async fn test_feed_includes_own_and_followed_posts() {
        let f = fixture(&["alice", "bob", "carol"]).await;
        f.graph.follow("alice", "bob").await.unwrap();

        f.posts.insert_post("alice", "mine", 1_000).await.unwrap();
        f.posts.insert_post("bob", "followed", 2_000).await.unwrap();
        f.posts.insert_post("carol", "stranger", 3_000).await.unwrap();

        let alice = f.identity.find_by_username("alice").await.unwrap();
        let feed = f.feeds.build_feed(&alice).await.unwrap();

        let contents: Vec<&str> = feed.iter().map(|p| p.content.as_str()).collect();
        assert_eq!(contents, vec!["followed", "mine"]);
    }

    #[tokio::test]
    async fn test_feed_without_follows_is_own_posts() {
        let f = fixture(&["alice", "bob"]).await;
        f.posts.insert_post("alice", "mine", 1_000).await.unwrap();
        f.posts.insert_post("bob", "theirs", 2_000).await.unwrap();

        let alice = f.identity.find_by_username("alice").await.unwrap();
        let feed = f.feeds.build_feed(&alice).await.unwrap();

        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].author, "alice");
    }

    #[tokio::test]
    async fn test_feed_strictly_descending() {
        let f = fixture(&["alice", "bob", "carol"]).await;
        f.graph.follow("alice", "bob").await.unwrap();
        f.graph.follow("alice", "carol").await.unwrap();

        // Inserted out of time order on purpose
        for (author, at) in [("carol", 500), ("alice", 300), ("bob", 900), ("alice", 100), ("bob", 700)] {
            f.posts.insert_post(author, "x", at).await.unwrap();
        }

        let alice = f.identity.find_by_username("alice").await.unwrap();
        let feed = f.feeds.build_feed(&alice).await.unwrap();

        let epochs: Vec<i64> = feed.iter().map(|p| p.epoch).collect();
        assert_eq!(epochs, vec![900, 700, 500, 300, 100]);
    }

    #[tokio::test]
    async fn test_self_follow_does_not_duplicate() {
        let f = fixture(&["alice"]).await;
        f.graph.follow("alice", "alice").await.unwrap();
        f.posts.insert_post("alice", "mine", 1_000).await.unwrap();

        let alice = f.identity.find_by_username("alice").await.unwrap();
        let feed = f.feeds.build_feed(&alice).await.unwrap();
        assert_eq!(feed.len(), 1);
    }

    #[test]
    fn test_merge_ties_break_by_id() {
        let merged = merge_posts(vec![post(1, 10), post(3, 10), post(2, 20), post(4, 10)]);
        let ids: Vec<i64> = merged.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 4, 3, 1]);
    }

    #[test]
    fn test_merge_drops_duplicates() {
        let merged = merge_posts(vec![post(1, 10), post(1, 10), post(2, 5)]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_render_time_matches_local_clock() {
        let epoch = 1_700_000_000_123_456;
        let expected = Local
            .timestamp_opt(1_700_000_000, 123_456_000)
            .unwrap()
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        assert_eq!(render_time(epoch), expected);
    }

    #[test]
    fn test_render_time_shape() {
        let rendered = render_time(0);
        assert_eq!(rendered.len(), 19);
        assert_eq!(&rendered[4..5], "-");
        assert_eq!(&rendered[10..11], " ");
        assert_eq!(&rendered[13..14], ":");
    }

    #[test]
    fn test_render_post() {
        let rendered = render_post(&post(7, 1_700_000_000_000_000));
        assert_eq!(rendered.id, 7);
        assert_eq!(rendered.author, "alice");
        assert_eq!(rendered.content, "post 7");
        assert_eq!(rendered.epoch, 1_700_000_000_000_000);
        assert_eq!(rendered.time, render_time(1_700_000_000_000_000));
    }
}
