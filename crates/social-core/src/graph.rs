//! Social graph
//!
//! Follow relations live in the `follow_edges` table, one row per ordered
//! `(follower, followed)` pair. Both directions of the graph are read from
//! that one table by fixing the appropriate column; nothing is stored twice.
//!
//! Self-follows are accepted and there is no unfollow.

use storage::{Database, DatabaseError, SqliteDatabase};

use crate::error::{abort, Result, SocialError};
use crate::identity::User;

/// Follow relation over registered users
#[derive(Debug, Clone)]
pub struct SocialGraph {
    db: SqliteDatabase,
}

impl SocialGraph {
    /// Create a social graph over `db`
    pub fn new(db: SqliteDatabase) -> Self {
        Self { db }
    }

    /// Record that `follower` follows `followee`
    ///
    /// # Errors
    ///
    /// - `SocialError::NotFound` - `followee` is not a registered user
    /// - `SocialError::AlreadyFollowing` - the edge already exists
    pub async fn follow(&self, follower: &str, followee: &str) -> Result<()> {
        let mut tx = self.db.begin().await?;

        // Insert straight away: the edge's foreign keys and primary key
        // decide missing users and duplicates, including concurrent ones.
        let inserted = sqlx::query("INSERT INTO follow_edges (follower, followed) VALUES (?, ?)")
            .bind(follower)
            .bind(followee)
            .execute(tx.conn()?)
            .await
            .map_err(DatabaseError::from);

        if let Err(e) = inserted {
            let err = if e.is_unique_violation() {
                SocialError::AlreadyFollowing(followee.to_string())
            } else if e.is_foreign_key_violation() {
                SocialError::NotFound(followee.to_string())
            } else {
                SocialError::Persistence(e)
            };
            return Err(abort(tx, err).await);
        }

        tx.commit().await?;
        tracing::info!(follower, followee, "Follow edge created");

        Ok(())
    }

    /// Users that `username` follows, ordered by username
    pub async fn list_following(&self, username: &str) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT u.username, u.password
             FROM follow_edges e
             JOIN users u ON u.username = e.followed
             WHERE e.follower = ?
             ORDER BY u.username ASC",
        )
        .bind(username)
        .fetch_all(self.db.pool())
        .await?;
        Ok(users)
    }

    /// Users that follow `username`, ordered by username
    pub async fn list_followers(&self, username: &str) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT u.username, u.password
             FROM follow_edges e
             JOIN users u ON u.username = e.follower
             WHERE e.followed = ?
             ORDER BY u.username ASC",
        )
        .bind(username)
        .fetch_all(self.db.pool())
        .await?;
        Ok(users)
    }

    /// Every user except `excluding`, ordered by username
    pub async fn list_other_users(&self, excluding: &str) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT username, password FROM users WHERE username <> ? ORDER BY username ASC",
        )
        .bind(excluding)
        .fetch_all(self.db.pool())
        .await?;
        Ok(users)
    }

    /// Number of users `username` follows
    pub async fn following_count(&self, username: &str) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follow_edges WHERE follower = ?")
            .bind(username)
            .fetch_one(self.db.pool())
            .await?;
        Ok(count as u64)
    }

    /// Number of users following `username`
    pub async fn follower_count(&self, username: &str) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follow_edges WHERE followed = ?")
            .bind(username)
            .fetch_one(self.db.pool())
            .await?;
        Ok(count as u64)
    }
}
