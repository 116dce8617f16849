//! Post store
//!
//! Posts are append-only: created once, never edited or deleted. Ids come
//! from SQLite `AUTOINCREMENT`, so they increase store-wide in creation
//! order and are never reused.

use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite};
use storage::{Database, DatabaseError, SqliteDatabase};

use crate::error::{abort, Result, SocialError};
use crate::identity::User;

/// Maximum post length in characters
pub const MAX_POST_LENGTH: usize = 140;

/// A stored post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Store-wide, strictly increasing id
    pub id: i64,

    /// Username of the author
    pub author: String,

    /// Post text
    pub content: String,

    /// Creation time in microseconds since the Unix epoch
    pub created_at: i64,
}

/// Current time in microseconds since the Unix epoch
pub fn now_micros() -> i64 {
    chrono::Utc::now().timestamp_micros()
}

/// Store of posts
#[derive(Debug, Clone)]
pub struct PostStore {
    db: SqliteDatabase,
}

impl PostStore {
    /// Create a post store over `db`
    pub fn new(db: SqliteDatabase) -> Self {
        Self { db }
    }

    /// Publish a post by `author`, stamped with the current time
    ///
    /// # Errors
    ///
    /// - `SocialError::ContentTooLong` - content exceeds [`MAX_POST_LENGTH`] characters
    /// - `SocialError::Persistence` - the insert failed, e.g. the author no longer exists
    pub async fn create_post(&self, author: &User, content: &str) -> Result<Post> {
        self.insert_post(&author.username, content, now_micros()).await
    }

    pub(crate) async fn insert_post(
        &self,
        author: &str,
        content: &str,
        created_at: i64,
    ) -> Result<Post> {
        let length = content.chars().count();
        if length > MAX_POST_LENGTH {
            return Err(SocialError::ContentTooLong {
                length,
                max: MAX_POST_LENGTH,
            });
        }

        let mut tx = self.db.begin().await?;

        let inserted =
            sqlx::query("INSERT INTO posts (author, content, created_at) VALUES (?, ?, ?)")
                .bind(author)
                .bind(content)
                .bind(created_at)
                .execute(tx.conn()?)
                .await
                .map_err(DatabaseError::from);

        let id = match inserted {
            Ok(result) => result.last_insert_rowid(),
            Err(e) => {
                tracing::error!(author, error = %e, "Failed to store post");
                return Err(abort(tx, SocialError::Persistence(e)).await);
            }
        };

        tx.commit().await?;
        tracing::info!(author, id, "Post created");

        Ok(Post {
            id,
            author: author.to_string(),
            content: content.to_string(),
            created_at,
        })
    }

    /// Posts written by `username`, in id order
    pub async fn list_by_author(&self, username: &str) -> Result<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(
            "SELECT id, author, content, created_at FROM posts WHERE author = ? ORDER BY id ASC",
        )
        .bind(username)
        .fetch_all(self.db.pool())
        .await?;
        Ok(posts)
    }

    /// Posts written by any of `usernames`, in id order
    pub async fn list_by_authors(&self, usernames: &[String]) -> Result<Vec<Post>> {
        if usernames.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT id, author, content, created_at FROM posts WHERE author IN (");
        let mut separated = query.separated(", ");
        for username in usernames {
            separated.push_bind(username);
        }
        separated.push_unseparated(") ORDER BY id ASC");

        let posts = query
            .build_query_as::<Post>()
            .fetch_all(self.db.pool())
            .await?;
        Ok(posts)
    }

    /// Number of posts written by `username`
    pub async fn count_by_author(&self, username: &str) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE author = ?")
            .bind(username)
            .fetch_one(self.db.pool())
            .await?;
        Ok(count as u64)
    }
}
