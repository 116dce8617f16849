//! Identity store
//!
//! Users and their credentials. Registration is the only mutation; users
//! are never deleted and their password never changes.

use serde::{Deserialize, Serialize};
use storage::{Database, DatabaseError, SqliteDatabase};

use crate::error::{abort, Result, SocialError};

/// A registered user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique, immutable username
    pub username: String,

    /// Password as given at registration
    #[serde(skip_serializing, default)]
    pub password: String,
}

/// Store of registered users
#[derive(Debug, Clone)]
pub struct IdentityStore {
    db: SqliteDatabase,
}

impl IdentityStore {
    /// Create an identity store over `db`
    pub fn new(db: SqliteDatabase) -> Self {
        Self { db }
    }

    /// Register a new user
    ///
    /// # Errors
    ///
    /// - `SocialError::InvalidInput` - username or password is empty
    /// - `SocialError::AlreadyExists` - the username is taken
    pub async fn register(&self, username: &str, password: &str) -> Result<User> {
        if username.is_empty() {
            return Err(SocialError::InvalidInput("username is required".to_string()));
        }
        if password.is_empty() {
            return Err(SocialError::InvalidInput("password is required".to_string()));
        }

        let mut tx = self.db.begin().await?;

        let inserted = sqlx::query("INSERT INTO users (username, password) VALUES (?, ?)")
            .bind(username)
            .bind(password)
            .execute(tx.conn()?)
            .await
            .map_err(DatabaseError::from);

        if let Err(e) = inserted {
            let err = if e.is_unique_violation() {
                SocialError::AlreadyExists(username.to_string())
            } else {
                SocialError::Persistence(e)
            };
            return Err(abort(tx, err).await);
        }

        tx.commit().await?;
        tracing::info!(username, "Registered user");

        Ok(User {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    /// Look up a user by username
    pub async fn find_by_username(&self, username: &str) -> Result<User> {
        sqlx::query_as::<_, User>("SELECT username, password FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| SocialError::NotFound(username.to_string()))
    }

    /// Check a username/password pair
    ///
    /// Unknown users and wrong passwords are indistinguishable to the caller.
    pub async fn verify_credentials(&self, username: &str, password: &str) -> Result<User> {
        match self.find_by_username(username).await {
            Ok(user) if user.password == password => Ok(user),
            Ok(_) | Err(SocialError::NotFound(_)) => Err(SocialError::Unauthorized),
            Err(e) => Err(e),
        }
    }
}
