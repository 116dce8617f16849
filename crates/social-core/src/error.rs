//! Error taxonomy shared by every social operation

use storage::{DatabaseError, DatabaseTransaction};
use thiserror::Error;

/// Errors surfaced to the request layer
///
/// Every variant is a stable, distinguishable outcome; callers pick a
/// response by matching on the variant (or on [`SocialError::kind`]) rather
/// than inspecting messages.
#[derive(Debug, Error)]
pub enum SocialError {
    /// A required field was missing or empty
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The username is already registered
    #[error("User already exists: {0}")]
    AlreadyExists(String),

    /// The follow edge already exists
    #[error("Already following {0}")]
    AlreadyFollowing(String),

    /// Login credentials did not match
    #[error("Invalid username or password")]
    Unauthorized,

    /// Token missing, undecodable, or naming no existing user
    #[error("Authentication required")]
    Unauthenticated,

    /// The target of the operation does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Post content exceeds the length limit
    #[error("Content too long: {length} characters (max {max})")]
    ContentTooLong {
        /// Length of the rejected content in characters
        length: usize,
        /// Maximum permitted length
        max: usize,
    },

    /// The underlying store failed; the in-flight mutation was rolled back
    #[error("Persistence error: {0}")]
    Persistence(#[from] DatabaseError),
}

impl SocialError {
    /// Stable machine-readable name of the outcome
    pub fn kind(&self) -> &'static str {
        match self {
            SocialError::InvalidInput(_) => "invalid_input",
            SocialError::AlreadyExists(_) => "already_exists",
            SocialError::AlreadyFollowing(_) => "already_following",
            SocialError::Unauthorized => "unauthorized",
            SocialError::Unauthenticated => "unauthenticated",
            SocialError::NotFound(_) => "not_found",
            SocialError::ContentTooLong { .. } => "content_too_long",
            SocialError::Persistence(_) => "persistence_error",
        }
    }
}

impl From<sqlx::Error> for SocialError {
    fn from(err: sqlx::Error) -> Self {
        SocialError::Persistence(DatabaseError::from(err))
    }
}

/// Result type for social operations
pub type Result<T> = std::result::Result<T, SocialError>;

/// Roll back `tx` and hand back `err`
///
/// A failed rollback is logged; the original error is what the caller sees.
pub(crate) async fn abort(tx: DatabaseTransaction, err: SocialError) -> SocialError {
    if let Err(rollback_err) = tx.rollback().await {
        tracing::warn!(error = %rollback_err, "Rollback failed after {}", err.kind());
    }
    err
}
