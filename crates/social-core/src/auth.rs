//! Authentication gate
//!
//! Every identity-scoped operation starts with [`AuthGate::resolve`]. The
//! gate is stateless: a token is decoded on each request and the resulting
//! username is checked against the identity store.

use crate::error::{Result, SocialError};
use crate::identity::{IdentityStore, User};
use crate::token;

/// Resolves bearer tokens to live users
#[derive(Debug, Clone)]
pub struct AuthGate {
    identity: IdentityStore,
}

impl AuthGate {
    /// Create an auth gate backed by `identity`
    pub fn new(identity: IdentityStore) -> Self {
        Self { identity }
    }

    /// Issue the token for `user`
    pub fn issue(&self, user: &User) -> String {
        token::encode(&user.username)
    }

    /// Resolve a token to the user it names
    ///
    /// # Errors
    ///
    /// - `SocialError::Unauthenticated` - no token, an undecodable token, or
    ///   a token naming a user that does not exist
    pub async fn resolve(&self, token: Option<&str>) -> Result<User> {
        let token = match token {
            Some(t) if !t.is_empty() => t,
            _ => {
                tracing::debug!("Rejected request without token");
                return Err(SocialError::Unauthenticated);
            }
        };

        let username = token::decode(token).map_err(|e| {
            tracing::warn!(error = %e, "Rejected undecodable token");
            SocialError::Unauthenticated
        })?;

        match self.identity.find_by_username(&username).await {
            Ok(user) => Ok(user),
            Err(SocialError::NotFound(_)) => {
                tracing::warn!(username = %username, "Rejected token for unknown user");
                Err(SocialError::Unauthenticated)
            }
            Err(e) => Err(e),
        }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
