//! Bearer token codec
//!
//! A token is the standard Base64 encoding of the username's UTF-8 bytes.
//! It carries an identity and is not a secret: anyone holding a token can
//! read the username back out of it, and there is no expiry or signature.
//! Whether a decoded username actually exists is decided by
//! [`AuthGate`](crate::auth::AuthGate).

use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

/// Token decoding errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// The token is not valid Base64 or does not hold UTF-8 text
    #[error("Malformed token: {0}")]
    Decode(String),
}

/// Encode a username as a bearer token
pub fn encode(username: &str) -> String {
    STANDARD.encode(username.as_bytes())
}

/// Recover the username carried by `token`
pub fn decode(token: &str) -> Result<String, TokenError> {
    let bytes = STANDARD
        .decode(token)
        .map_err(|e| TokenError::Decode(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| TokenError::Decode(e.to_string()))
}
