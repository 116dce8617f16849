//! Server configuration from the environment
//!
//! | Variable                     | Default        |
//! |------------------------------|----------------|
//! | `WARBLER_BIND_ADDR`          | `0.0.0.0:5000` |
//! | `WARBLER_DATABASE_PATH`      | `warbler.db`   |
//! | `WARBLER_DB_MAX_CONNECTIONS` | `5`            |
//! | `WARBLER_SEED_DEMO`          | off            |

use std::net::SocketAddr;
use storage::DatabaseConfig;
use thiserror::Error;

/// Bind address environment variable
pub const BIND_ADDR_VAR: &str = "WARBLER_BIND_ADDR";
/// Database path environment variable
pub const DATABASE_PATH_VAR: &str = "WARBLER_DATABASE_PATH";
/// Pool size environment variable
pub const MAX_CONNECTIONS_VAR: &str = "WARBLER_DB_MAX_CONNECTIONS";
/// Demo seeding environment variable
pub const SEED_DEMO_VAR: &str = "WARBLER_SEED_DEMO";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_DATABASE_PATH: &str = "warbler.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable was set to a value that does not parse
    #[error("Invalid value for {key}: {value:?}")]
    Invalid {
        /// Variable name
        key: &'static str,
        /// Offending value
        value: String,
    },
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to
    pub bind_addr: SocketAddr,
    /// Database settings
    pub database: DatabaseConfig,
    /// Seed demo users and posts on startup
    pub seed_demo: bool,
}

impl ServerConfig {
    /// Read the configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`, falling back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = lookup(BIND_ADDR_VAR)
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = bind_addr.parse().map_err(|_| ConfigError::Invalid {
            key: BIND_ADDR_VAR,
            value: bind_addr.clone(),
        })?;

        let path = lookup(DATABASE_PATH_VAR).unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string());

        let max_connections = match lookup(MAX_CONNECTIONS_VAR) {
            Some(value) => match value.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: MAX_CONNECTIONS_VAR,
                        value,
                    })
                }
            },
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let seed_demo = match lookup(SEED_DEMO_VAR).as_deref() {
            None | Some("") | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: SEED_DEMO_VAR,
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            bind_addr,
            database: DatabaseConfig::new(path).max_connections(max_connections),
            seed_demo,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:5000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.database.path, "warbler.db");
        assert_eq!(config.database.max_connections, 5);
        assert!(!config.seed_demo);
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            (BIND_ADDR_VAR, "127.0.0.1:8080"),
            (DATABASE_PATH_VAR, "/tmp/w.db"),
            (MAX_CONNECTIONS_VAR, "2"),
            (SEED_DEMO_VAR, "true"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.database.path, "/tmp/w.db");
        assert_eq!(config.database.max_connections, 2);
        assert!(config.seed_demo);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            ServerConfig::from_lookup(lookup_from(&[(BIND_ADDR_VAR, "nowhere")])),
            Err(ConfigError::Invalid { key: BIND_ADDR_VAR, .. })
        ));
        assert!(matches!(
            ServerConfig::from_lookup(lookup_from(&[(MAX_CONNECTIONS_VAR, "0")])),
            Err(ConfigError::Invalid { key: MAX_CONNECTIONS_VAR, .. })
        ));
        assert!(matches!(
            ServerConfig::from_lookup(lookup_from(&[(SEED_DEMO_VAR, "maybe")])),
            Err(ConfigError::Invalid { key: SEED_DEMO_VAR, .. })
        ));
    }
}
