//! Demo application configuration.

use super::parse::env_parse;
use super::ConfigError;

/// Settings for the user-lookup demo.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DemoConfig {
    /// Number of users seeded into the in-memory storage.
    pub users: usize,
}

impl DemoConfig {
    /// Load configuration from `GPOOL_USERS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let users = env_parse("GPOOL_USERS", 256usize)?;

        // Sampling keeps roughly one id in users/10.
        if users < 10 {
            return Err(ConfigError::Invalid {
                key: "GPOOL_USERS".into(),
                message: "need at least 10 users".into(),
            });
        }

        Ok(Self { users })
    }
}
