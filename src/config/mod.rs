//! Configuration module for the gpool demo.
//!
//! This module provides centralized configuration loading from environment variables.
//!
//! # Example
//!
//! ```rust,no_run
//! use gpool::config::Config;
//!
//! let config = Config::from_env()?;
//! println!("Capacity: {}", config.pool.capacity());
//! # Ok::<(), gpool::config::ConfigError>(())
//! ```

mod demo;
mod error;
mod logging;
mod parse;
mod pool;

pub use demo::DemoConfig;
pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use pool::PoolConfig;

/// Complete application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Pool sizing.
    pub pool: PoolConfig,
    /// Demo workload.
    pub demo: DemoConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            pool: PoolConfig::from_env()?,
            demo: DemoConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
        })
    }

    /// Print configuration summary to log.
    pub fn log_summary(&self) {
        use tracing::info;

        info!("Configuration loaded:");
        info!("  Pool capacity: {}", self.pool.capacity());
        info!("  Group size: {}", self.pool.group_size());
        info!("  Users: {}", self.demo.users);
        info!("  Log format: {:?}", self.logging.format);
    }
}
