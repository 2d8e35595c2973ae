//! Pool configuration.

use std::num::NonZeroUsize;

use super::parse::{env_opt, env_or, parse_value};
use super::ConfigError;

/// Group size used when `GPOOL_GROUP_SIZE` is unset, clamped to capacity.
const DEFAULT_GROUP_SIZE: usize = 8;

/// Pool sizing loaded from environment.
///
/// All values are resolved at construction time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Resolved pool capacity (never zero).
    capacity: NonZeroUsize,
    /// Resolved group size (never zero, never above capacity).
    group_size: NonZeroUsize,
}

impl PoolConfig {
    /// Load configuration from `GPOOL_CAPACITY` and `GPOOL_GROUP_SIZE`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_values(
            &env_or("GPOOL_CAPACITY", "0"),
            env_opt("GPOOL_GROUP_SIZE").as_deref(),
        )
    }

    /// Resolve raw capacity and group size strings.
    ///
    /// A capacity of `0` resolves to the CPU count. A missing group size
    /// resolves to 8, or the capacity if that is smaller; an explicit one
    /// larger than the capacity is rejected.
    pub fn from_values(capacity: &str, group_size: Option<&str>) -> Result<Self, ConfigError> {
        let capacity = Self::parse_capacity(capacity)?;
        let group_size = match group_size {
            Some(raw) => Self::parse_group_size(raw, capacity)?,
            None => {
                NonZeroUsize::new(DEFAULT_GROUP_SIZE.min(capacity.get())).unwrap_or(capacity)
            }
        };

        Ok(Self {
            capacity,
            group_size,
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    #[inline]
    pub fn group_size(&self) -> usize {
        self.group_size.get()
    }

    fn parse_capacity(raw: &str) -> Result<NonZeroUsize, ConfigError> {
        let capacity: usize = parse_value("GPOOL_CAPACITY", raw)?;

        let count = if capacity == 0 {
            num_cpus::get()
        } else {
            capacity
        };

        NonZeroUsize::new(count).ok_or_else(|| ConfigError::Invalid {
            key: "GPOOL_CAPACITY".into(),
            message: "capacity cannot be zero".into(),
        })
    }

    fn parse_group_size(raw: &str, capacity: NonZeroUsize) -> Result<NonZeroUsize, ConfigError> {
        let size: usize = parse_value("GPOOL_GROUP_SIZE", raw)?;

        if size > capacity.get() {
            return Err(ConfigError::Invalid {
                key: "GPOOL_GROUP_SIZE".into(),
                message: format!("group size {} exceeds capacity {}", size, capacity),
            });
        }

        NonZeroUsize::new(size).ok_or_else(|| ConfigError::Invalid {
            key: "GPOOL_GROUP_SIZE".into(),
            message: "group size cannot be zero".into(),
        })
    }
}
