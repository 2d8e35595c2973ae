//! Environment variable parsing utilities.

use std::str::FromStr;

use super::ConfigError;

/// Get environment variable with default value.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get optional environment variable (None if empty or missing).
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

/// Parse `value` read from `key`, mapping failures to [`ConfigError::Parse`].
pub fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Parse {
        key: key.into(),
        value: value.into(),
        error: e.to_string(),
    })
}

/// Parse environment variable with type conversion.
pub fn env_parse<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(v) if !v.is_empty() => parse_value(key, &v),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value::<usize>("N", " 12 ").unwrap(), 12);

        let err = parse_value::<usize>("N", "twelve").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { ref key, .. } if key == "N"));
        assert!(err.to_string().starts_with("failed to parse N='twelve'"));
    }

    #[test]
    fn test_env_parse_missing_uses_default() {
        assert_eq!(
            env_parse("GPOOL_TEST_SURELY_UNSET_VARIABLE", 7usize).unwrap(),
            7
        );
    }
}
