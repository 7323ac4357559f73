//! Gateway configuration read from environment variables.

use std::str::FromStr;
use std::time::Duration;

use crate::abuse::{
    AbuseConfig, DEFAULT_BLOCK_DURATION_SECS, DEFAULT_FAILURE_RETENTION_SECS,
    DEFAULT_MAX_FAILED_ATTEMPTS,
};
use crate::limiter::{RateLimitConfig, DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW_SECS};

/// Default name of the credential header and query parameter.
pub const DEFAULT_KEY_NAME: &str = "API_KEY";

/// Default interval between sweeps of expired records, in seconds.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Everything the gateway needs apart from the keys themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub rate_limit: RateLimitConfig,
    pub abuse: AbuseConfig,
    /// Header (and, for dual-input routes, query parameter) carrying the key.
    pub key_name: String,
    /// How often expired per-identity records are swept.
    pub sweep_interval: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            rate_limit: RateLimitConfig::default(),
            abuse: AbuseConfig::default(),
            key_name: DEFAULT_KEY_NAME.to_string(),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
        }
    }
}

impl GatewayConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through an arbitrary variable lookup.
    ///
    /// Unset or blank variables take their defaults. Values that do not parse
    /// are logged and replaced by the default as well.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let secs = |name: &str, default: u64| Duration::from_secs(parse_var(&lookup, name, default));

        let key_name = lookup("API_KEY_NAME")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_KEY_NAME.to_string());

        Self {
            rate_limit: RateLimitConfig {
                max_requests: parse_var(&lookup, "MAX_REQUESTS_PER_WINDOW", DEFAULT_MAX_REQUESTS),
                window: secs("RATE_LIMIT_WINDOW", DEFAULT_WINDOW_SECS),
            },
            abuse: AbuseConfig {
                max_failed_attempts: parse_var(
                    &lookup,
                    "MAX_FAILED_ATTEMPTS",
                    DEFAULT_MAX_FAILED_ATTEMPTS,
                ),
                block_duration: secs("BLOCK_DURATION", DEFAULT_BLOCK_DURATION_SECS),
                failure_retention: secs("FAILURE_RETENTION", DEFAULT_FAILURE_RETENTION_SECS),
            },
            key_name,
            sweep_interval: secs("SWEEP_INTERVAL", DEFAULT_SWEEP_INTERVAL_SECS),
        }
    }
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Copy + std::fmt::Display,
{
    let Some(raw) = lookup(name) else {
        return default;
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return default;
    }
    match raw.parse::<T>() {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(
                variable = name,
                value = raw,
                default = %default,
                "ignoring unparseable configuration value"
            );
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_vars(vars: &[(&str, &str)]) -> GatewayConfig {
        let map: HashMap<&str, &str> = vars.iter().copied().collect();
        GatewayConfig::from_lookup(|name| map.get(name).map(|v| v.to_string()))
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = from_vars(&[]);
        assert_eq!(config, GatewayConfig::default());
        assert_eq!(config.rate_limit.window, Duration::from_secs(3600));
        assert_eq!(config.rate_limit.max_requests, 1000);
        assert_eq!(config.abuse.max_failed_attempts, 5);
        assert_eq!(config.abuse.block_duration, Duration::from_secs(300));
        assert_eq!(config.key_name, "API_KEY");
    }

    #[test]
    fn variables_override_defaults() {
        let config = from_vars(&[
            ("RATE_LIMIT_WINDOW", "60"),
            ("MAX_REQUESTS_PER_WINDOW", "10"),
            ("MAX_FAILED_ATTEMPTS", "3"),
            ("BLOCK_DURATION", " 30 "),
            ("API_KEY_NAME", "X-Api-Key"),
            ("SWEEP_INTERVAL", "5"),
            ("FAILURE_RETENTION", "600"),
        ]);
        assert_eq!(config.rate_limit.window, Duration::from_secs(60));
        assert_eq!(config.rate_limit.max_requests, 10);
        assert_eq!(config.abuse.max_failed_attempts, 3);
        assert_eq!(config.abuse.block_duration, Duration::from_secs(30));
        assert_eq!(config.abuse.failure_retention, Duration::from_secs(600));
        assert_eq!(config.key_name, "X-Api-Key");
        assert_eq!(config.sweep_interval, Duration::from_secs(5));
    }

    #[test]
    fn unparseable_values_fall_back_to_defaults() {
        let config = from_vars(&[
            ("MAX_REQUESTS_PER_WINDOW", "lots"),
            ("BLOCK_DURATION", "-5"),
            ("API_KEY_NAME", "   "),
        ]);
        assert_eq!(config.rate_limit.max_requests, 1000);
        assert_eq!(config.abuse.block_duration, Duration::from_secs(300));
        assert_eq!(config.key_name, "API_KEY");
    }
}
