//! Client configuration loaded from the environment.

use riskdash_cache::CacheConfig;
use riskdash_realtime::RealtimeConfig;
use std::time::Duration;
use tracing::warn;

/// Default backend address.
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Configuration for [`crate::ApiClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base URL without a trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Cache expiry settings.
    pub cache: CacheConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            cache: CacheConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Creates a new config for `base_url` with default timeouts.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(&base_url.into()),
            ..Default::default()
        }
    }

    /// Loads the config from `RISKDASH_*` environment variables.
    ///
    /// Call `dotenv().ok()` first to pick up a `.env` file. Unset or
    /// unparseable values fall back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let secs = |name: &str, fallback: Duration| -> Duration {
            match lookup(name) {
                Some(raw) => match raw.trim().parse::<u64>() {
                    Ok(value) => Duration::from_secs(value),
                    Err(_) => {
                        warn!(variable = name, value = %raw, "Ignoring invalid duration");
                        fallback
                    }
                },
                None => fallback,
            }
        };

        Self {
            base_url: lookup("RISKDASH_API_URL")
                .filter(|url| !url.trim().is_empty())
                .map_or(defaults.base_url, |url| normalize_base_url(&url)),
            request_timeout: secs("RISKDASH_TIMEOUT_SECS", defaults.request_timeout),
            cache: CacheConfig {
                simulations_ttl: secs(
                    "RISKDASH_CACHE_SIMULATIONS_TTL_SECS",
                    defaults.cache.simulations_ttl,
                ),
                users_ttl: secs("RISKDASH_CACHE_USERS_TTL_SECS", defaults.cache.users_ttl),
                banks_ttl: secs("RISKDASH_CACHE_BANKS_TTL_SECS", defaults.cache.banks_ttl),
                sweep_interval: secs(
                    "RISKDASH_CACHE_SWEEP_SECS",
                    defaults.cache.sweep_interval,
                ),
            },
        }
    }

    /// Realtime settings pointing at the same backend.
    #[must_use]
    pub fn realtime_config(&self) -> RealtimeConfig {
        RealtimeConfig::for_api(&self.base_url)
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ClientConfig::from_lookup(lookup(&[]));
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_overrides_and_invalid_values() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("RISKDASH_API_URL", "https://risk.example.com/"),
            ("RISKDASH_TIMEOUT_SECS", "5"),
            ("RISKDASH_CACHE_BANKS_TTL_SECS", "not-a-number"),
            ("RISKDASH_CACHE_USERS_TTL_SECS", "90"),
        ]));
        assert_eq!(config.base_url, "https://risk.example.com");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.cache.users_ttl, Duration::from_secs(90));
        assert_eq!(config.cache.banks_ttl, CacheConfig::default().banks_ttl);
    }

    #[test]
    fn test_realtime_config_follows_base_url() {
        let config = ClientConfig::new("https://risk.example.com/");
        assert_eq!(config.realtime_config().ws_url, "wss://risk.example.com/ws");
    }
}
