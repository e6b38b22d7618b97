use std::{net::SocketAddr, time::Duration};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_TENANT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_TENANT_CACHE_CAPACITY: u64 = 10_000;
const DEFAULT_SESSION_TTL_SECS: u64 = 86_400;
const DEFAULT_SESSION_CACHE_CAPACITY: u64 = 100_000;
const DEFAULT_STORE_TIMEOUT_MS: u64 = 5_000;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} has an invalid value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime settings, read from the environment (and `.env` via dotenvy in `main`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// PostgreSQL; unset means in-memory storage.
    pub database_url: Option<String>,
    /// Redis; unset means a process-local moka cache.
    pub redis_url: Option<String>,
    pub tenant_cache_ttl: Duration,
    pub tenant_cache_capacity: u64,
    pub session_ttl: Duration,
    /// Sessions get their own moka cache so tenant lookups cannot evict them.
    pub session_cache_capacity: u64,
    /// Bounds store and cache calls. `None` when STORE_TIMEOUT_MS is 0.
    pub store_timeout: Option<Duration>,
    pub bootstrap_superadmin_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = match get("BIND_ADDR") {
            Some(value) => value.parse().map_err(|e: std::net::AddrParseError| {
                ConfigError::Invalid {
                    key: "BIND_ADDR",
                    value: value.clone(),
                    reason: e.to_string(),
                }
            })?,
            None => SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
        };

        let number = |key: &'static str, default: u64| -> Result<u64, ConfigError> {
            match get(key) {
                Some(value) => value.parse::<u64>().map_err(|e| ConfigError::Invalid {
                    key,
                    value: value.clone(),
                    reason: e.to_string(),
                }),
                None => Ok(default),
            }
        };

        let positive = |key: &'static str, default: u64| -> Result<u64, ConfigError> {
            match number(key, default)? {
                0 => Err(ConfigError::Invalid {
                    key,
                    value: "0".into(),
                    reason: "must be greater than zero".into(),
                }),
                value => Ok(value),
            }
        };

        let tenant_cache_capacity = positive("TENANT_CACHE_CAPACITY", DEFAULT_TENANT_CACHE_CAPACITY)?;
        let session_cache_capacity =
            positive("SESSION_CACHE_CAPACITY", DEFAULT_SESSION_CACHE_CAPACITY)?;

        let session_ttl_secs = positive("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?;

        let store_timeout_ms = number("STORE_TIMEOUT_MS", DEFAULT_STORE_TIMEOUT_MS)?;

        Ok(Self {
            bind_addr,
            database_url: get("DATABASE_URL"),
            redis_url: get("REDIS_URL"),
            tenant_cache_ttl: Duration::from_secs(number(
                "TENANT_CACHE_TTL_SECS",
                DEFAULT_TENANT_CACHE_TTL_SECS,
            )?),
            tenant_cache_capacity,
            session_ttl: Duration::from_secs(session_ttl_secs),
            session_cache_capacity,
            store_timeout: (store_timeout_ms > 0).then(|| Duration::from_millis(store_timeout_ms)),
            bootstrap_superadmin_token: get("BOOTSTRAP_SUPERADMIN_TOKEN"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.database_url, None);
        assert_eq!(config.redis_url, None);
        assert_eq!(config.tenant_cache_ttl, Duration::from_secs(300));
        assert_eq!(config.tenant_cache_capacity, 10_000);
        assert_eq!(config.session_ttl, Duration::from_secs(86_400));
        assert_eq!(config.session_cache_capacity, 100_000);
        assert_eq!(config.store_timeout, Some(Duration::from_millis(5_000)));
        assert_eq!(config.bootstrap_superadmin_token, None);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("DATABASE_URL", "postgres://localhost/storefront"),
            ("REDIS_URL", "redis://localhost:6379/"),
            ("TENANT_CACHE_TTL_SECS", "60"),
            ("STORE_TIMEOUT_MS", "0"),
            ("SESSION_CACHE_CAPACITY", "500"),
            ("BOOTSTRAP_SUPERADMIN_TOKEN", "root-token"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/storefront")
        );
        assert_eq!(config.tenant_cache_ttl, Duration::from_secs(60));
        assert_eq!(config.store_timeout, None);
        assert_eq!(config.session_cache_capacity, 500);
        assert_eq!(config.bootstrap_superadmin_token.as_deref(), Some("root-token"));
    }

    #[test]
    fn test_blank_values_count_as_unset() {
        let config = config_from(&[("DATABASE_URL", "  "), ("TENANT_CACHE_TTL_SECS", "")]).unwrap();
        assert_eq!(config.database_url, None);
        assert_eq!(config.tenant_cache_ttl, Duration::from_secs(300));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = config_from(&[("TENANT_CACHE_TTL_SECS", "five")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "TENANT_CACHE_TTL_SECS",
                ..
            }
        ));

        let err = config_from(&[("BIND_ADDR", "not-an-addr")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "BIND_ADDR", .. }));

        let err = config_from(&[("SESSION_TTL_SECS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "SESSION_TTL_SECS", .. }));

        let err = config_from(&[("SESSION_CACHE_CAPACITY", "0")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "SESSION_CACHE_CAPACITY",
                ..
            }
        ));
    }
}
