use crate::error::{RegistryError, Result};
use dashmap::DashMap;
use std::env;
use std::str::FromStr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Key/value configuration seeded from the process environment.
#[derive(Clone, Default)]
pub struct ConfigService {
    config: Arc<DashMap<String, String>>,
}

impl ConfigService {
    /// Loads `.env` (when present) and then the process environment.
    pub fn new() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::from_env()
    }

    pub fn from_env() -> Self {
        let service = Self::default();
        for (key, value) in env::vars() {
            service.set(&key, &value);
        }
        service
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config.get(key).map(|v| v.clone())
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    /// Parses `key`, falling back to `default` when unset.
    pub fn parse_or<T: FromStr>(&self, key: &str, default: T) -> Result<T> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| RegistryError::Config(format!("invalid value for {key}: {raw:?}"))),
        }
    }

    pub fn set(&self, key: &str, value: &str) {
        self.config.insert(key.to_string(), value.to_string());
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub auto_create: bool,
}

impl DatabaseConfig {
    pub fn is_in_memory(&self) -> bool {
        is_in_memory_url(&self.url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Mount point of the user routes, e.g. `/api`. Empty mounts at the root.
    pub api_prefix: String,
    pub log_filter: String,
    pub database: DatabaseConfig,
}

impl AppConfig {
    pub fn from_service(config: &ConfigService) -> Result<Self> {
        let url = config.get_or("DATABASE_URL", "sqlite::memory:");
        // Every pooled connection to an in-memory SQLite database sees its own
        // empty database.
        let default_pool = if is_in_memory_url(&url) { 1 } else { 10 };

        let database = DatabaseConfig {
            max_connections: config.parse_or("DATABASE_MAX_CONNECTIONS", default_pool)?,
            auto_create: config.parse_or("DATABASE_AUTO_CREATE", true)?,
            url,
        };

        Ok(Self {
            host: config.get_or("HOST", "0.0.0.0"),
            port: config.parse_or("PORT", 3000)?,
            api_prefix: normalize_prefix(&config.get_or("API_PREFIX", "")),
            log_filter: config.get_or("RUST_LOG", "info"),
            database,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parses `log_filter`. An invalid directive yields the `info` filter plus
    /// the parse error, to be reported once logging is up.
    pub fn env_filter(&self) -> (EnvFilter, Option<String>) {
        match EnvFilter::try_new(&self.log_filter) {
            Ok(filter) => (filter, None),
            Err(e) => (EnvFilter::new("info"), Some(e.to_string())),
        }
    }
}

fn is_in_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// `"api/"` becomes `"/api"`; blank input stays empty.
fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_service(&ConfigService::default()).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.api_prefix, "");
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.database.max_connections, 1);
        assert!(config.database.auto_create);
        assert!(config.database.is_in_memory());
    }

    #[test]
    fn test_overrides() {
        let service = ConfigService::default();
        service.set("PORT", "8080");
        service.set("API_PREFIX", "api/v1/");
        service.set("DATABASE_URL", "postgres://localhost/users");
        service.set("DATABASE_AUTO_CREATE", "false");

        let config = AppConfig::from_service(&service).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.api_prefix, "/api/v1");
        assert_eq!(config.database.max_connections, 10);
        assert!(!config.database.auto_create);
        assert!(!config.database.is_in_memory());
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let service = ConfigService::default();
        service.set("PORT", "eighty");

        let err = AppConfig::from_service(&service).unwrap_err();
        assert!(matches!(err, RegistryError::Config(msg) if msg.contains("PORT")));
    }

    #[test]
    fn test_env_filter() {
        let service = ConfigService::default();
        service.set("RUST_LOG", "user_registry=debug");
        let (_, error) = AppConfig::from_service(&service).unwrap().env_filter();
        assert!(error.is_none());

        service.set("RUST_LOG", "user_registry=loud");
        let (_, error) = AppConfig::from_service(&service).unwrap().env_filter();
        assert!(error.is_some());
    }

    #[test]
    fn test_normalize_prefix() {
        assert_eq!(normalize_prefix("/"), "");
        assert_eq!(normalize_prefix("  "), "");
        assert_eq!(normalize_prefix("/api"), "/api");
    }
}
