//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (WISHLIST_EDGE_*)
//! 2. TOML config file (if WISHLIST_EDGE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;

mod validation;

pub use validation::ConfigError;

/// Environment variable prefix for every setting.
pub const ENV_PREFIX: &str = "WISHLIST_EDGE_";

/// Environment variable naming an optional TOML config file.
pub const CONFIG_FILE_ENV: &str = "WISHLIST_EDGE_CONFIG_FILE";

/// Where cache generations are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Memory,
    Sqlite,
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (WISHLIST_EDGE_*)
/// 2. TOML config file (if WISHLIST_EDGE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Name of the cache generation. Bump it on every deployment that
    /// should purge the previous generation.
    ///
    /// Set via WISHLIST_EDGE_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Entry-point routes primed into the cache at install.
    ///
    /// Set via WISHLIST_EDGE_SHELL_ROUTES (e.g. `["/", "/feed"]`).
    #[serde(default = "default_shell_routes")]
    pub shell_routes: Vec<String>,

    /// Origin of the application the edge sits in front of.
    ///
    /// Set via WISHLIST_EDGE_UPSTREAM environment variable.
    #[serde(default = "default_upstream")]
    pub upstream: String,

    /// Address the edge listens on.
    ///
    /// Set via WISHLIST_EDGE_LISTEN_ADDR environment variable.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Storage backend for cache generations.
    ///
    /// Set via WISHLIST_EDGE_STORAGE (`memory` or `sqlite`).
    #[serde(default = "default_storage")]
    pub storage: StorageKind,

    /// Path to the SQLite database when `storage = sqlite`.
    ///
    /// Set via WISHLIST_EDGE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Upstream request timeout in milliseconds.
    ///
    /// Set via WISHLIST_EDGE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// User-Agent sent on shell priming requests.
    ///
    /// Set via WISHLIST_EDGE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Route the share ingestion pipeline redirects to.
    ///
    /// Set via WISHLIST_EDGE_SHARE_DESTINATION environment variable.
    #[serde(default = "default_share_destination")]
    pub share_destination: String,
}

fn default_cache_version() -> String {
    "mywishlist-v2".into()
}

fn default_shell_routes() -> Vec<String> {
    ["/", "/feed", "/search", "/explore", "/settings"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_upstream() -> String {
    "http://127.0.0.1:3000".into()
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".into()
}

fn default_storage() -> StorageKind {
    StorageKind::Memory
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./wishlist-edge-cache.sqlite")
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_user_agent() -> String {
    "wishlist-edge/0.1".into()
}

fn default_share_destination() -> String {
    "/add-product".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_version: default_cache_version(),
            shell_routes: default_shell_routes(),
            upstream: default_upstream(),
            listen_addr: default_listen_addr(),
            storage: default_storage(),
            db_path: default_db_path(),
            timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
            share_destination: default_share_destination(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The upstream origin as a parsed URL.
    pub fn upstream_url(&self) -> Result<Url, Error> {
        Url::parse(&self.upstream).map_err(|e| Error::InvalidUrl(format!("{}: {e}", self.upstream)))
    }

    /// The listen address as a socket address.
    pub fn listen_socket(&self) -> Result<SocketAddr, ConfigError> {
        self.listen_addr.parse().map_err(|e| ConfigError::Invalid {
            field: "listen_addr".into(),
            reason: format!("{e}"),
        })
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    /// The layered figment, before extraction.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var(CONFIG_FILE_ENV) {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["CONFIG_FILE"]))
    }

    /// Extract and validate configuration from a prepared figment.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.cache_version, "mywishlist-v2");
        assert_eq!(config.shell_routes, vec!["/", "/feed", "/search", "/explore", "/settings"]);
        assert_eq!(config.upstream, "http://127.0.0.1:3000");
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.storage, StorageKind::Memory);
        assert_eq!(config.db_path, PathBuf::from("./wishlist-edge-cache.sqlite"));
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.user_agent, "wishlist-edge/0.1");
        assert_eq!(config.share_destination, "/add-product");
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_upstream_url() {
        let config = AppConfig { upstream: "https://wishlist.example".into(), ..Default::default() };
        assert_eq!(config.upstream_url().unwrap().host_str(), Some("wishlist.example"));

        let config = AppConfig { upstream: "not a url".into(), ..Default::default() };
        assert!(matches!(config.upstream_url(), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_load_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "edge.toml",
                r#"
                cache_version = "mywishlist-v3"
                storage = "sqlite"
                shell_routes = ["/", "/feed"]
                "#,
            )?;
            jail.set_env(CONFIG_FILE_ENV, "edge.toml");
            jail.set_env("WISHLIST_EDGE_CACHE_VERSION", "mywishlist-v4");

            let config = AppConfig::load().unwrap();
            assert_eq!(config.cache_version, "mywishlist-v4");
            assert_eq!(config.storage, StorageKind::Sqlite);
            assert_eq!(config.shell_routes, vec!["/", "/feed"]);
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        Jail::expect_with(|jail| {
            jail.set_env("WISHLIST_EDGE_TIMEOUT_MS", "10");
            let result = AppConfig::load();
            assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
            Ok(())
        });
    }
}
