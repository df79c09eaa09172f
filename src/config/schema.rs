//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//!
//! ```toml
//! [static_files]
//! root_path = "public"
//! index_file = "index.html"
//! compression = ["br", "gzip"]
//!
//! [paths]
//! "/" = "/"
//! "/assets" = "/dist"
//!
//! [cache]
//! access = "public"
//! max_age_secs = 3600
//!
//! [[files]]
//! route = "/favicon.ico"
//! path = "img/favicon.ico"
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::caching::{self, Access};
use crate::file::{Encoding, ServerOptions};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Options shared by every file route.
    pub static_files: FileOptionsConfig,

    /// URL prefix → directory (relative to the root) for the fallback file server.
    pub paths: BTreeMap<String, String>,

    /// Cache-Control for responses of the fallback file server.
    pub cache: Option<CacheConfig>,

    /// Single-file routes.
    pub files: Vec<FileRouteConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// File server options as written in the config file.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FileOptionsConfig {
    /// Root directory, relative to the working directory unless absolute.
    pub root_path: Option<PathBuf>,

    /// File served for directory requests.
    pub index_file: Option<String>,

    /// File served when nothing matches, relative to the root.
    pub catch_all_file: Option<String>,

    /// Pre-compressed variants, most preferred first.
    pub compression: Option<Vec<Encoding>>,
}

impl FileOptionsConfig {
    pub fn to_options(&self) -> ServerOptions {
        ServerOptions {
            root_path: self.root_path.clone(),
            index_file: self.index_file.clone(),
            catch_all_file: self.catch_all_file.clone(),
            compression: self.compression.clone(),
            ..ServerOptions::default()
        }
    }
}

/// A route serving exactly one file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FileRouteConfig {
    /// Route path (e.g., "/favicon.ico").
    pub route: String,

    /// File to serve; relative to the root unless absolute.
    pub path: PathBuf,

    /// Overrides the shared compression list.
    #[serde(default)]
    pub compression: Option<Vec<Encoding>>,

    /// Cache-Control for this route.
    #[serde(default)]
    pub cache: Option<CacheConfig>,
}

impl FileRouteConfig {
    pub fn to_options(&self) -> ServerOptions {
        ServerOptions {
            compression: self.compression.clone(),
            ..ServerOptions::default()
        }
    }
}

/// Cache-Control directives as written in the config file.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct CacheConfig {
    pub access: Option<Access>,
    pub max_age_secs: u64,
    pub s_max_age_secs: u64,
    pub no_cache: bool,
    pub no_store: bool,
    pub must_revalidate: bool,
    pub proxy_revalidate: bool,
    pub must_understand: bool,
    pub no_transform: bool,
    pub immutable: bool,
}

impl CacheConfig {
    pub fn to_options(&self) -> caching::Options {
        caching::Options {
            access: self.access.clone(),
            max_age: Duration::from_secs(self.max_age_secs),
            s_max_age: Duration::from_secs(self.s_max_age_secs),
            no_cache: self.no_cache,
            no_store: self.no_store,
            must_revalidate: self.must_revalidate,
            proxy_revalidate: self.proxy_revalidate,
            must_understand: self.must_understand,
            no_transform: self.no_transform,
            immutable: self.immutable,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.timeouts.request_secs, 30);
        assert!(config.paths.is_empty());
        assert!(config.cache.is_none());
    }

    #[test]
    fn test_full_config() {
        let config: AppConfig = toml::from_str(
            r#"
            [static_files]
            root_path = "public"
            index_file = "index.html"
            compression = ["br", "GZIP"]

            [paths]
            "/assets" = "/dist"

            [cache]
            access = "public"
            max_age_secs = 300
            immutable = true

            [[files]]
            route = "/favicon.ico"
            path = "img/favicon.ico"
            compression = []
            "#,
        )
        .unwrap();

        assert_eq!(
            config.static_files.compression,
            Some(vec![Encoding::BROTLI, Encoding::GZIP])
        );
        assert_eq!(config.paths["/assets"], "/dist");
        let cache = config.cache.unwrap().to_options();
        assert_eq!(cache.build_header_value(), "public, max-age=300, immutable");
        assert_eq!(config.files[0].compression, Some(vec![]));

        let custom: CacheConfig = toml::from_str("access = \"no-transform\"").unwrap();
        assert_eq!(custom.access, Some(Access::Custom("no-transform".into())));

        let options = config.static_files.to_options();
        assert_eq!(options.index_file.as_deref(), Some("index.html"));
        assert!(options.allow.is_none());
    }
}
