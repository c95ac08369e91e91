// src/core/config.rs - TOML configuration with per-field defaults
use crate::core::constants::{
    DEFAULT_CACHE_CAPACITY, DEFAULT_CHART_ORIGIN, DEFAULT_DATA_DIR, DEFAULT_HOST, DEFAULT_PORT,
    DEFAULT_REFRESH_COOLDOWN_SECS, DEFAULT_WINDOW_DAYS,
};
use crate::core::error::{AppError, Result};
use actix_web::http::Method;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV_VAR: &str = "HOOKWATCH_CONFIG";
pub const CONFIG_FILE: &str = "hookwatch.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub stats: StatsConfig,
    #[serde(default = "default_routes", rename = "route")]
    pub routes: Vec<RouteConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default = "default_cors_enabled")]
    pub cors_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding document content files and their paired event logs.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    #[serde(default = "default_window_days")]
    pub window_days: usize,
    #[serde(default = "default_refresh_cooldown")]
    pub refresh_cooldown_secs: u64,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    #[serde(default = "default_chart_origin")]
    pub chart_origin: String,
}

/// One declared route: `[[route]]` table in the config document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    pub name: String,
    pub path: String,
    pub methods: Vec<String>,
    pub handler: HandlerKind,
}

/// Handler families a route can dispatch to. Unknown identifiers in the
/// config document fail deserialization, which surfaces as a startup error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerKind {
    Echo,
    Health,
    Ingest,
    Stats,
    StatsWindowed,
}

// Default Functions
fn default_host() -> String {
    DEFAULT_HOST.into()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_cors_enabled() -> bool {
    true
}
fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}
fn default_window_days() -> usize {
    DEFAULT_WINDOW_DAYS
}
fn default_refresh_cooldown() -> u64 {
    DEFAULT_REFRESH_COOLDOWN_SECS
}
fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}
fn default_chart_origin() -> String {
    DEFAULT_CHART_ORIGIN.into()
}

fn default_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig {
            name: "health".into(),
            path: "/health".into(),
            methods: vec!["GET".into()],
            handler: HandlerKind::Health,
        },
        RouteConfig {
            name: "echo".into(),
            path: "/hooks/{hook}".into(),
            methods: vec!["GET".into(), "POST".into()],
            handler: HandlerKind::Echo,
        },
        RouteConfig {
            name: "ingest".into(),
            path: "/api/ingest".into(),
            methods: vec!["POST".into()],
            handler: HandlerKind::Ingest,
        },
        RouteConfig {
            name: "stats".into(),
            path: "/api/stats/{doc_id}".into(),
            methods: vec!["GET".into()],
            handler: HandlerKind::Stats,
        },
        RouteConfig {
            name: "stats-windowed".into(),
            path: "/api/stats/{doc_id}/window".into(),
            methods: vec!["GET".into()],
            handler: HandlerKind::StatsWindowed,
        },
    ]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
            cors_enabled: default_cors_enabled(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            refresh_cooldown_secs: default_refresh_cooldown(),
            cache_capacity: default_cache_capacity(),
            chart_origin: default_chart_origin(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            stats: StatsConfig::default(),
            routes: default_routes(),
        }
    }
}

/// Parse an HTTP verb string from a route declaration. Shared between
/// startup validation and route registration so both agree on the verb set.
pub fn parse_method(verb: &str) -> Option<Method> {
    match verb.to_uppercase().as_str() {
        "GET" => Some(Method::GET),
        "POST" => Some(Method::POST),
        "PUT" => Some(Method::PUT),
        "DELETE" => Some(Method::DELETE),
        "PATCH" => Some(Method::PATCH),
        "HEAD" => Some(Method::HEAD),
        _ => None,
    }
}

impl Config {
    /// Load configuration from `HOOKWATCH_CONFIG` or `./hookwatch.toml`.
    /// A missing file yields the built-in defaults; a malformed file is fatal.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(CONFIG_FILE));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!(
                "No config file at {}, using built-in defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(AppError::Io)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

        log::info!(
            "Loaded config from {} ({} routes)",
            path.display(),
            config.routes.len()
        );
        Ok(config)
    }

    /// Startup validation of the declared route table and stats settings.
    pub fn validate(&self) -> Result<()> {
        if self.routes.is_empty() {
            return Err(AppError::Config("No routes declared".into()));
        }

        let mut names = HashSet::new();
        for route in &self.routes {
            if !names.insert(route.name.as_str()) {
                return Err(AppError::Config(format!(
                    "Duplicate route name '{}'",
                    route.name
                )));
            }
            if !route.path.starts_with('/') {
                return Err(AppError::Config(format!(
                    "Route '{}': path '{}' must start with '/'",
                    route.name, route.path
                )));
            }
            if route.methods.is_empty() {
                return Err(AppError::Config(format!(
                    "Route '{}': no methods declared",
                    route.name
                )));
            }
            for verb in &route.methods {
                if parse_method(verb).is_none() {
                    return Err(AppError::Config(format!(
                        "Route '{}': unsupported method '{}'",
                        route.name, verb
                    )));
                }
            }
        }

        if self.stats.window_days == 0 {
            return Err(AppError::Config("stats.window_days must be >= 1".into()));
        }
        if self.stats.cache_capacity == 0 {
            return Err(AppError::Config("stats.cache_capacity must be >= 1".into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.stats.window_days, 10);
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 9000

            [[route]]
            name = "stats"
            path = "/s/{doc_id}"
            methods = ["GET"]
            handler = "stats"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.routes.len(), 1);
        assert_eq!(config.routes[0].handler, HandlerKind::Stats);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_handler_rejected() {
        let result: std::result::Result<Config, _> = toml::from_str(
            r#"
            [[route]]
            name = "x"
            path = "/x"
            methods = ["GET"]
            handler = "does_not_exist"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_bad_method() {
        let mut config = Config::default();
        config.routes[0].methods = vec!["TELEPORT".into()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_names() {
        let mut config = Config::default();
        let dup = config.routes[0].clone();
        config.routes.push(dup);
        assert!(config.validate().is_err());
    }
}
