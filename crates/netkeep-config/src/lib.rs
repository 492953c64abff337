//! Shared configuration for the netkeep server and CLI.
//!
//! TOML file plus `NETKEEP_` environment overrides, layered through
//! figment. The CLI's global flags override whatever is loaded here.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Config structs ──────────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Address the API server binds to.
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Site served by default (created at startup if absent).
    #[serde(default)]
    pub site: SiteConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            site: SiteConfig::default(),
            log: LogConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteConfig {
    pub slug: String,
    pub name: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            slug: "default".into(),
            name: "Default Site".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    /// tracing env-filter directive, e.g. "netkeep=debug,tower_http=info".
    #[serde(default = "default_log_filter")]
    pub filter: String,

    /// "plain" or "json".
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            format: default_log_format(),
        }
    }
}

fn default_listen() -> String {
    "127.0.0.1:8420".into()
}
fn default_log_filter() -> String {
    "netkeep=info,tower_http=warn".into()
}
fn default_log_format() -> String {
    "plain".into()
}

// ── Loading ─────────────────────────────────────────────────────────

/// Default config file location (`~/.config/netkeep/config.toml` on Linux).
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("dev", "netkeep", "netkeep")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load configuration: defaults, then the TOML file (explicit path or the
/// default location), then `NETKEEP_*` environment variables. A missing
/// file is fine; a malformed one is an error.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    match path {
        Some(explicit) => {
            if !explicit.exists() {
                return Err(ConfigError::Validation {
                    field: "config".into(),
                    reason: format!("file not found: {}", explicit.display()),
                });
            }
            figment = figment.merge(Toml::file(explicit));
        }
        None => {
            if let Some(default_path) = default_config_path() {
                figment = figment.merge(Toml::file(default_path));
            }
        }
    }

    let config: Config = figment
        .merge(Env::prefixed("NETKEEP_").split("__"))
        .extract()?;

    if config.site.slug.is_empty() {
        return Err(ConfigError::Validation {
            field: "site.slug".into(),
            reason: "must not be empty".into(),
        });
    }
    if !matches!(config.log.format.as_str(), "plain" | "json") {
        return Err(ConfigError::Validation {
            field: "log.format".into(),
            reason: format!("expected \"plain\" or \"json\", got {:?}", config.log.format),
        });
    }
    Ok(config)
}
