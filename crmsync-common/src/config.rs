//! Configuration loading and database path resolution
//!
//! Bootstrap configuration lives in a TOML file. Resolution order for each
//! setting:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing TOML file is not fatal: a warning is logged and defaults apply.

use crate::mapping::FieldMappingConfig;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the TOML config file
pub const CONFIG_ENV_VAR: &str = "CRMSYNC_CONFIG";

/// Environment variable naming the local SQLite database
pub const DATABASE_ENV_VAR: &str = "CRMSYNC_DATABASE";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlConfig {
    /// Path to the local SQLite database (optional)
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Remote Ines CRM connection settings
    #[serde(default)]
    pub ines: InesConfig,

    /// Field mapping and enabled sync objects
    #[serde(default)]
    pub mapping: FieldMappingConfig,

    /// Batch sync behaviour
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Remote Ines CRM connection settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InesConfig {
    /// Base URL of the web-service gateway
    #[serde(default = "default_ines_base_url")]
    pub base_url: String,

    /// Customer account ("compte")
    #[serde(default)]
    pub account: String,

    /// Web-service user name
    #[serde(default)]
    pub username: String,

    /// Web-service password (prefer the environment override)
    #[serde(default)]
    pub password: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for InesConfig {
    fn default() -> Self {
        Self {
            base_url: default_ines_base_url(),
            account: String::new(),
            username: String::new(),
            password: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Batch sync behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    /// Window start when a run gives no explicit `from`
    #[serde(default = "default_lookback_minutes")]
    pub default_lookback_minutes: i64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            default_lookback_minutes: default_lookback_minutes(),
        }
    }
}

impl SyncConfig {
    pub fn default_lookback(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.default_lookback_minutes.max(0))
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_ines_base_url() -> String {
    "https://webservices.inescrm.com/wsmautic".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_lookback_minutes() -> i64 {
    15
}

/// Locate the TOML config file
///
/// Returns `None` when neither an override nor the platform default exists.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    default_config_path().filter(|p| p.exists())
}

/// Platform config file location (~/.config/crmsync/config.toml on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("crmsync").join("config.toml"))
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load configuration, degrading to defaults when no file exists
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    match resolve_config_path(cli_arg) {
        Some(path) if path.exists() => {
            let config = load_toml_config(&path)?;
            info!("Loaded configuration from {}", path.display());
            Ok(config)
        }
        Some(path) => {
            warn!(
                "Config file {} not found, using built-in defaults",
                path.display()
            );
            Ok(TomlConfig::default())
        }
        None => {
            warn!("No config file found, using built-in defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Resolve the local database path
pub fn resolve_database_path(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(DATABASE_ENV_VAR) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &config.database_path {
        return path.clone();
    }

    // Priority 4: OS-dependent compiled default
    default_database_path()
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("crmsync").join("crmsync.db"))
        .unwrap_or_else(|| PathBuf::from("./crmsync_data/crmsync.db"))
}
