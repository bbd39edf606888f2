//! Configuration loading and database path resolution
//!
//! Configuration is optional. A missing TOML file means compiled defaults; a
//! malformed file found by discovery is logged and ignored. Only a file named
//! explicitly by the caller is allowed to fail the load.

use crate::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the configuration file location
pub const CONFIG_ENV_VAR: &str = "CINE_CONFIG";

/// Environment variable overriding the database location
pub const DATABASE_ENV_VAR: &str = "CINE_DATABASE";

/// Per-rule penalties applied when the config file does not override them.
///
/// These rules fire on every healthy dataset (yesterday's screenings, cinemas
/// not yet programmed) so they do not cost score points by default.
pub const DEFAULT_RULE_PENALTIES: &[(&str, u32)] = &[
    ("old_screenings", 0),
    ("unused_cinemas", 0),
    ("far_future_screenings", 0),
];

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// SQLite database holding the imported showtimes
    pub database_path: Option<PathBuf>,
    pub logging: LoggingConfig,
    pub validation: ValidationSettings,
}

/// `[logging]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// `[validation]` table: rule horizons and score weights
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValidationSettings {
    /// Screenings dated more than this many days after the reference date are suspicious
    pub far_future_days: u32,
    /// Maximum number of example entities quoted per finding
    pub example_limit: usize,
    /// Highest score reachable while any critical rule is triggered
    pub critical_score_cap: u32,
    /// Points lost per triggered critical rule
    pub critical_penalty: u32,
    /// Points lost per triggered warning rule
    pub warning_penalty: u32,
    /// Points lost per triggered informational rule
    pub info_penalty: u32,
    /// Per-rule overrides, keyed by rule identifier
    pub rule_penalties: BTreeMap<String, u32>,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            far_future_days: 30,
            example_limit: 3,
            critical_score_cap: 50,
            critical_penalty: 10,
            warning_penalty: 5,
            info_penalty: 0,
            rule_penalties: BTreeMap::new(),
        }
    }
}

impl ValidationSettings {
    /// Built-in overrides merged with the configured ones (configured wins)
    pub fn effective_rule_penalties(&self) -> BTreeMap<String, u32> {
        let mut penalties: BTreeMap<String, u32> = DEFAULT_RULE_PENALTIES
            .iter()
            .map(|(rule, penalty)| (rule.to_string(), *penalty))
            .collect();
        penalties.extend(
            self.rule_penalties
                .iter()
                .map(|(rule, penalty)| (rule.clone(), *penalty)),
        );
        penalties
    }
}

impl TomlConfig {
    /// Parse a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load configuration with graceful degradation
    ///
    /// An explicit path must exist and parse. Without one, the discovered file
    /// is used if readable; otherwise compiled defaults apply.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let Some(path) = config_file_path() else {
            info!("No config file found, using defaults");
            return Ok(Self::default());
        };

        match Self::from_file(&path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                Ok(config)
            }
            Err(e) => {
                warn!("Ignoring config file: {}", e);
                Ok(Self::default())
            }
        }
    }
}

/// Locate the configuration file
///
/// 1. `CINE_CONFIG` environment variable
/// 2. `<config_dir>/cine/config.toml`
/// 3. `/etc/cine/config.toml` (Linux only)
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }

    let user_config = dirs::config_dir().map(|d| d.join("cine").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/cine/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Database path resolution, highest priority first:
/// 1. Command-line argument
/// 2. `CINE_DATABASE` environment variable
/// 3. `database_path` from the TOML config
/// 4. OS-dependent compiled default
pub fn resolve_database_path(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(DATABASE_ENV_VAR) {
        return PathBuf::from(path);
    }

    if let Some(path) = &config.database_path {
        return path.clone();
    }

    default_database_path()
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("cine"))
        .unwrap_or_else(|| PathBuf::from("./cine_data"))
        .join("cine.db")
}
