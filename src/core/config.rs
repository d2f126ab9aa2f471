//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.paddock/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;

use crate::core::pipeline::PipelineLimits;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PaddockConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub naming: NamingConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Capacity of the diagnostics ring of recent inputs.
    pub input_history_capacity: Option<usize>,
    /// Bound on the pending-input queue.
    pub input_queue_capacity: Option<usize>,
    /// Override for the save directory (default `~/.paddock/saves`).
    pub save_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct NamingConfig {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub suggestion_count: Option<usize>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_INPUT_HISTORY_CAPACITY: usize = 32;
pub const DEFAULT_INPUT_QUEUE_CAPACITY: usize = 64;
pub const DEFAULT_NAME_MIN_LENGTH: usize = 2;
pub const DEFAULT_NAME_MAX_LENGTH: usize = 18;
pub const DEFAULT_SUGGESTION_COUNT: usize = 6;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub input_history_capacity: usize,
    pub input_queue_capacity: usize,
    pub name_min_length: usize,
    pub name_max_length: usize,
    pub suggestion_count: usize,
    pub save_dir: Option<PathBuf>,
}

impl ResolvedConfig {
    pub fn limits(&self) -> PipelineLimits {
        PipelineLimits {
            history_capacity: self.input_history_capacity,
            name_min: self.name_min_length,
            name_max: self.name_max_length,
            suggestion_count: self.suggestion_count,
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.paddock/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".paddock").join("config.toml"))
}

/// Load config from `~/.paddock/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `PaddockConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<PaddockConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(PaddockConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(PaddockConfig::default());
    }

    let contents = fs::read_to_string(&path).map_err(ConfigError::Io)?;
    let config: PaddockConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &PathBuf) {
    let default_content = r#"# Paddock Configuration
# All settings are optional — defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# input_history_capacity = 32    # Recent inputs kept for diagnostics
# input_queue_capacity = 64      # Pending-input queue bound
# save_dir = "/path/to/saves"    # Or set PADDOCK_SAVE_DIR env var

# [naming]
# min_length = 2
# max_length = 18
# suggestion_count = 6           # Names offered by the suggestion command
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars
/// → CLI. `cli_save_dir` comes from the `--save-dir` flag (None = unset).
pub fn resolve(config: &PaddockConfig, cli_save_dir: Option<&str>) -> ResolvedConfig {
    // Save dir: CLI → env → config → default (resolved by the game module)
    let save_dir = cli_save_dir
        .map(|s| s.to_string())
        .or_else(|| std::env::var("PADDOCK_SAVE_DIR").ok())
        .or_else(|| config.general.save_dir.clone())
        .map(PathBuf::from);

    ResolvedConfig {
        input_history_capacity: config
            .general
            .input_history_capacity
            .unwrap_or(DEFAULT_INPUT_HISTORY_CAPACITY),
        input_queue_capacity: config
            .general
            .input_queue_capacity
            .unwrap_or(DEFAULT_INPUT_QUEUE_CAPACITY),
        name_min_length: config.naming.min_length.unwrap_or(DEFAULT_NAME_MIN_LENGTH),
        name_max_length: config.naming.max_length.unwrap_or(DEFAULT_NAME_MAX_LENGTH),
        suggestion_count: config
            .naming
            .suggestion_count
            .unwrap_or(DEFAULT_SUGGESTION_COUNT),
        save_dir,
    }
}
