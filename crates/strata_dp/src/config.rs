//! Engine configuration loading and validation.
//!
//! Tunables for the detailed-placement engine, loaded from a `strata.toml`
//! file or built from defaults. Every field has a default so a missing file
//! or empty table is valid.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors that can occur when loading or validating a `strata.toml` configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(String),

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    Validation(String),
}

/// Tunables for the detailed-placement engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of cells a single move transaction may touch.
    pub move_limit: usize,
    /// Ceiling on reported violations per legality audit.
    pub max_audit_errors: usize,
    /// Nets with more pins than this are skipped by the wirelength objective.
    pub skip_fanout_above: usize,
    /// How many rows above and below a cell the closest-segment scan visits.
    pub scan_rows: usize,
    /// How many placements a generator tries before giving up on a candidate.
    pub attempt_budget: usize,
    /// Upper bound on the size of a matching group in the `mis` pass.
    pub max_group_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            move_limit: 8,
            max_audit_errors: 100,
            skip_fanout_above: 64,
            scan_rows: 8,
            attempt_budget: 16,
            max_group_size: 5,
        }
    }
}

/// Loads and validates a `strata.toml` configuration file.
pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses and validates a configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<EngineConfig, ConfigError> {
    let config: EngineConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that configuration values are internally consistent.
fn validate_config(config: &EngineConfig) -> Result<(), ConfigError> {
    if config.move_limit < 2 {
        return Err(ConfigError::Validation(
            "move_limit must be at least 2 (a swap touches two cells)".to_string(),
        ));
    }
    if config.max_group_size > config.move_limit {
        return Err(ConfigError::Validation(format!(
            "max_group_size ({}) must not exceed move_limit ({})",
            config.max_group_size, config.move_limit
        )));
    }
    if config.max_group_size < 2 {
        return Err(ConfigError::Validation(
            "max_group_size must be at least 2".to_string(),
        ));
    }
    Ok(())
}
