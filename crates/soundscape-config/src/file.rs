//! Loading and saving analysis configuration as TOML.

use std::path::Path;

use soundscape_analysis::AnalysisConfig;

use crate::error::ConfigError;
use crate::paths::default_config_path;
use crate::validation::validate_config;

/// Parse and validate a configuration from a TOML string.
pub fn parse_config(toml_str: &str) -> Result<AnalysisConfig, ConfigError> {
    let config: AnalysisConfig = toml::from_str(toml_str)?;
    validate_config(&config)?;
    Ok(config)
}

/// Load and validate a configuration from a TOML file.
pub fn load_config(path: impl AsRef<Path>) -> Result<AnalysisConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
    parse_config(&content)
}

/// Load the default configuration file, or the built-in defaults when it
/// does not exist.
pub fn load_or_default() -> Result<AnalysisConfig, ConfigError> {
    let path = default_config_path();
    if path.is_file() {
        load_config(&path)
    } else {
        Ok(AnalysisConfig::default())
    }
}

/// Render a configuration as pretty TOML.
pub fn to_toml(config: &AnalysisConfig) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(config)?)
}

/// Validate and save a configuration, creating parent directories.
pub fn save_config(path: impl AsRef<Path>, config: &AnalysisConfig) -> Result<(), ConfigError> {
    let path = path.as_ref();
    validate_config(config)?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
    }

    let content = to_toml(config)?;
    std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
    Ok(())
}
