use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::ScanConfig;

const APP_NAME: &str = "Ignister";
const CONFIG_FILE: &str = "config.json";

/// `config.json` inside the platform config directory.
pub fn config_file_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "ignister", APP_NAME).map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

fn default_config_path() -> Result<PathBuf> {
    config_file_path().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
}

/// Loads the configuration from `path`, or from the platform location when
/// `path` is `None`.
///
/// A missing file is created with defaults. A file that cannot be parsed is
/// migrated if possible, otherwise the defaults are used.
pub fn load_config(path: Option<&Path>) -> Result<ScanConfig> {
    let config_path = match path {
        Some(path) => path.to_path_buf(),
        None => default_config_path()?,
    };

    if !config_path.exists() {
        tracing::info!("No config at {:?}, writing defaults", config_path);
        let config = ScanConfig::default();
        save_config_to(&config, &config_path)?;
        return Ok(config);
    }

    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file {:?}", config_path))?;
    match parse_config(&content) {
        Ok(config) => {
            tracing::debug!("Loaded config from {:?}", config_path);
            Ok(config)
        }
        Err(e) => {
            tracing::warn!("Ignoring unparsable config {:?}: {}", config_path, e);
            Ok(ScanConfig::default())
        }
    }
}

/// The stored form, where any field may be absent or null.
#[derive(Deserialize)]
struct StoredConfig {
    ignore_patterns: Option<Vec<String>>,
    use_gitignore: Option<bool>,
    last_directory: Option<PathBuf>,
}

/// Parses a stored config, taking defaults for absent or null fields.
fn parse_config(content: &str) -> Result<ScanConfig> {
    let stored: StoredConfig = serde_json::from_str(content)?;
    let defaults = ScanConfig::default();
    Ok(ScanConfig {
        ignore_patterns: stored.ignore_patterns.unwrap_or(defaults.ignore_patterns),
        use_gitignore: stored.use_gitignore.unwrap_or(defaults.use_gitignore),
        last_directory: stored.last_directory,
    })
}

/// Saves the configuration to the platform location.
pub fn save_config(config: &ScanConfig) -> Result<()> {
    save_config_to(config, &default_config_path()?)
}

/// Saves the configuration to `config_path`, creating parent directories.
pub fn save_config_to(config: &ScanConfig, config_path: &Path) -> Result<()> {
    if let Some(config_dir) = config_path.parent() {
        if !config_dir.exists() {
            fs::create_dir_all(config_dir)
                .with_context(|| format!("Failed to create {:?}", config_dir))?;
            tracing::info!("Created config directory: {:?}", config_dir);
        }
    }

    let config_json = serde_json::to_string_pretty(config)?;
    fs::write(config_path, config_json)
        .with_context(|| format!("Failed to write config file {:?}", config_path))?;
    tracing::info!("Saved config to {:?}", config_path);

    Ok(())
}

/// Writes `config` to `export_path` for sharing between machines.
pub fn export_config(config: &ScanConfig, export_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    fs::write(export_path, json)
        .with_context(|| format!("Failed to export config to {:?}", export_path))?;
    Ok(())
}

/// Reads a config written by `export_config`. Unlike `load_config`, a file
/// that does not parse is an error.
pub fn import_config(import_path: &Path) -> Result<ScanConfig> {
    let content = fs::read_to_string(import_path)
        .with_context(|| format!("Failed to read {:?}", import_path))?;
    parse_config(&content).with_context(|| format!("Invalid config in {:?}", import_path))
}
