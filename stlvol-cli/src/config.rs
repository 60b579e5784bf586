//! Configuration loading for the stlvol CLI.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use stlvol_core::{CountByteOrder, CountPolicy, Unit};

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    pub defaults: Option<DefaultsConfig>,
    pub format: Option<FormatConfig>,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct DefaultsConfig {
    pub material: Option<String>,
    pub unit: Option<Unit>,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct FormatConfig {
    pub count_byte_order: Option<CountByteOrder>,
    pub count_policy: Option<CountPolicy>,
}

impl Config {
    pub fn material(&self) -> Option<&str> {
        self.defaults
            .as_ref()
            .and_then(|defaults| defaults.material.as_deref())
    }

    pub fn unit(&self) -> Option<Unit> {
        self.defaults.as_ref().and_then(|defaults| defaults.unit)
    }

    pub fn count_byte_order(&self) -> Option<CountByteOrder> {
        self.format.as_ref().and_then(|format| format.count_byte_order)
    }

    pub fn count_policy(&self) -> Option<CountPolicy> {
        self.format.as_ref().and_then(|format| format.count_policy)
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "stlvol").context("Could not determine config directory")?;
    Ok(dirs.config_dir().join("config.toml"))
}

/// Load a config file. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> Result<Config> {
    toml::from_str(contents).context("Failed to parse config file as TOML")
}
