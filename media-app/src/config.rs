// SPDX-License-Identifier: GPL-3.0-only

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use media_pipeline::DEFAULT_LABEL;
use media_types::{FilesystemChoice, TableStyle, WipeMode};
use serde::{Deserialize, Deserializer, Serialize};

pub const CONFIG_ENV: &str = "SD_FORMATTER_CONFIG";
const APP_DIR: &str = "sd-formatter";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LoggingLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LoggingLevel {
    pub fn from_verbosity(verbose: u8) -> Option<Self> {
        match verbose {
            0 => None,
            1 => Some(Self::Debug),
            _ => Some(Self::Trace),
        }
    }

    pub fn as_directive(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Defaults for the command line, read from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub log_level: LoggingLevel,
    pub log_to_disk: bool,
    pub default_label: String,
    #[serde(deserialize_with = "from_str_lenient")]
    pub default_filesystem: FilesystemChoice,
    #[serde(deserialize_with = "from_str_lenient")]
    pub default_wipe: WipeMode,
    #[serde(deserialize_with = "from_str_lenient")]
    pub partition_style: TableStyle,
    pub io_test_size_mb: u32,
    pub quick: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LoggingLevel::Info,
            log_to_disk: true,
            default_label: DEFAULT_LABEL.to_string(),
            default_filesystem: FilesystemChoice::Auto,
            default_wipe: WipeMode::Metadata,
            partition_style: TableStyle::Mbr,
            io_test_size_mb: 8,
            quick: true,
        }
    }
}

impl Config {
    /// Load from `$SD_FORMATTER_CONFIG` or the per-user config directory.
    ///
    /// A missing file yields the defaults; an unreadable or invalid one is an error.
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Accept the same case-insensitive spellings as the command line.
fn from_str_lenient<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr<Err = String>,
{
    let value = String::deserialize(deserializer)?;
    value.parse().map_err(serde::de::Error::custom)
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

fn config_dir() -> Option<PathBuf> {
    if let Some(appdata) = std::env::var_os("APPDATA") {
        return Some(PathBuf::from(appdata));
    }
    if let Some(xdg_config) = std::env::var_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config));
    }
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
}
