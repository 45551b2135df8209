// SPDX-License-Identifier: GPL-3.0-only

//! The resolved user intent for one formatting run

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Filesystem;

/// Filesystem as requested by the user, before policy resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilesystemChoice {
    #[default]
    #[serde(rename = "AUTO")]
    Auto,
    #[serde(untagged)]
    Fixed(Filesystem),
}

impl fmt::Display for FilesystemChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilesystemChoice::Auto => f.write_str("AUTO"),
            FilesystemChoice::Fixed(fs) => fs.fmt(f),
        }
    }
}

impl FromStr for FilesystemChoice {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().eq_ignore_ascii_case("auto") {
            return Ok(FilesystemChoice::Auto);
        }
        value.parse().map(FilesystemChoice::Fixed)
    }
}

/// Allocation unit size as requested by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterRequest {
    /// Leave the choice to the format command
    #[default]
    Default,
    /// Use the size suggested by the policy engine
    Auto,
    /// Explicit size in bytes
    Bytes(u64),
}

impl FromStr for ClusterRequest {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("auto") {
            return Ok(ClusterRequest::Auto);
        }
        if value.eq_ignore_ascii_case("default") {
            return Ok(ClusterRequest::Default);
        }
        match value.parse::<u64>() {
            Ok(bytes) if bytes > 0 => Ok(ClusterRequest::Bytes(bytes)),
            _ => Err(format!(
                "invalid cluster size '{value}': use a positive integer, AUTO or DEFAULT"
            )),
        }
    }
}

/// How much of the device is erased before re-initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WipeMode {
    None,
    #[default]
    Metadata,
    ZeroAll,
}

impl WipeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            WipeMode::None => "none",
            WipeMode::Metadata => "metadata",
            WipeMode::ZeroAll => "zero-all",
        }
    }
}

impl fmt::Display for WipeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WipeMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(WipeMode::None),
            "metadata" => Ok(WipeMode::Metadata),
            "zero-all" | "zero_all" => Ok(WipeMode::ZeroAll),
            other => Err(format!("invalid wipe mode: {other}")),
        }
    }
}

/// Partition table written by the Initialize step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TableStyle {
    #[default]
    Mbr,
    Gpt,
}

impl TableStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            TableStyle::Mbr => "MBR",
            TableStyle::Gpt => "GPT",
        }
    }
}

impl fmt::Display for TableStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableStyle {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "MBR" | "DOS" => Ok(TableStyle::Mbr),
            "GPT" => Ok(TableStyle::Gpt),
            other => Err(format!("invalid partition style: {other}")),
        }
    }
}

/// Everything needed to run the pipeline once. Built before the run starts and
/// never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatRequest {
    pub disk: u32,
    pub filesystem: FilesystemChoice,
    pub cluster: ClusterRequest,
    pub quick: bool,
    pub wipe: WipeMode,
    pub camera_compat: bool,
    pub partition_style: TableStyle,
    pub dry_run: bool,
    pub skip_verify: bool,
    /// Size of the optional post-format write test, in MiB
    pub io_test_mb: Option<u32>,
    /// Label exactly as typed; sanitized during policy resolution
    pub label: String,
}

impl FormatRequest {
    pub fn new(disk: u32, label: impl Into<String>) -> Self {
        Self {
            disk,
            filesystem: FilesystemChoice::Auto,
            cluster: ClusterRequest::Default,
            quick: true,
            wipe: WipeMode::Metadata,
            camera_compat: false,
            partition_style: TableStyle::Mbr,
            dry_run: false,
            skip_verify: false,
            io_test_mb: None,
            label: label.into(),
        }
    }

    /// The literal token the operator must type to authorize this run.
    pub fn confirmation_token(&self) -> String {
        format!("CONFIRM-{}", self.disk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_request_parsing() {
        assert_eq!("AUTO".parse::<ClusterRequest>(), Ok(ClusterRequest::Auto));
        assert_eq!(
            "32768".parse::<ClusterRequest>(),
            Ok(ClusterRequest::Bytes(32768))
        );
        assert!("0".parse::<ClusterRequest>().is_err());
        assert!("-4096".parse::<ClusterRequest>().is_err());
        assert!("big".parse::<ClusterRequest>().is_err());
    }

    #[test]
    fn filesystem_choice_parsing() {
        assert_eq!(
            "auto".parse::<FilesystemChoice>(),
            Ok(FilesystemChoice::Auto)
        );
        assert_eq!(
            "EXFAT".parse::<FilesystemChoice>(),
            Ok(FilesystemChoice::Fixed(Filesystem::ExFat))
        );
    }

    #[test]
    fn request_defaults_match_cli_defaults() {
        let request = FormatRequest::new(3, "SDCARD");
        assert!(request.quick);
        assert_eq!(request.wipe, WipeMode::Metadata);
        assert_eq!(request.partition_style, TableStyle::Mbr);
        assert_eq!(request.confirmation_token(), "CONFIRM-3");
    }

    #[test]
    fn wipe_mode_uses_kebab_case_on_the_wire() {
        let json = serde_json::to_string(&WipeMode::ZeroAll).unwrap();
        assert_eq!(json, "\"zero-all\"");
    }
}
