// SPDX-License-Identifier: GPL-3.0-only

//! Disk data models
//!
//! A `DiskRecord` is a snapshot: it is rebuilt on every enumeration and never
//! updated in place. Look disks up by `number`, never by position.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Partition table currently present on a disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PartitionStyle {
    #[serde(rename = "RAW")]
    Raw,
    #[serde(rename = "MBR")]
    Mbr,
    #[serde(rename = "GPT")]
    Gpt,
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

impl PartitionStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            PartitionStyle::Raw => "RAW",
            PartitionStyle::Mbr => "MBR",
            PartitionStyle::Gpt => "GPT",
            PartitionStyle::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PartitionStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One partition as listed by the partition query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionRecord {
    pub partition_number: u32,

    /// Drive letter without the colon, if one is assigned
    pub drive_letter: Option<String>,

    pub size_bytes: u64,

    /// Partition type as reported by the OS (e.g., "IFS", "Basic")
    pub partition_type: String,
}

/// One physical disk as reported by the OS at enumeration time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskRecord {
    // === Identity ===
    /// OS disk number, stable for the session
    pub number: u32,

    /// Opaque identifier (serial/GUID), when the OS reports one
    pub unique_id: Option<String>,

    /// Display name only
    pub friendly_name: String,

    // === Physical Properties ===
    /// Total size in bytes, 0 when unknown
    pub size_bytes: u64,

    /// Connection bus (e.g., "USB", "SD", "SATA", "NVMe")
    pub bus_type: String,

    // === Flags ===
    pub is_system: bool,
    pub is_boot: bool,
    pub is_read_only: bool,
    pub is_offline: bool,

    // === Layout ===
    pub partition_style: PartitionStyle,

    /// Currently mounted drive letters, in OS order
    pub letters: Vec<String>,

    pub partitions: Vec<PartitionRecord>,
}

impl DiskRecord {
    /// Whether the disk carries the system or boot volume.
    pub fn is_protected(&self) -> bool {
        self.is_system || self.is_boot
    }

    pub fn display_name(&self) -> String {
        if self.friendly_name.is_empty() {
            format!("Disk {}", self.number)
        } else {
            self.friendly_name.clone()
        }
    }
}
