// SPDX-License-Identifier: GPL-3.0-only

//! Canonical domain models for the media formatter
//!
//! Every layer of the workspace speaks these types:
//!
//! - **media-sys**: builds `DiskRecord`s from administrative command output
//! - **media-pipeline**: consumes a `FormatRequest`, derives a `ResolvedPolicy`
//!   and fills in a `PipelineResult`
//! - **media-app**: renders disks, progress events and the final result
//!
//! The types are plain data. Decisions (safety, policy, sequencing) live in
//! `media-pipeline`.

pub mod common;
pub mod disk;
pub mod policy;
pub mod progress;
pub mod request;
pub mod result;

pub use common::{
    FAT32_MAX_BYTES, GIB, KIB, MIB, MIN_TARGET_BYTES, bytes_to_pretty, format_size,
};
pub use disk::{DiskRecord, PartitionRecord, PartitionStyle};
pub use policy::{ClusterSize, ResolvedPolicy};
pub use progress::ProgressEvent;
pub use request::{ClusterRequest, FilesystemChoice, FormatRequest, TableStyle, WipeMode};
pub use result::{FailureKind, IoTestReport, PipelineResult, RunStatus, VerifyStatus};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A concrete filesystem the pipeline can format with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Filesystem {
    #[serde(rename = "FAT32")]
    Fat32,
    #[serde(rename = "exFAT")]
    ExFat,
    #[serde(rename = "NTFS")]
    Ntfs,
}

impl Filesystem {
    /// Name understood by `Format-Volume -FileSystem` and reported by `Get-Volume`.
    pub fn as_str(self) -> &'static str {
        match self {
            Filesystem::Fat32 => "FAT32",
            Filesystem::ExFat => "exFAT",
            Filesystem::Ntfs => "NTFS",
        }
    }
}

impl fmt::Display for Filesystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Filesystem {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "FAT32" => Ok(Filesystem::Fat32),
            "EXFAT" => Ok(Filesystem::ExFat),
            "NTFS" => Ok(Filesystem::Ntfs),
            other => Err(format!("unsupported filesystem: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filesystem_parses_case_insensitively() {
        assert_eq!("fat32".parse::<Filesystem>(), Ok(Filesystem::Fat32));
        assert_eq!("exFAT".parse::<Filesystem>(), Ok(Filesystem::ExFat));
        assert_eq!(" ntfs ".parse::<Filesystem>(), Ok(Filesystem::Ntfs));
        assert!("ext4".parse::<Filesystem>().is_err());
    }

    #[test]
    fn filesystem_serializes_with_windows_names() {
        let json = serde_json::to_string(&Filesystem::ExFat).unwrap();
        assert_eq!(json, "\"exFAT\"");
    }
}
