// SPDX-License-Identifier: GPL-3.0-only

//! Filesystem, allocation unit and label policy
//!
//! Pure functions of the request and the target's size. The result is
//! computed once per run and never re-derived.

use media_contracts::{FormatError, Result};
use media_types::{
    ClusterRequest, ClusterSize, DiskRecord, FAT32_MAX_BYTES, Filesystem, FilesystemChoice,
    FormatRequest, GIB, KIB, ResolvedPolicy, format_size,
};

pub const DEFAULT_LABEL: &str = "SD_CARD";

/// Allocation unit most cameras expect on FAT32 media.
pub const CAMERA_CLUSTER_BYTES: u64 = 32 * KIB;

const CAMERA_LABEL_MAX: usize = 11;
const LABEL_MAX: usize = 32;
const RESERVED_LABEL_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

pub fn suggest_filesystem(size_bytes: u64) -> Filesystem {
    if size_bytes <= FAT32_MAX_BYTES {
        Filesystem::Fat32
    } else {
        Filesystem::ExFat
    }
}

/// Allocation unit for `filesystem` on a device of `size_bytes`.
///
/// Non-decreasing in size for a fixed filesystem.
pub fn suggest_cluster_bytes(filesystem: Filesystem, size_bytes: u64) -> u64 {
    match filesystem {
        Filesystem::Fat32 => match size_bytes {
            s if s <= 4 * GIB => 4 * KIB,
            s if s <= 8 * GIB => 8 * KIB,
            s if s <= 16 * GIB => 16 * KIB,
            _ => 32 * KIB,
        },
        Filesystem::ExFat => match size_bytes {
            s if s <= 64 * GIB => 128 * KIB,
            s if s <= 256 * GIB => 256 * KIB,
            _ => 512 * KIB,
        },
        Filesystem::Ntfs => 4 * KIB,
    }
}

/// Make `raw` acceptable as a volume label.
///
/// Camera mode yields `[A-Z0-9 _]{1,11}`; otherwise printable ASCII without
/// reserved characters, at most 32 long, with no trailing dots or spaces.
/// Applying it twice changes nothing.
pub fn sanitize_label(raw: &str, camera_compat: bool) -> String {
    let label = if camera_compat {
        camera_label(raw)
    } else {
        general_label(raw)
    };

    if label.is_empty() {
        DEFAULT_LABEL.to_string()
    } else {
        label
    }
}

fn camera_label(raw: &str) -> String {
    let mut label = String::with_capacity(raw.len());
    for c in raw.chars() {
        let c = c.to_ascii_uppercase();
        let c = if c.is_ascii_uppercase() || c.is_ascii_digit() || c == ' ' || c == '_' {
            c
        } else {
            '_'
        };
        if c == ' ' && label.ends_with(' ') {
            continue;
        }
        label.push(c);
    }

    let truncated: String = label.trim().chars().take(CAMERA_LABEL_MAX).collect();
    truncated.trim().to_string()
}

fn general_label(raw: &str) -> String {
    let filtered: String = raw
        .chars()
        .filter(|c| (' '..='~').contains(c) && !RESERVED_LABEL_CHARS.contains(c))
        .collect();
    let truncated: String = filtered.trim_start_matches(' ').chars().take(LABEL_MAX).collect();
    truncated.trim_end_matches(['.', ' ']).to_string()
}

/// Compute the filesystem, allocation unit and label for this run.
pub fn resolve_policy(request: &FormatRequest, disk: &DiskRecord) -> Result<ResolvedPolicy> {
    let size = disk.size_bytes;

    let mut filesystem = match request.filesystem {
        FilesystemChoice::Auto => suggest_filesystem(size),
        FilesystemChoice::Fixed(filesystem) => filesystem,
    };

    if request.cluster == ClusterRequest::Bytes(0) {
        return Err(FormatError::PolicyViolation(
            "Cluster size must be a positive integer".to_string(),
        ));
    }

    let cluster = if request.camera_compat {
        if size <= FAT32_MAX_BYTES {
            filesystem = Filesystem::Fat32;
        }
        ClusterSize::Bytes(CAMERA_CLUSTER_BYTES)
    } else {
        match request.cluster {
            ClusterRequest::Default => ClusterSize::Default,
            ClusterRequest::Auto => ClusterSize::Bytes(suggest_cluster_bytes(filesystem, size)),
            ClusterRequest::Bytes(bytes) => ClusterSize::Bytes(bytes),
        }
    };

    if filesystem == Filesystem::Fat32 && size > FAT32_MAX_BYTES {
        return Err(FormatError::PolicyViolation(format!(
            "FAT32 selected but disk #{} holds {} (limit {}). Use exFAT or AUTO",
            disk.number,
            format_size(size),
            format_size(FAT32_MAX_BYTES)
        )));
    }

    Ok(ResolvedPolicy {
        filesystem,
        cluster,
        label: sanitize_label(&request.label, request.camera_compat),
    })
}
