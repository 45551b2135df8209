// SPDX-License-Identifier: GPL-3.0-only

use media_contracts::{FormatError, Result};
use media_types::{DiskRecord, MIN_TARGET_BYTES};

/// Refuse targets that must never be formatted.
///
/// A size of 0 means the OS did not report one and is not treated as too small.
pub fn ensure_safe_target(disk: &DiskRecord) -> Result<()> {
    if disk.is_protected() {
        return Err(FormatError::UnsafeTarget { disk: disk.number });
    }
    if disk.is_read_only {
        return Err(FormatError::ReadOnly { disk: disk.number });
    }
    if disk.size_bytes > 0 && disk.size_bytes < MIN_TARGET_BYTES {
        return Err(FormatError::TooSmall {
            disk: disk.number,
            size_bytes: disk.size_bytes,
            minimum_bytes: MIN_TARGET_BYTES,
        });
    }
    Ok(())
}
