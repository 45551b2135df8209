// SPDX-License-Identifier: GPL-3.0-only

//! Size constants and byte formatting shared across the workspace

use num_format::{Locale, ToFormattedString};

pub const KIB: u64 = 1024;
pub const MIB: u64 = 1024 * KIB;
pub const GIB: u64 = 1024 * MIB;

/// Largest device FAT32 may be selected for.
pub const FAT32_MAX_BYTES: u64 = 32 * GIB;

/// Smallest device the safety gate accepts when the size is known.
pub const MIN_TARGET_BYTES: u64 = 64 * MIB;

/// Short size used in disk tables and summaries ("29.8 GB", "512 MB").
pub fn format_size(bytes: u64) -> String {
    let gib = bytes as f64 / GIB as f64;
    if gib >= 1.0 {
        return format!("{gib:.1} GB");
    }
    let mib = bytes as f64 / MIB as f64;
    format!("{mib:.0} MB")
}

/// Convert bytes to a human-readable string (e.g., "1.50 GB")
pub fn bytes_to_pretty(bytes: u64, add_bytes: bool) -> String {
    let mut steps = 0;
    let mut val = bytes as f64;

    while val > 1024. && steps < 5 {
        val /= 1024.;
        steps += 1;
    }

    let unit = match steps {
        0 => "B",
        1 => "KB",
        2 => "MB",
        3 => "GB",
        4 => "TB",
        _ => "PB",
    };

    if add_bytes {
        let bytes_str = bytes.to_formatted_string(&Locale::en);
        format!("{val:.2} {unit} ({bytes_str} bytes)")
    } else {
        format!("{val:.2} {unit}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_size_switches_units_at_one_gib() {
        assert_eq!(format_size(512 * MIB), "512 MB");
        assert_eq!(format_size(GIB), "1.0 GB");
        assert_eq!(format_size(32_000_000_000), "29.8 GB");
    }

    #[test]
    fn pretty_bytes_includes_grouped_count() {
        assert_eq!(bytes_to_pretty(2048, false), "2.00 KB");
        assert_eq!(bytes_to_pretty(1536, true), "1.50 KB (1,536 bytes)");
    }
}
