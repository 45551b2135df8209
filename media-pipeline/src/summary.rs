// SPDX-License-Identifier: GPL-3.0-only

use media_types::{DiskRecord, FormatRequest, ResolvedPolicy, format_size};

/// Operator-facing description of what a run is about to destroy.
pub fn destructive_summary(
    disk: &DiskRecord,
    request: &FormatRequest,
    policy: &ResolvedPolicy,
) -> String {
    let mut lines = vec![
        "WARNING: ALL DATA ON THE SELECTED DISK WILL BE ERASED.".to_string(),
        format!(
            "- Disk: #{}  {}  {}  {}",
            disk.number,
            format_size(disk.size_bytes),
            disk.bus_type,
            disk.display_name()
        ),
    ];
    if let Some(unique_id) = &disk.unique_id {
        lines.push(format!("- UniqueId: {unique_id}"));
    }
    if !disk.letters.is_empty() {
        lines.push(format!("- Mounted as: {}", disk.letters.join(", ")));
    }
    lines.push(format!("- Partition style: {}", request.partition_style));
    lines.push(format!("- File system: {}", policy.filesystem));
    lines.push(format!("- Cluster: {}", policy.cluster));
    lines.push(format!("- Label: {}", policy.label));
    lines.push(format!("- Wipe: {}", request.wipe));
    lines.push(format!(
        "- Mode: {}",
        if request.quick { "QUICK" } else { "FULL" }
    ));
    if request.dry_run {
        lines.push("- DRY RUN: no command will modify the device".to_string());
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use media_types::{ClusterSize, Filesystem};

    use super::*;

    #[test]
    fn summary_names_target_and_policy() {
        let disk = DiskRecord {
            number: 3,
            friendly_name: "Generic SD".to_string(),
            size_bytes: 32_000_000_000,
            bus_type: "SD".to_string(),
            letters: vec!["E".to_string()],
            ..Default::default()
        };
        let request = FormatRequest::new(3, "CAM");
        let policy = ResolvedPolicy {
            filesystem: Filesystem::Fat32,
            cluster: ClusterSize::Bytes(32768),
            label: "CAM".to_string(),
        };

        let summary = destructive_summary(&disk, &request, &policy);

        assert!(summary.contains("#3"));
        assert!(summary.contains("Generic SD"));
        assert!(summary.contains("Mounted as: E"));
        assert!(summary.contains("File system: FAT32"));
        assert!(summary.contains("Cluster: 32768"));
        assert!(summary.contains("Mode: QUICK"));
        assert!(!summary.contains("DRY RUN"));
    }
}
