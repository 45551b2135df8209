// SPDX-License-Identifier: GPL-3.0-only

use media_pipeline::{
    DEFAULT_LABEL, ensure_safe_target, sanitize_label, suggest_cluster_bytes, suggest_filesystem,
};
use media_types::{DiskRecord, FAT32_MAX_BYTES, Filesystem, MIN_TARGET_BYTES};
use proptest::prelude::*;

fn camera_label_is_valid(label: &str) -> bool {
    let len = label.chars().count();
    (1..=11).contains(&len)
        && label
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == ' ' || c == '_')
}

fn filesystem() -> impl Strategy<Value = Filesystem> {
    prop_oneof![
        Just(Filesystem::Fat32),
        Just(Filesystem::ExFat),
        Just(Filesystem::Ntfs)
    ]
}

proptest! {
    #[test]
    fn filesystem_follows_fat32_limit(size in any::<u64>()) {
        let expected = if size <= FAT32_MAX_BYTES { Filesystem::Fat32 } else { Filesystem::ExFat };
        prop_assert_eq!(suggest_filesystem(size), expected);
    }

    #[test]
    fn cluster_suggestion_is_monotone(fs in filesystem(), a in any::<u64>(), b in any::<u64>()) {
        let (small, large) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(suggest_cluster_bytes(fs, small) <= suggest_cluster_bytes(fs, large));
    }

    #[test]
    fn label_sanitizing_is_idempotent(raw in "\\PC{0,48}", camera in any::<bool>()) {
        let once = sanitize_label(&raw, camera);
        prop_assert_eq!(sanitize_label(&once, camera), once);
    }

    #[test]
    fn camera_labels_match_the_fat_alphabet(raw in "\\PC{0,48}") {
        let label = sanitize_label(&raw, true);
        prop_assert!(camera_label_is_valid(&label), "{:?} -> {:?}", raw, label);
    }

    #[test]
    fn camera_labels_keep_alphanumeric_input(raw in "[a-zA-Z0-9][a-zA-Z0-9 _-]{0,20}") {
        prop_assert_ne!(sanitize_label(&raw, true), DEFAULT_LABEL.to_string());
    }

    #[test]
    fn general_labels_avoid_reserved_characters(raw in "\\PC{0,64}") {
        let label = sanitize_label(&raw, false);
        prop_assert!(label.len() <= 32);
        prop_assert!(!label.ends_with('.') && !label.ends_with(' '));
        prop_assert!(!label.chars().any(|c| "<>:\"/\\|?*".contains(c)));
    }

    #[test]
    fn safety_gate_decision(
        is_system in any::<bool>(),
        is_boot in any::<bool>(),
        is_read_only in any::<bool>(),
        size in MIN_TARGET_BYTES..u64::MAX,
    ) {
        let disk = DiskRecord {
            number: 5,
            size_bytes: size,
            is_system,
            is_boot,
            is_read_only,
            ..Default::default()
        };
        let flagged = is_system || is_boot || is_read_only;
        prop_assert_eq!(ensure_safe_target(&disk).is_err(), flagged);
    }
}
