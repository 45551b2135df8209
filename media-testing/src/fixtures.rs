// SPDX-License-Identifier: GPL-3.0-only

//! Disk fixtures shaped like real enumeration output

use media_types::{DiskRecord, PartitionRecord, PartitionStyle};

/// Removable SD card with one FAT volume mounted as `E`.
pub fn sd_card(number: u32, size_bytes: u64) -> DiskRecord {
    DiskRecord {
        number,
        unique_id: Some(format!("SD-{number:04}")),
        friendly_name: "Generic STORAGE DEVICE".to_string(),
        size_bytes,
        bus_type: "SD".to_string(),
        partition_style: PartitionStyle::Mbr,
        letters: vec!["E".to_string()],
        partitions: vec![PartitionRecord {
            partition_number: 1,
            drive_letter: Some("E".to_string()),
            size_bytes: size_bytes.saturating_sub(4 * 1024 * 1024),
            partition_type: "IFS".to_string(),
        }],
        ..Default::default()
    }
}

/// USB stick without any partitions.
pub fn blank_usb_stick(number: u32, size_bytes: u64) -> DiskRecord {
    DiskRecord {
        number,
        unique_id: Some(format!("USBSTOR-{number:04}")),
        friendly_name: "SanDisk Ultra USB 3.0".to_string(),
        size_bytes,
        bus_type: "USB".to_string(),
        partition_style: PartitionStyle::Raw,
        ..Default::default()
    }
}

/// The disk the OS boots from.
pub fn system_disk(number: u32) -> DiskRecord {
    DiskRecord {
        number,
        unique_id: Some("NVME-0000".to_string()),
        friendly_name: "Samsung SSD 980".to_string(),
        size_bytes: 512_110_190_592,
        bus_type: "NVMe".to_string(),
        is_system: true,
        is_boot: true,
        partition_style: PartitionStyle::Gpt,
        letters: vec!["C".to_string()],
        partitions: vec![PartitionRecord {
            partition_number: 3,
            drive_letter: Some("C".to_string()),
            size_bytes: 511_000_000_000,
            partition_type: "Basic".to_string(),
        }],
        ..Default::default()
    }
}

/// SD card with its write-protect switch engaged.
pub fn locked_card(number: u32) -> DiskRecord {
    DiskRecord {
        is_read_only: true,
        ..sd_card(number, 16_000_000_000)
    }
}

/// A typical host: system disk 0, a blank stick on 2 and an SD card on 3.
pub fn host() -> Vec<DiskRecord> {
    vec![
        system_disk(0),
        blank_usb_stick(2, 64_000_000_000),
        sd_card(3, 32_000_000_000),
    ]
}
