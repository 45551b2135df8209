// SPDX-License-Identifier: GPL-3.0-only

//! Plain-text disk listings

use media_types::{DiskRecord, bytes_to_pretty, format_size};

const HEADER: [&str; 7] = ["#", "Size", "Bus", "Style", "Letters", "Flags", "Name"];

fn flags(disk: &DiskRecord) -> String {
    let mut flags = Vec::new();
    if disk.is_system {
        flags.push("SYSTEM");
    }
    if disk.is_boot {
        flags.push("BOOT");
    }
    if disk.is_read_only {
        flags.push("RO");
    }
    if disk.is_offline {
        flags.push("OFFLINE");
    }
    if flags.is_empty() {
        "-".to_string()
    } else {
        flags.join(",")
    }
}

fn row(disk: &DiskRecord) -> [String; 7] {
    [
        disk.number.to_string(),
        format_size(disk.size_bytes),
        disk.bus_type.clone(),
        disk.partition_style.to_string(),
        if disk.letters.is_empty() {
            "-".to_string()
        } else {
            disk.letters.join(",")
        },
        flags(disk),
        disk.display_name(),
    ]
}

/// Aligned table of all disks, one per line.
pub fn render_disks(disks: &[DiskRecord]) -> String {
    if disks.is_empty() {
        return "No disks found.".to_string();
    }

    let rows: Vec<[String; 7]> = disks.iter().map(row).collect();
    let mut widths = HEADER.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let render_line = |cells: &[String]| {
        cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![render_line(HEADER.map(String::from).as_slice())];
    lines.extend(rows.iter().map(|row| render_line(row.as_slice())));
    lines.join("\n")
}

/// Detailed view of one disk including its partitions.
pub fn render_disk_info(disk: &DiskRecord) -> String {
    let mut lines = vec![
        format!("Disk #{}: {}", disk.number, disk.display_name()),
        format!("  Size:            {}", bytes_to_pretty(disk.size_bytes, true)),
        format!("  Bus:             {}", disk.bus_type),
        format!("  Partition style: {}", disk.partition_style),
        format!(
            "  UniqueId:        {}",
            disk.unique_id.as_deref().unwrap_or("-")
        ),
        format!("  Flags:           {}", flags(disk)),
    ];

    if disk.partitions.is_empty() {
        lines.push("  Partitions:      none".to_string());
    } else {
        lines.push("  Partitions:".to_string());
        for partition in &disk.partitions {
            lines.push(format!(
                "    #{:<3} {:<4} {:>12}  {}",
                partition.partition_number,
                partition
                    .drive_letter
                    .as_deref()
                    .map(|letter| format!("{letter}:"))
                    .unwrap_or_else(|| "-".to_string()),
                format_size(partition.size_bytes),
                partition.partition_type
            ));
        }
    }
    lines.join("\n")
}
