// SPDX-License-Identifier: GPL-3.0-only

//! Disk enumeration
//!
//! Turns the raw disk, partition and volume query rows into `DiskRecord`s.
//! The OS is inconsistent about field types (enums arrive as names or as
//! integers, sizes sometimes as strings), so every field is read leniently.

use std::sync::Arc;

use media_contracts::{CommandExecutor, FormatError, Result};
use media_types::{DiskRecord, PartitionRecord, PartitionStyle};
use serde_json::Value;
use tracing::{debug, warn};

use crate::scripts;

/// Read-only view over the host's disks.
#[derive(Clone)]
pub struct DiskCatalog {
    executor: Arc<dyn CommandExecutor>,
}

impl DiskCatalog {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    /// Enumerate all disks with their partitions and mounted letters.
    ///
    /// Rows without a disk number are skipped.
    pub async fn list_disks(&self) -> Result<Vec<DiskRecord>> {
        let rows = self.executor.execute_json(&scripts::list_disks()).await?;
        let mut disks = Vec::with_capacity(rows.len());

        for row in &rows {
            let Some(mut disk) = disk_from_row(row) else {
                warn!("Skipping disk row without a number: {row}");
                continue;
            };

            let partitions = self
                .executor
                .execute_json(&scripts::list_partitions(disk.number))
                .await?;
            disk.partitions = partitions.iter().filter_map(partition_from_row).collect();

            if !disk.partitions.is_empty() {
                let volumes = self
                    .executor
                    .execute_json(&scripts::list_volume_letters(disk.number))
                    .await?;
                for letter in volumes.iter().filter_map(|row| letter_field(row, "DriveLetter")) {
                    if !disk.letters.contains(&letter) {
                        disk.letters.push(letter);
                    }
                }
            }

            debug!(
                disk = disk.number,
                partitions = disk.partitions.len(),
                letters = ?disk.letters,
                "Enumerated disk"
            );
            disks.push(disk);
        }

        Ok(disks)
    }

    /// Look up a disk by OS number.
    pub async fn find(&self, number: u32) -> Result<DiskRecord> {
        self.list_disks()
            .await?
            .into_iter()
            .find(|disk| disk.number == number)
            .ok_or(FormatError::NotFound(number))
    }
}

// === Row normalization ===

pub fn disk_from_row(row: &Value) -> Option<DiskRecord> {
    let number = u32::try_from(u64_field(row, "Number")?).ok()?;
    let unique_id = Some(string_field(row, "UniqueId")).filter(|id| !id.is_empty());

    Some(DiskRecord {
        number,
        unique_id,
        friendly_name: string_field(row, "FriendlyName"),
        size_bytes: u64_field(row, "Size").unwrap_or(0),
        bus_type: bus_type_field(row),
        is_system: bool_field(row, "IsSystem"),
        is_boot: bool_field(row, "IsBoot"),
        is_read_only: bool_field(row, "IsReadOnly"),
        is_offline: bool_field(row, "IsOffline"),
        partition_style: partition_style_field(row),
        letters: Vec::new(),
        partitions: Vec::new(),
    })
}

pub fn partition_from_row(row: &Value) -> Option<PartitionRecord> {
    let partition_number = u32::try_from(u64_field(row, "PartitionNumber")?).ok()?;
    Some(PartitionRecord {
        partition_number,
        drive_letter: letter_field(row, "DriveLetter"),
        size_bytes: u64_field(row, "Size").unwrap_or(0),
        partition_type: string_field(row, "Type"),
    })
}

fn string_field(row: &Value, key: &str) -> String {
    match row.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn u64_field(row: &Value, key: &str) -> Option<u64> {
    match row.get(key)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn bool_field(row: &Value, key: &str) -> bool {
    match row.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        Some(Value::Number(n)) => n.as_u64().is_some_and(|n| n != 0),
        _ => false,
    }
}

/// Drive letters arrive as "E", as a NUL char when unassigned, or as a char code.
fn letter_field(row: &Value, key: &str) -> Option<String> {
    let c = match row.get(key)? {
        Value::String(s) => s.trim_matches(|c: char| c == '\0' || c.is_whitespace()).chars().next()?,
        Value::Number(n) => char::from_u32(u32::try_from(n.as_u64()?).ok()?)?,
        _ => return None,
    };
    c.is_ascii_alphabetic().then(|| c.to_ascii_uppercase().to_string())
}

fn partition_style_field(row: &Value) -> PartitionStyle {
    match row.get("PartitionStyle") {
        Some(Value::Number(n)) => match n.as_u64() {
            Some(0) => PartitionStyle::Raw,
            Some(1) => PartitionStyle::Mbr,
            Some(2) => PartitionStyle::Gpt,
            _ => PartitionStyle::Unknown,
        },
        Some(Value::String(s)) => match s.trim().to_ascii_uppercase().as_str() {
            "RAW" => PartitionStyle::Raw,
            "MBR" => PartitionStyle::Mbr,
            "GPT" => PartitionStyle::Gpt,
            _ => PartitionStyle::Unknown,
        },
        _ => PartitionStyle::Unknown,
    }
}

fn bus_type_field(row: &Value) -> String {
    match row.get("BusType") {
        Some(Value::Number(n)) => n
            .as_u64()
            .map(|code| bus_type_name(code).to_string())
            .unwrap_or_default(),
        _ => string_field(row, "BusType"),
    }
}

/// Storage bus codes as reported by the disk query.
fn bus_type_name(code: u64) -> &'static str {
    match code {
        1 => "SCSI",
        2 => "ATAPI",
        3 => "ATA",
        4 => "1394",
        5 => "SSA",
        6 => "Fibre Channel",
        7 => "USB",
        8 => "RAID",
        9 => "iSCSI",
        10 => "SAS",
        11 => "SATA",
        12 => "SD",
        13 => "MMC",
        14 => "Virtual",
        15 => "File Backed Virtual",
        16 => "Storage Spaces",
        17 => "NVMe",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use media_contracts::{AdminCommand, CommandKind, CommandOutput};
    use serde_json::json;

    use super::*;

    struct Canned {
        issued: Mutex<Vec<CommandKind>>,
    }

    #[async_trait]
    impl CommandExecutor for Canned {
        async fn execute(&self, command: &AdminCommand) -> Result<CommandOutput> {
            self.issued.lock().unwrap().push(command.kind.clone());
            let stdout = match command.kind {
                CommandKind::ListDisks => json!([
                    {"Number": 0, "FriendlyName": "Samsung SSD", "Size": 512110190592u64,
                     "BusType": 17, "IsSystem": true, "IsBoot": true, "PartitionStyle": 2},
                    {"Number": 3, "UniqueId": "USBSTOR\\SD#0001", "FriendlyName": "Generic SD",
                     "Size": "32000000000", "BusType": "SD", "IsReadOnly": "False",
                     "PartitionStyle": "MBR"},
                    {"FriendlyName": "ghost"}
                ])
                .to_string(),
                CommandKind::ListPartitions { disk: 0 } => json!([
                    {"PartitionNumber": 1, "DriveLetter": "\u{0}", "Size": 104857600, "Type": "System"},
                    {"PartitionNumber": 2, "DriveLetter": "C", "Size": 511000000000u64, "Type": "Basic"}
                ])
                .to_string(),
                // single partitions arrive as a bare object
                CommandKind::ListPartitions { disk: 3 } => {
                    json!({"PartitionNumber": 1, "DriveLetter": 69, "Size": 31999000000u64, "Type": "IFS"})
                        .to_string()
                }
                CommandKind::ListVolumeLetters { disk: 0 } => json!({"DriveLetter": "C"}).to_string(),
                CommandKind::ListVolumeLetters { disk: 3 } => {
                    json!([{"DriveLetter": "e"}, {"DriveLetter": "E"}]).to_string()
                }
                _ => String::new(),
            };
            Ok(CommandOutput::success(stdout))
        }
    }

    fn catalog() -> (Arc<Canned>, DiskCatalog) {
        let executor = Arc::new(Canned {
            issued: Mutex::new(Vec::new()),
        });
        (executor.clone(), DiskCatalog::new(executor))
    }

    #[tokio::test]
    async fn enumerates_and_normalizes_disks() {
        let (_, catalog) = catalog();
        let disks = catalog.list_disks().await.unwrap();

        assert_eq!(disks.len(), 2);

        let system = &disks[0];
        assert!(system.is_protected());
        assert_eq!(system.bus_type, "NVMe");
        assert_eq!(system.partition_style, PartitionStyle::Gpt);
        assert_eq!(system.partitions[0].drive_letter, None);
        assert_eq!(system.letters, vec!["C"]);

        let card = &disks[1];
        assert_eq!(card.number, 3);
        assert_eq!(card.size_bytes, 32_000_000_000);
        assert_eq!(card.bus_type, "SD");
        assert!(!card.is_read_only);
        assert_eq!(card.unique_id.as_deref(), Some("USBSTOR\\SD#0001"));
        assert_eq!(card.partitions.len(), 1);
        assert_eq!(card.partitions[0].drive_letter.as_deref(), Some("E"));
        assert_eq!(card.letters, vec!["E"]);
    }

    #[tokio::test]
    async fn find_reports_missing_disk() {
        let (_, catalog) = catalog();
        assert_eq!(catalog.find(3).await.unwrap().friendly_name, "Generic SD");
        assert!(matches!(catalog.find(9).await, Err(FormatError::NotFound(9))));
    }

    #[tokio::test]
    async fn enumeration_never_mutates() {
        let (executor, catalog) = catalog();
        catalog.list_disks().await.unwrap();
        assert!(
            executor
                .issued
                .lock()
                .unwrap()
                .iter()
                .all(|kind| !kind.is_mutating())
        );
    }

    #[test]
    fn unknown_bus_codes_are_named_unknown() {
        assert_eq!(bus_type_name(7), "USB");
        assert_eq!(bus_type_name(99), "Unknown");
    }
}
