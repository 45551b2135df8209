// SPDX-License-Identifier: GPL-3.0-only

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use media_contracts::{AdminCommand, CommandExecutor, CommandKind, CommandOutput, FormatError, Result};
use media_types::{DiskRecord, PartitionRecord, PartitionStyle, TableStyle};
use serde_json::{Value, json};
use tracing::debug;

struct FakeDisk {
    record: DiskRecord,
    /// Filesystem and label of the formatted volume, if any
    volume: Option<(String, String)>,
}

struct FakeState {
    disks: Vec<FakeDisk>,
    issued: Vec<AdminCommand>,
    failures: HashMap<&'static str, String>,
    assigned_letter: String,
    volume_report: Option<String>,
    elevated: bool,
    pending_swap: Option<DiskRecord>,
}

/// In-memory host that answers administrative commands by kind.
///
/// Queries are answered the way the real serializer would: several rows as an
/// array, one row as a bare object, nothing as empty output.
pub struct FakeExecutor {
    state: Mutex<FakeState>,
}

impl FakeExecutor {
    pub fn new(disks: Vec<DiskRecord>) -> Self {
        Self {
            state: Mutex::new(FakeState {
                disks: disks
                    .into_iter()
                    .map(|record| FakeDisk {
                        record,
                        volume: None,
                    })
                    .collect(),
                issued: Vec::new(),
                failures: HashMap::new(),
                assigned_letter: "E".to_string(),
                volume_report: None,
                elevated: true,
                pending_swap: None,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        // a panicking test thread must not hide the state from the others
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Make every command named `command` fail with `stderr`.
    pub fn fail_on(&self, command: &'static str, stderr: impl Into<String>) {
        self.state().failures.insert(command, stderr.into());
    }

    pub fn set_assigned_letter(&self, letter: impl Into<String>) {
        self.state().assigned_letter = letter.into();
    }

    pub fn set_elevated(&self, elevated: bool) {
        self.state().elevated = elevated;
    }

    /// Answer volume inspection with `line` instead of the real volume.
    pub fn set_volume_report(&self, line: impl Into<String>) {
        self.state().volume_report = Some(line.into());
    }

    /// Replace the disk with the same number once the next listing is answered.
    pub fn swap_after_listing(&self, replacement: DiskRecord) {
        self.state().pending_swap = Some(replacement);
    }

    pub fn issued(&self) -> Vec<AdminCommand> {
        self.state().issued.clone()
    }

    pub fn issued_names(&self) -> Vec<String> {
        self.state()
            .issued
            .iter()
            .map(|command| command.name().to_string())
            .collect()
    }

    pub fn mutations(&self) -> Vec<AdminCommand> {
        self.state()
            .issued
            .iter()
            .filter(|command| command.is_mutating())
            .cloned()
            .collect()
    }

    pub fn disk(&self, number: u32) -> Option<DiskRecord> {
        self.state()
            .disks
            .iter()
            .find(|disk| disk.record.number == number)
            .map(|disk| disk.record.clone())
    }
}

#[async_trait]
impl CommandExecutor for FakeExecutor {
    async fn execute(&self, command: &AdminCommand) -> Result<CommandOutput> {
        let mut state = self.state();
        state.issued.push(command.clone());
        debug!("fake executor: {}", command.name());

        if let Some(stderr) = state.failures.get(command.name()) {
            return Err(FormatError::Command {
                command: command.name().to_string(),
                exit_code: Some(1),
                stderr: stderr.clone(),
            });
        }

        if let CommandKind::CreatePartitionAndFormat { disk, .. } = &command.kind {
            if state.has_partitions(*disk) {
                return Err(FormatError::Command {
                    command: command.name().to_string(),
                    exit_code: Some(1),
                    stderr: "Not enough available capacity".to_string(),
                });
            }
        }

        let stdout = state.answer(&command.kind);
        Ok(CommandOutput::success(stdout))
    }
}

impl FakeState {
    fn answer(&mut self, kind: &CommandKind) -> String {
        match kind {
            CommandKind::ListDisks => {
                let rows: Vec<Value> = self.disks.iter().map(|disk| disk_row(&disk.record)).collect();
                if let Some(replacement) = self.pending_swap.take() {
                    if let Some(disk) = self.find(replacement.number) {
                        disk.record = replacement;
                    }
                }
                serialize(rows)
            }
            CommandKind::ListPartitions { disk } => {
                let rows: Vec<Value> = self
                    .find(*disk)
                    .map(|disk| disk.record.partitions.iter().map(partition_row).collect())
                    .unwrap_or_default();
                serialize(rows)
            }
            CommandKind::ListVolumeLetters { disk } => {
                let rows: Vec<Value> = self
                    .find(*disk)
                    .map(|disk| {
                        disk.record
                            .letters
                            .iter()
                            .map(|letter| json!({ "DriveLetter": letter }))
                            .collect()
                    })
                    .unwrap_or_default();
                serialize(rows)
            }
            CommandKind::InspectVolume { letter } => {
                if let Some(line) = &self.volume_report {
                    return line.clone();
                }
                self.disks
                    .iter()
                    .find(|disk| disk.record.letters.contains(letter))
                    .and_then(|disk| disk.volume.as_ref())
                    .map(|(filesystem, label)| format!("{filesystem}|{label}"))
                    .unwrap_or_default()
            }
            CommandKind::CheckElevation => {
                let answer = if self.elevated { "True" } else { "False" };
                answer.to_string()
            }
            CommandKind::DismountVolumes { .. } | CommandKind::ZeroFill { .. } => String::new(),
            CommandKind::ClearMetadata { disk } => {
                if let Some(disk) = self.find(*disk) {
                    disk.clear();
                }
                String::new()
            }
            CommandKind::Initialize { disk, style } => {
                if let Some(disk) = self.find(*disk) {
                    disk.clear();
                    disk.record.partition_style = match style {
                        TableStyle::Mbr => PartitionStyle::Mbr,
                        TableStyle::Gpt => PartitionStyle::Gpt,
                    };
                }
                String::new()
            }
            CommandKind::CreatePartitionAndFormat {
                disk,
                filesystem,
                label,
                ..
            } => {
                let letter = self.assigned_letter.clone();
                if let Some(disk) = self.find(*disk) {
                    disk.record.partitions = vec![PartitionRecord {
                        partition_number: 1,
                        drive_letter: Some(letter.clone()),
                        size_bytes: disk.record.size_bytes.saturating_sub(1024 * 1024),
                        partition_type: "IFS".to_string(),
                    }];
                    disk.record.letters = vec![letter.clone()];
                    disk.volume = Some((filesystem.as_str().to_string(), label.clone()));
                }
                format!("{letter}\r\n")
            }
        }
    }

    fn find(&mut self, number: u32) -> Option<&mut FakeDisk> {
        self.disks.iter_mut().find(|disk| disk.record.number == number)
    }

    fn has_partitions(&self, number: u32) -> bool {
        self.disks
            .iter()
            .any(|disk| disk.record.number == number && !disk.record.partitions.is_empty())
    }
}

impl FakeDisk {
    /// What `Clear-Disk` leaves behind: an online, writable, RAW disk.
    fn clear(&mut self) {
        self.record.partitions.clear();
        self.record.letters.clear();
        self.record.partition_style = PartitionStyle::Raw;
        self.record.is_read_only = false;
        self.record.is_offline = false;
        self.volume = None;
    }
}

fn disk_row(disk: &DiskRecord) -> Value {
    json!({
        "Number": disk.number,
        "UniqueId": disk.unique_id,
        "FriendlyName": disk.friendly_name,
        "Size": disk.size_bytes,
        "BusType": disk.bus_type,
        "IsSystem": disk.is_system,
        "IsBoot": disk.is_boot,
        "IsReadOnly": disk.is_read_only,
        "IsOffline": disk.is_offline,
        "PartitionStyle": disk.partition_style.as_str(),
    })
}

fn partition_row(partition: &PartitionRecord) -> Value {
    json!({
        "PartitionNumber": partition.partition_number,
        "DriveLetter": partition.drive_letter.clone().unwrap_or_else(|| "\u{0}".to_string()),
        "Size": partition.size_bytes,
        "Type": partition.partition_type,
    })
}

fn serialize(mut rows: Vec<Value>) -> String {
    match rows.len() {
        0 => String::new(),
        1 => rows.remove(0).to_string(),
        _ => Value::Array(rows).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn single_rows_are_bare_objects() {
        assert_eq!(serialize(Vec::new()), "");
        assert_eq!(serialize(vec![json!({"a": 1})]), r#"{"a":1}"#);
        assert_eq!(serialize(vec![json!(1), json!(2)]), "[1,2]");
    }

    #[tokio::test]
    async fn partitioning_a_disk_with_old_partitions_fails() {
        let fake = FakeExecutor::new(vec![fixtures::sd_card(3, 32_000_000_000)]);
        let command = AdminCommand::new(
            CommandKind::CreatePartitionAndFormat {
                disk: 3,
                filesystem: media_types::Filesystem::Fat32,
                label: "CAM".to_string(),
                cluster: media_types::ClusterSize::Default,
                quick: true,
            },
            "",
        );

        assert!(matches!(
            fake.execute(&command).await,
            Err(FormatError::Command { .. })
        ));

        let init = AdminCommand::new(
            CommandKind::Initialize {
                disk: 3,
                style: TableStyle::Gpt,
            },
            "",
        );
        fake.execute(&init).await.unwrap();
        let disk = fake.disk(3).unwrap();
        assert!(disk.partitions.is_empty());
        assert_eq!(disk.partition_style, PartitionStyle::Gpt);

        assert!(fake.execute(&command).await.is_ok());
    }

    #[test]
    fn format_updates_the_model() {
        let mut state = FakeExecutor::new(vec![fixtures::sd_card(3, 32_000_000_000)])
            .state
            .into_inner()
            .unwrap();

        state.answer(&CommandKind::ClearMetadata { disk: 3 });
        assert!(state.disks[0].record.letters.is_empty());

        let letter = state.answer(&CommandKind::CreatePartitionAndFormat {
            disk: 3,
            filesystem: media_types::Filesystem::Fat32,
            label: "CAM".to_string(),
            cluster: media_types::ClusterSize::Default,
            quick: true,
        });
        assert_eq!(letter.trim(), "E");
        assert!(state.has_partitions(3));
        assert_eq!(
            state.answer(&CommandKind::InspectVolume {
                letter: "E".to_string()
            }),
            "FAT32|CAM"
        );
    }
}
