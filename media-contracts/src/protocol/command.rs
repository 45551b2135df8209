// SPDX-License-Identifier: GPL-3.0-only

//! Administrative commands as tagged values
//!
//! The script text is what the OS utility runs; the kind says what the
//! command does. Dry runs branch on `is_mutating` and test executors answer
//! by kind without parsing script text.

use std::fmt;

use media_types::{ClusterSize, Filesystem, TableStyle};

/// Serialization directive appended by `CommandExecutor::execute_json`.
pub const JSON_DIRECTIVE: &str = "ConvertTo-Json -Depth 6 -Compress";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    // === Read-only queries ===
    ListDisks,
    ListPartitions {
        disk: u32,
    },
    ListVolumeLetters {
        disk: u32,
    },
    InspectVolume {
        letter: String,
    },
    CheckElevation,

    // === Device mutations ===
    DismountVolumes {
        disk: u32,
    },
    ZeroFill {
        disk: u32,
    },
    ClearMetadata {
        disk: u32,
    },
    Initialize {
        disk: u32,
        style: TableStyle,
    },
    CreatePartitionAndFormat {
        disk: u32,
        filesystem: Filesystem,
        label: String,
        cluster: ClusterSize,
        quick: bool,
    },
}

impl CommandKind {
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Self::DismountVolumes { .. }
                | Self::ZeroFill { .. }
                | Self::ClearMetadata { .. }
                | Self::Initialize { .. }
                | Self::CreatePartitionAndFormat { .. }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ListDisks => "list_disks",
            Self::ListPartitions { .. } => "list_partitions",
            Self::ListVolumeLetters { .. } => "list_volume_letters",
            Self::InspectVolume { .. } => "inspect_volume",
            Self::CheckElevation => "check_elevation",
            Self::DismountVolumes { .. } => "dismount_volumes",
            Self::ZeroFill { .. } => "zero_fill",
            Self::ClearMetadata { .. } => "clear_metadata",
            Self::Initialize { .. } => "initialize_disk",
            Self::CreatePartitionAndFormat { .. } => "create_partition_and_format",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCommand {
    pub kind: CommandKind,
    pub script: String,
}

impl AdminCommand {
    pub fn new(kind: CommandKind, script: impl Into<String>) -> Self {
        Self {
            kind,
            script: script.into(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn is_mutating(&self) -> bool {
        self.kind.is_mutating()
    }

    /// Same command with its output piped through the JSON serializer.
    pub fn with_json_directive(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            script: format!("({}) | {JSON_DIRECTIVE}", self.script.trim()),
        }
    }
}

impl fmt::Display for AdminCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.name(), self.script.trim())
    }
}

/// Captured process result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Last non-empty stdout line, trimmed.
    pub fn last_line(&self) -> Option<&str> {
        self.stdout
            .lines()
            .map(str::trim)
            .rfind(|line| !line.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutating_kinds_are_flagged() {
        assert!(!CommandKind::ListDisks.is_mutating());
        assert!(!CommandKind::InspectVolume { letter: "E".into() }.is_mutating());
        assert!(CommandKind::ClearMetadata { disk: 3 }.is_mutating());
        assert!(
            CommandKind::Initialize {
                disk: 3,
                style: TableStyle::Gpt
            }
            .is_mutating()
        );
    }

    #[test]
    fn json_directive_wraps_script() {
        let command = AdminCommand::new(CommandKind::ListDisks, "Get-Disk\n");
        let wrapped = command.with_json_directive();
        assert_eq!(
            wrapped.script,
            "(Get-Disk) | ConvertTo-Json -Depth 6 -Compress"
        );
        assert_eq!(wrapped.kind, CommandKind::ListDisks);
    }

    #[test]
    fn last_line_skips_trailing_blank_lines() {
        let output = CommandOutput::success("Formatting...\r\nE\r\n\r\n");
        assert_eq!(output.last_line(), Some("E"));
        assert_eq!(CommandOutput::success("").last_line(), None);
    }
}
