// SPDX-License-Identifier: GPL-3.0-only

//! PowerShell script builders
//!
//! Every query and device mutation the formatter issues is built here. Query
//! scripts are single pipelines so `execute_json` can wrap them; mutation
//! scripts stop on the first cmdlet error so failures surface as a non-zero
//! exit status.

use media_contracts::{AdminCommand, CommandKind, CommandOutput};
use media_types::{ClusterSize, Filesystem, TableStyle};

/// Thrown by the letter fallback when D..Z are all taken.
pub const NO_FREE_LETTER_MARKER: &str = "No free drive letters available";

const STOP_ON_ERROR: &str = "$ErrorActionPreference = 'Stop'";

/// Quote `value` as a PowerShell single-quoted literal.
///
/// Single-quoted strings expand nothing; an embedded quote is doubled.
pub fn ps_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

// === Read-only queries ===

pub fn list_disks() -> AdminCommand {
    AdminCommand::new(
        CommandKind::ListDisks,
        "Get-Disk | Select-Object Number, UniqueId, FriendlyName, Size, BusType, \
         IsSystem, IsBoot, IsReadOnly, IsOffline, PartitionStyle",
    )
}

pub fn list_partitions(disk: u32) -> AdminCommand {
    AdminCommand::new(
        CommandKind::ListPartitions { disk },
        format!(
            "Get-Partition -DiskNumber {disk} -ErrorAction SilentlyContinue | \
             Select-Object PartitionNumber, DriveLetter, Size, Type"
        ),
    )
}

pub fn list_volume_letters(disk: u32) -> AdminCommand {
    AdminCommand::new(
        CommandKind::ListVolumeLetters { disk },
        format!(
            "Get-Partition -DiskNumber {disk} -ErrorAction SilentlyContinue | \
             Get-Volume -ErrorAction SilentlyContinue | \
             Where-Object {{ $_.DriveLetter }} | Select-Object DriveLetter"
        ),
    )
}

/// Prints `FS|LABEL` for the volume behind `letter`.
pub fn inspect_volume(letter: char) -> AdminCommand {
    let letter = letter.to_ascii_uppercase();
    AdminCommand::new(
        CommandKind::InspectVolume {
            letter: letter.to_string(),
        },
        format!(
            "$v = Get-Volume -DriveLetter {letter} -ErrorAction Stop\n\
             Write-Output (\"{{0}}|{{1}}\" -f $v.FileSystem, $v.FileSystemLabel)"
        ),
    )
}

pub fn check_elevation() -> AdminCommand {
    AdminCommand::new(
        CommandKind::CheckElevation,
        "([Security.Principal.WindowsPrincipal][Security.Principal.WindowsIdentity]::GetCurrent())\
         .IsInRole([Security.Principal.WindowsBuiltInRole]::Administrator)",
    )
}

// === Device mutations ===

/// Dismount every lettered volume on `disk`. Individual failures are ignored.
pub fn dismount_volumes(disk: u32) -> AdminCommand {
    AdminCommand::new(
        CommandKind::DismountVolumes { disk },
        format!(
            "Get-Partition -DiskNumber {disk} -ErrorAction SilentlyContinue | \
             Where-Object {{ $_.DriveLetter }} | ForEach-Object {{\n\
             \x20   try {{ Dismount-Volume -DriveLetter $_.DriveLetter -Force -ErrorAction Stop }} catch {{ }}\n\
             }}"
        ),
    )
}

/// Overwrite every sector of `disk` through diskpart `clean all`.
pub fn zero_fill(disk: u32) -> AdminCommand {
    AdminCommand::new(
        CommandKind::ZeroFill { disk },
        format!(
            "{STOP_ON_ERROR}\n\
             $script = Join-Path $env:TEMP (\"sdfmt_clean_{{0}}.txt\" -f [guid]::NewGuid())\n\
             Set-Content -Path $script -Encoding ASCII -Value @('select disk {disk}', 'clean all')\n\
             try {{\n\
             \x20   $out = & diskpart /s $script 2>&1\n\
             \x20   if ($LASTEXITCODE -ne 0) {{ throw (\"diskpart failed: {{0}}\" -f ($out -join ' ')) }}\n\
             }} finally {{\n\
             \x20   Remove-Item -Path $script -Force -ErrorAction SilentlyContinue\n\
             }}"
        ),
    )
}

/// Bring the disk online and writable, then remove its partition metadata.
pub fn clear_metadata(disk: u32) -> AdminCommand {
    AdminCommand::new(
        CommandKind::ClearMetadata { disk },
        format!(
            "{STOP_ON_ERROR}\n\
             $d = Get-Disk -Number {disk}\n\
             if ($d.IsReadOnly) {{ Set-Disk -Number {disk} -IsReadOnly $false }}\n\
             if ($d.IsOffline) {{ Set-Disk -Number {disk} -IsOffline $false }}\n\
             if ($d.PartitionStyle -ne 'RAW') {{ Clear-Disk -Number {disk} -RemoveData -RemoveOEM -Confirm:$false }}"
        ),
    )
}

/// Write a fresh, empty partition table.
///
/// Any table still on the disk is cleared first, so the new table never
/// inherits partitions.
pub fn initialize(disk: u32, style: TableStyle) -> AdminCommand {
    let style_name = style.as_str();
    AdminCommand::new(
        CommandKind::Initialize { disk, style },
        format!(
            "{STOP_ON_ERROR}\n\
             $d = Get-Disk -Number {disk}\n\
             if ($d.IsOffline) {{ Set-Disk -Number {disk} -IsOffline $false }}\n\
             if ($d.IsReadOnly) {{ Set-Disk -Number {disk} -IsReadOnly $false }}\n\
             if ($d.PartitionStyle -ne 'RAW') {{ Clear-Disk -Number {disk} -RemoveData -RemoveOEM -Confirm:$false }}\n\
             Initialize-Disk -Number {disk} -PartitionStyle {style_name}"
        ),
    )
}

/// Create one partition spanning the disk, assign a letter and format it.
///
/// The assigned letter is printed as the last output line.
pub fn create_partition_and_format(
    disk: u32,
    filesystem: Filesystem,
    label: &str,
    cluster: ClusterSize,
    quick: bool,
) -> AdminCommand {
    let mut format_args = format!(
        "-FileSystem {} -NewFileSystemLabel {} -Confirm:$false -Force",
        filesystem.as_str(),
        ps_quote(label)
    );
    if let Some(bytes) = cluster.bytes() {
        format_args.push_str(&format!(" -AllocationUnitSize {bytes}"));
    }
    if !quick {
        format_args.push_str(" -Full");
    }

    AdminCommand::new(
        CommandKind::CreatePartitionAndFormat {
            disk,
            filesystem,
            label: label.to_string(),
            cluster,
            quick,
        },
        format!(
            "{STOP_ON_ERROR}\n\
             function Get-FreeLetter {{\n\
             \x20   $used = (Get-Volume | Where-Object {{ $_.DriveLetter }}).DriveLetter\n\
             \x20   foreach ($c in [char[]](68..90)) {{ if ($used -notcontains $c) {{ return $c }} }}\n\
             \x20   throw '{NO_FREE_LETTER_MARKER}'\n\
             }}\n\
             $p = New-Partition -DiskNumber {disk} -UseMaximumSize -AssignDriveLetter\n\
             $letter = $p.DriveLetter\n\
             if (-not $letter -or $letter -eq [char]0) {{\n\
             \x20   $letter = Get-FreeLetter\n\
             \x20   Set-Partition -DiskNumber {disk} -PartitionNumber $p.PartitionNumber -NewDriveLetter $letter\n\
             }}\n\
             Format-Volume -DriveLetter $letter {format_args} | Out-Null\n\
             Write-Output $letter"
        ),
    )
}

// === Output parsing ===

/// Drive letter printed on the last line of `create_partition_and_format`.
pub fn parse_drive_letter(output: &CommandOutput) -> Option<String> {
    let line = output.last_line()?.trim_end_matches([':', '\\']);
    let mut chars = line.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => Some(c.to_ascii_uppercase().to_string()),
        _ => None,
    }
}

/// Filesystem and label printed by `inspect_volume`.
pub fn parse_volume_inspection(output: &CommandOutput) -> Option<(String, String)> {
    let line = output.last_line()?;
    let (filesystem, label) = line.split_once('|')?;
    Some((filesystem.trim().to_string(), label.trim().to_string()))
}
