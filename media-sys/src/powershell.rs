// SPDX-License-Identifier: GPL-3.0-only

//! PowerShell transport
//!
//! Runs each `AdminCommand` as a single `powershell -Command` invocation and
//! captures its output. No retries, no interpretation.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use media_contracts::{AdminCommand, CommandExecutor, CommandOutput, FormatError, Result};
use tokio::process::Command;
use tracing::{debug, info};
use which::which;

const BASE_ARGS: [&str; 5] = [
    "-NoProfile",
    "-NonInteractive",
    "-ExecutionPolicy",
    "Bypass",
    "-Command",
];

/// PowerShell CLI wrapper
pub struct PowerShell {
    binary_path: PathBuf,
}

impl PowerShell {
    /// Locate PowerShell in PATH
    ///
    /// Prefers Windows PowerShell (`powershell`) and falls back to `pwsh`.
    pub fn new() -> Result<Self> {
        let binary_path = Self::find_binary()?;
        info!("Found PowerShell at {:?}", binary_path);
        Ok(Self { binary_path })
    }

    pub fn with_binary(binary_path: impl Into<PathBuf>) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    pub fn find_binary() -> Result<PathBuf> {
        which("powershell")
            .or_else(|_| which("pwsh"))
            .map_err(|_| FormatError::Command {
                command: "powershell".to_string(),
                exit_code: None,
                stderr: "PowerShell not found in PATH".to_string(),
            })
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }
}

#[async_trait]
impl CommandExecutor for PowerShell {
    async fn execute(&self, command: &AdminCommand) -> Result<CommandOutput> {
        debug!(command = command.name(), "[PS] {}", command.script.trim());

        let output = Command::new(&self.binary_path)
            .args(BASE_ARGS)
            .arg(&command.script)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| FormatError::Command {
                command: command.name().to_string(),
                exit_code: None,
                stderr: format!("Failed to execute PowerShell: {e}"),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let exit_code = output.status.code().unwrap_or(-1);

        if !output.status.success() {
            let trimmed = stderr.trim();
            debug!(command = command.name(), "[PS:stderr] {trimmed}");
            return Err(FormatError::Command {
                command: command.name().to_string(),
                exit_code: output.status.code(),
                stderr: failure_message(trimmed, exit_code),
            });
        }

        if !stdout.trim().is_empty() {
            debug!(command = command.name(), "[PS:stdout] {}", stdout.trim());
        }

        Ok(CommandOutput {
            exit_code,
            stdout,
            stderr,
        })
    }
}

fn failure_message(stderr: &str, exit_code: i32) -> String {
    if stderr.is_empty() {
        format!("PowerShell exited with status {exit_code}")
    } else {
        stderr.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use media_contracts::CommandKind;

    #[test]
    fn empty_stderr_gets_generic_message() {
        assert_eq!(failure_message("", 1), "PowerShell exited with status 1");
        assert_eq!(failure_message("Access denied", 1), "Access denied");
    }

    #[tokio::test]
    async fn missing_binary_is_a_command_error() {
        let shell = PowerShell::with_binary("/nonexistent/powershell-binary");
        let command = AdminCommand::new(CommandKind::ListDisks, "Get-Disk");
        match shell.execute(&command).await {
            Err(FormatError::Command {
                command, exit_code, ..
            }) => {
                assert_eq!(command, "list_disks");
                assert_eq!(exit_code, None);
            }
            other => panic!("expected command error, got {other:?}"),
        }
    }
}
