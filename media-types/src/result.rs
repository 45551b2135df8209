// SPDX-License-Identifier: GPL-3.0-only

//! Terminal record of a formatting run
//!
//! `PipelineResult` is created when a run starts, filled in as states
//! complete and handed back exactly once, whether the run succeeded or not.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{DiskRecord, FormatRequest, ResolvedPolicy, TableStyle, WipeMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunStatus {
    Ok,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerifyStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "FAILED")]
    Failed,
    #[serde(rename = "skipped")]
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoTestReport {
    pub ok: bool,
    pub message: String,
    pub size_mb: u32,
}

/// Machine-readable classification of a failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotFound,
    UnsafeTarget,
    ReadOnly,
    TooSmall,
    PolicyViolation,
    ConfirmationMismatch,
    Command,
    Decode,
    NoFreeLetter,
    VerificationFailed,
    IoTestFailed,
    InsufficientPrivilege,
    Cancelled,
    Io,
}

impl FailureKind {
    /// Failures that are always raised before any device mutation.
    pub fn is_pre_mutation(self) -> bool {
        matches!(
            self,
            Self::NotFound
                | Self::UnsafeTarget
                | Self::ReadOnly
                | Self::TooSmall
                | Self::PolicyViolation
                | Self::ConfirmationMismatch
                | Self::InsufficientPrivilege
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    // === Target ===
    pub disk: u32,
    pub size_bytes: u64,
    pub bus_type: String,
    pub friendly_name: String,
    pub unique_id: Option<String>,

    // === Intent ===
    pub policy: Option<ResolvedPolicy>,
    pub partition_style: TableStyle,
    pub quick: bool,
    pub wipe: WipeMode,
    pub camera_compat: bool,
    pub dry_run: bool,

    // === Progress ===
    /// Completed step names in execution order
    pub steps: Vec<String>,
    /// Letter assigned by the partition step, empty before that
    pub drive_letter: String,
    pub verify: Option<VerifyStatus>,
    pub test_io: Option<IoTestReport>,
    /// Set once a destructive command has been issued against the device
    pub device_modified: bool,
    /// Mutating commands a dry run would have issued, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub planned_commands: Vec<String>,

    // === Outcome ===
    pub status: RunStatus,
    pub error: Option<String>,
    pub error_kind: Option<FailureKind>,
    pub duration_seconds: f64,
}

impl PipelineResult {
    /// Placeholder record for a run that has not resolved its target yet.
    pub fn pending(request: &FormatRequest) -> Self {
        Self {
            disk: request.disk,
            size_bytes: 0,
            bus_type: String::new(),
            friendly_name: String::new(),
            unique_id: None,
            policy: None,
            partition_style: request.partition_style,
            quick: request.quick,
            wipe: request.wipe,
            camera_compat: request.camera_compat,
            dry_run: request.dry_run,
            steps: Vec::new(),
            drive_letter: String::new(),
            verify: None,
            test_io: None,
            device_modified: false,
            planned_commands: Vec::new(),
            status: RunStatus::Ok,
            error: None,
            error_kind: None,
            duration_seconds: 0.0,
        }
    }

    pub fn record_disk(&mut self, disk: &DiskRecord) {
        self.disk = disk.number;
        self.size_bytes = disk.size_bytes;
        self.bus_type = disk.bus_type.clone();
        self.friendly_name = disk.friendly_name.clone();
        self.unique_id = disk.unique_id.clone();
    }

    /// Append a completed step. Returns false if the step was already recorded.
    pub fn record_step(&mut self, step: &str) -> bool {
        if self.steps.iter().any(|existing| existing == step) {
            return false;
        }
        self.steps.push(step.to_string());
        true
    }

    pub fn fail(&mut self, kind: FailureKind, message: impl Into<String>) {
        let mut message = message.into();
        if message.trim().is_empty() {
            message = format!("{kind:?}");
        }
        self.status = RunStatus::Error;
        self.error = Some(message);
        self.error_kind = Some(kind);
    }

    pub fn finish(&mut self, elapsed: Duration) {
        self.duration_seconds = (elapsed.as_secs_f64() * 100.0).round() / 100.0;
    }

    pub fn is_ok(&self) -> bool {
        self.status == RunStatus::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_are_append_only_and_unique() {
        let mut result = PipelineResult::pending(&FormatRequest::new(1, "X"));
        assert!(result.record_step("dismount_volumes"));
        assert!(result.record_step("clear_and_init"));
        assert!(!result.record_step("dismount_volumes"));
        assert_eq!(result.steps, vec!["dismount_volumes", "clear_and_init"]);
    }

    #[test]
    fn fail_sets_error_and_status_together() {
        let mut result = PipelineResult::pending(&FormatRequest::new(1, "X"));
        assert!(result.is_ok());
        assert!(result.error.is_none());

        result.fail(FailureKind::Command, "  ");
        assert_eq!(result.status, RunStatus::Error);
        assert!(!result.error.as_deref().unwrap_or_default().trim().is_empty());
        assert_eq!(result.error_kind, Some(FailureKind::Command));
    }

    #[test]
    fn duration_is_rounded_to_hundredths() {
        let mut result = PipelineResult::pending(&FormatRequest::new(1, "X"));
        result.finish(Duration::from_millis(1234));
        assert_eq!(result.duration_seconds, 1.23);
    }

    #[test]
    fn result_serializes_status_and_verify_names() {
        let mut result = PipelineResult::pending(&FormatRequest::new(2, "X"));
        result.verify = Some(VerifyStatus::Skipped);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "OK");
        assert_eq!(json["verify"], "skipped");
        assert!(json.get("planned_commands").is_none());
    }

    #[test]
    fn pre_mutation_kinds() {
        assert!(FailureKind::PolicyViolation.is_pre_mutation());
        assert!(FailureKind::ConfirmationMismatch.is_pre_mutation());
        assert!(!FailureKind::Command.is_pre_mutation());
        assert!(!FailureKind::VerificationFailed.is_pre_mutation());
    }
}
