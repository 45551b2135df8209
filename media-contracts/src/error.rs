// SPDX-License-Identifier: GPL-3.0-only

use media_types::FailureKind;
use thiserror::Error;

/// Every way a formatting run can fail
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Disk #{0} not found")]
    NotFound(u32),

    #[error("Safety lock: disk #{disk} appears to be a system/boot disk")]
    UnsafeTarget { disk: u32 },

    #[error("Disk #{disk} changed since it was selected ({reason}). Refusing to continue")]
    TargetChanged { disk: u32, reason: String },

    #[error("Disk #{disk} is read-only. Disable write protection and try again")]
    ReadOnly { disk: u32 },

    #[error("Disk #{disk} is too small to format ({size_bytes} bytes, minimum {minimum_bytes})")]
    TooSmall {
        disk: u32,
        size_bytes: u64,
        minimum_bytes: u64,
    },

    #[error("Policy violation: {0}")]
    PolicyViolation(String),

    #[error("Confirmation mismatch (expected {expected}). Operation cancelled")]
    ConfirmationMismatch { expected: String },

    #[error("{command} failed: {stderr}")]
    Command {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Could not decode {command} output ({reason}): {sample}")]
    Decode {
        command: String,
        reason: String,
        sample: String,
    },

    #[error("No free drive letters available")]
    NoFreeLetter,

    #[error("Post-format verification failed: {0}")]
    VerificationFailed(String),

    #[error("I/O test failed: {0}")]
    IoTestFailed(String),

    #[error("Insufficient privileges: {0}")]
    InsufficientPrivilege(String),

    #[error("Operation cancelled before {0}")]
    Cancelled(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FormatError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NotFound(_) => FailureKind::NotFound,
            Self::UnsafeTarget { .. } | Self::TargetChanged { .. } => FailureKind::UnsafeTarget,
            Self::ReadOnly { .. } => FailureKind::ReadOnly,
            Self::TooSmall { .. } => FailureKind::TooSmall,
            Self::PolicyViolation(_) => FailureKind::PolicyViolation,
            Self::ConfirmationMismatch { .. } => FailureKind::ConfirmationMismatch,
            Self::Command { .. } => FailureKind::Command,
            Self::Decode { .. } => FailureKind::Decode,
            Self::NoFreeLetter => FailureKind::NoFreeLetter,
            Self::VerificationFailed(_) => FailureKind::VerificationFailed,
            Self::IoTestFailed(_) => FailureKind::IoTestFailed,
            Self::InsufficientPrivilege(_) => FailureKind::InsufficientPrivilege,
            Self::Cancelled(_) => FailureKind::Cancelled,
            Self::Io(_) => FailureKind::Io,
        }
    }
}

/// Result type alias for formatter operations
pub type Result<T> = std::result::Result<T, FormatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_error_message_carries_stderr() {
        let error = FormatError::Command {
            command: "clear_metadata".to_string(),
            exit_code: Some(1),
            stderr: "Access denied".to_string(),
        };
        assert_eq!(error.to_string(), "clear_metadata failed: Access denied");
        assert_eq!(error.kind(), FailureKind::Command);
    }

    #[test]
    fn io_errors_convert() {
        let error: FormatError = std::io::Error::other("disk full").into();
        assert_eq!(error.kind(), FailureKind::Io);
    }
}
