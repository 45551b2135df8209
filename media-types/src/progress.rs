// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};

/// One-way status notification emitted after each pipeline state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Machine-readable state name (e.g., "wipe")
    pub phase: String,
    /// Human-readable status line
    pub message: String,
    /// Position in the run, 0-100, never decreasing within a run
    pub percent: u8,
}

impl ProgressEvent {
    pub fn new(phase: impl Into<String>, message: impl Into<String>, percent: u8) -> Self {
        Self {
            phase: phase.into(),
            message: message.into(),
            percent: percent.min(100),
        }
    }
}
