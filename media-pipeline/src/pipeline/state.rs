// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;

use media_types::{FormatRequest, WipeMode};

/// Pipeline states in execution order.
///
/// A state either runs or is skipped; the order never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    Resolve,
    Confirm,
    Dismount,
    Wipe,
    Initialize,
    PartitionAndFormat,
    Verify,
    IoTest,
    Done,
}

impl PipelineState {
    pub const ALL: [PipelineState; 9] = [
        PipelineState::Resolve,
        PipelineState::Confirm,
        PipelineState::Dismount,
        PipelineState::Wipe,
        PipelineState::Initialize,
        PipelineState::PartitionAndFormat,
        PipelineState::Verify,
        PipelineState::IoTest,
        PipelineState::Done,
    ];

    /// Transition table.
    pub fn next(self) -> Option<PipelineState> {
        match self {
            PipelineState::Resolve => Some(PipelineState::Confirm),
            PipelineState::Confirm => Some(PipelineState::Dismount),
            PipelineState::Dismount => Some(PipelineState::Wipe),
            PipelineState::Wipe => Some(PipelineState::Initialize),
            PipelineState::Initialize => Some(PipelineState::PartitionAndFormat),
            PipelineState::PartitionAndFormat => Some(PipelineState::Verify),
            PipelineState::Verify => Some(PipelineState::IoTest),
            PipelineState::IoTest => Some(PipelineState::Done),
            PipelineState::Done => None,
        }
    }

    /// Whether this state runs for `request` or is skipped.
    pub fn applies(self, request: &FormatRequest) -> bool {
        match self {
            PipelineState::Wipe => request.wipe != WipeMode::None,
            PipelineState::Verify => !request.skip_verify,
            PipelineState::IoTest => request.io_test_mb.is_some_and(|mb| mb > 0),
            _ => true,
        }
    }

    pub fn phase(self) -> &'static str {
        match self {
            PipelineState::Resolve => "resolve",
            PipelineState::Confirm => "confirm",
            PipelineState::Dismount => "dismount",
            PipelineState::Wipe => "wipe",
            PipelineState::Initialize => "initialize",
            PipelineState::PartitionAndFormat => "partition_and_format",
            PipelineState::Verify => "verify",
            PipelineState::IoTest => "io_test",
            PipelineState::Done => "done",
        }
    }

    /// Progress reported when the state is entered.
    pub fn percent(self) -> u8 {
        match self {
            PipelineState::Resolve => 0,
            PipelineState::Confirm => 5,
            PipelineState::Dismount => 10,
            PipelineState::Wipe => 20,
            PipelineState::Initialize => 35,
            PipelineState::PartitionAndFormat => 45,
            PipelineState::Verify => 75,
            PipelineState::IoTest => 85,
            PipelineState::Done => 100,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            PipelineState::Resolve => "Resolving target disk and policy",
            PipelineState::Confirm => "Waiting for confirmation",
            PipelineState::Dismount => "Dismounting volumes",
            PipelineState::Wipe => "Wiping disk",
            PipelineState::Initialize => "Initializing partition table",
            PipelineState::PartitionAndFormat => "Creating partition and formatting",
            PipelineState::Verify => "Verifying filesystem and label",
            PipelineState::IoTest => "Running I/O test",
            PipelineState::Done => "Completed",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.phase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_table_follows_declared_order() {
        let mut walked = vec![PipelineState::Resolve];
        while let Some(next) = walked.last().and_then(|state| state.next()) {
            walked.push(next);
        }
        assert_eq!(walked, PipelineState::ALL);
    }

    #[test]
    fn percent_is_monotone() {
        let percents: Vec<u8> = PipelineState::ALL.iter().map(|s| s.percent()).collect();
        assert!(percents.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(percents.last(), Some(&100));
    }

    #[test]
    fn optional_states_follow_request() {
        let mut request = FormatRequest::new(3, "X");
        assert!(PipelineState::Wipe.applies(&request));
        assert!(PipelineState::Verify.applies(&request));
        assert!(!PipelineState::IoTest.applies(&request));

        request.wipe = WipeMode::None;
        request.skip_verify = true;
        request.io_test_mb = Some(8);
        assert!(!PipelineState::Wipe.applies(&request));
        assert!(PipelineState::Initialize.applies(&request));
        assert!(!PipelineState::Verify.applies(&request));
        assert!(PipelineState::IoTest.applies(&request));
    }
}
