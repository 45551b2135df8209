// SPDX-License-Identifier: GPL-3.0-only

//! Formatting core
//!
//! Everything that decides whether and how a device gets formatted lives
//! here. `safety` and `policy` are pure functions; `pipeline` sequences the
//! administrative commands and produces the `PipelineResult`.

pub mod pipeline;
pub mod policy;
pub mod safety;
pub mod summary;

pub use pipeline::{Confirmation, FormattingPipeline, PipelineState, VolumeRoot};
pub use policy::{
    DEFAULT_LABEL, resolve_policy, sanitize_label, suggest_cluster_bytes, suggest_filesystem,
};
pub use safety::ensure_safe_target;
pub use summary::destructive_summary;
