// SPDX-License-Identifier: GPL-3.0-only

//! Low-level system operations for media formatting
//!
//! This crate talks to the host's administrative tooling:
//! - PowerShell transport implementing `CommandExecutor`
//! - Script builders for every query and device mutation
//! - Disk enumeration and normalization into `DiskRecord`s
//! - The elevation precondition
//!
//! Device mutations require elevated privileges; callers verify that with
//! `privilege::ensure_elevated` before running a destructive pipeline.

pub mod catalog;
pub mod powershell;
pub mod privilege;
pub mod scripts;

pub use catalog::DiskCatalog;
pub use powershell::PowerShell;
pub use privilege::{ensure_elevated, is_elevated};
