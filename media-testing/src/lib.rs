// SPDX-License-Identifier: GPL-3.0-only

//! Test doubles for the formatting pipeline
//!
//! `FakeExecutor` keeps an in-memory model of the host's disks and answers
//! every `AdminCommand` by its kind, so pipelines can run end to end without
//! a privileged shell.

pub mod confirm;
pub mod executor;
pub mod fixtures;

pub use confirm::FixedToken;
pub use executor::FakeExecutor;
