// SPDX-License-Identifier: GPL-3.0-only

pub mod confirm;
pub mod executor;

pub use confirm::ConfirmationPrompt;
pub use executor::CommandExecutor;
