// SPDX-License-Identifier: GPL-3.0-only

pub mod error;
pub mod protocol;
pub mod traits;

pub use error::{FormatError, Result};
pub use protocol::{AdminCommand, CommandKind, CommandOutput, decode_json_rows};
pub use traits::{CommandExecutor, ConfirmationPrompt};
