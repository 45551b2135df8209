// SPDX-License-Identifier: GPL-3.0-only

pub mod command;
pub mod json;

pub use command::{AdminCommand, CommandKind, CommandOutput};
pub use json::decode_json_rows;
