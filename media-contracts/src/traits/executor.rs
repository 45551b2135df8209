// SPDX-License-Identifier: GPL-3.0-only

use async_trait::async_trait;
use serde_json::Value;

use crate::protocol::{AdminCommand, CommandOutput, decode_json_rows};
use crate::Result;

/// Faithful transport for privileged administrative commands.
///
/// Implementations never retry and never interpret output. A non-zero exit
/// status must surface as `FormatError::Command` carrying the trimmed stderr.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, command: &AdminCommand) -> Result<CommandOutput>;

    /// Run the command through the JSON serializer and decode its rows.
    async fn execute_json(&self, command: &AdminCommand) -> Result<Vec<Value>> {
        let output = self.execute(&command.with_json_directive()).await?;
        tracing::trace!(command = command.name(), "decoding JSON output");
        decode_json_rows(command.name(), &output.stdout)
    }
}
