// SPDX-License-Identifier: GPL-3.0-only

use std::io::{self, BufRead, Write};

use async_trait::async_trait;
use media_contracts::{ConfirmationPrompt, FormatError, Result};

/// Reads the confirmation token from the terminal.
pub struct TerminalPrompt;

#[async_trait]
impl ConfirmationPrompt for TerminalPrompt {
    async fn request_token(&self, summary: &str, expected: &str) -> Result<String> {
        let summary = summary.to_string();
        let expected = expected.to_string();

        tokio::task::spawn_blocking(move || -> Result<String> {
            let mut stdout = io::stdout().lock();
            writeln!(stdout)?;
            writeln!(stdout, "{summary}")?;
            write!(stdout, "Type {expected} to proceed: ")?;
            stdout.flush()?;
            drop(stdout);

            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            Ok(line.trim().to_string())
        })
        .await
        .map_err(|e| FormatError::Io(io::Error::other(e)))?
    }
}
