// SPDX-License-Identifier: GPL-3.0-only

use std::sync::Mutex;

use async_trait::async_trait;
use media_contracts::{ConfirmationPrompt, Result};

/// Prompt that always answers with the same line and remembers what it saw.
pub struct FixedToken {
    answer: String,
    summaries: Mutex<Vec<String>>,
}

impl FixedToken {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            summaries: Mutex::new(Vec::new()),
        }
    }

    /// Summaries shown so far, oldest first.
    pub fn summaries(&self) -> Vec<String> {
        self.summaries
            .lock()
            .map(|summaries| summaries.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ConfirmationPrompt for FixedToken {
    async fn request_token(&self, summary: &str, _expected: &str) -> Result<String> {
        if let Ok(mut summaries) = self.summaries.lock() {
            summaries.push(summary.to_string());
        }
        Ok(self.answer.clone())
    }
}
