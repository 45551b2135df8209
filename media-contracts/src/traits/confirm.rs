// SPDX-License-Identifier: GPL-3.0-only

use async_trait::async_trait;

use crate::Result;

/// Confirmation boundary between the pipeline and whoever operates it.
///
/// The pipeline shows `summary`, asks for a single line and compares the
/// answer against `expected` itself; implementations only relay the text.
#[async_trait]
pub trait ConfirmationPrompt: Send + Sync {
    async fn request_token(&self, summary: &str, expected: &str) -> Result<String>;
}
