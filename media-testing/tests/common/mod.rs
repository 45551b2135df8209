// SPDX-License-Identifier: GPL-3.0-only

#![allow(dead_code)]

use std::sync::Arc;

use media_pipeline::{Confirmation, FormattingPipeline};
use media_sys::DiskCatalog;
use media_testing::{FakeExecutor, FixedToken, fixtures};

pub fn host() -> Arc<FakeExecutor> {
    Arc::new(FakeExecutor::new(fixtures::host()))
}

pub fn auto_confirmed(fake: &Arc<FakeExecutor>) -> FormattingPipeline {
    FormattingPipeline::new(fake.clone(), Confirmation::Auto)
}

pub fn prompted(fake: &Arc<FakeExecutor>, prompt: &Arc<FixedToken>) -> FormattingPipeline {
    FormattingPipeline::new(fake.clone(), Confirmation::Prompt(prompt.clone()))
}

/// Mounted letters of `disk` as the catalog currently reports them.
pub async fn letters_of(fake: &Arc<FakeExecutor>, disk: u32) -> Vec<String> {
    DiskCatalog::new(fake.clone())
        .find(disk)
        .await
        .map(|disk| disk.letters)
        .unwrap_or_default()
}
