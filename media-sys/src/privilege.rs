// SPDX-License-Identifier: GPL-3.0-only

//! Elevation precondition
//!
//! Every device mutation needs administrator rights. The check is a
//! read-only query and is safe to run in dry-run mode.

use media_contracts::{CommandExecutor, FormatError, Result};
use tracing::debug;

use crate::scripts;

/// Whether the current process runs with administrator rights.
pub async fn is_elevated(executor: &dyn CommandExecutor) -> Result<bool> {
    let output = executor.execute(&scripts::check_elevation()).await?;
    let elevated = output
        .last_line()
        .is_some_and(|line| line.eq_ignore_ascii_case("true"));
    debug!(elevated, "Checked elevation");
    Ok(elevated)
}

pub async fn ensure_elevated(executor: &dyn CommandExecutor) -> Result<()> {
    if is_elevated(executor).await? {
        Ok(())
    } else {
        Err(FormatError::InsufficientPrivilege(
            "Administrator rights are required to format removable media".to_string(),
        ))
    }
}
