// SPDX-License-Identifier: GPL-3.0-only

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use media_types::PipelineResult;
use serde::Serialize;
use uuid::Uuid;

pub const APP_NAME: &str = "SD Formatter";

/// JSON report written after every run.
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub app: &'static str,
    pub version: &'static str,
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub result: &'a PipelineResult,
}

impl<'a> RunReport<'a> {
    pub fn new(result: &'a PipelineResult) -> Self {
        Self {
            app: APP_NAME,
            version: env!("CARGO_PKG_VERSION"),
            run_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            result,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize report")
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, self.to_json()?)
            .with_context(|| format!("Failed to write report {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use media_types::{FailureKind, FormatRequest};

    use super::*;

    #[test]
    fn envelope_is_flattened_into_the_result() {
        let mut result = PipelineResult::pending(&FormatRequest::new(3, "X"));
        result.fail(FailureKind::NotFound, "Disk #3 not found");

        let report = RunReport::new(&result);
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(json["app"], APP_NAME);
        assert_eq!(json["disk"], 3);
        assert_eq!(json["status"], "ERROR");
        assert_eq!(json["error_kind"], "not_found");
        assert!(json["run_id"].as_str().is_some());
    }

    #[test]
    fn writes_report_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("run.json");
        let result = PipelineResult::pending(&FormatRequest::new(1, "X"));

        RunReport::new(&result).write_to(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"version\""));
    }
}
