// SPDX-License-Identifier: GPL-3.0-only

use serde_json::Value;

use crate::{FormatError, Result};

const SAMPLE_CHARS: usize = 200;

/// Parse serialized command output into a sequence of rows.
///
/// Empty output and `null` yield no rows; a single object becomes a
/// one-element sequence.
pub fn decode_json_rows(command: &str, stdout: &str) -> Result<Vec<Value>> {
    let text = stdout.trim_matches(|c: char| c == '\u{feff}' || c.is_whitespace());
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let value: Value = serde_json::from_str(text).map_err(|error| FormatError::Decode {
        command: command.to_string(),
        reason: error.to_string(),
        sample: truncate_sample(text),
    })?;

    Ok(match value {
        Value::Null => Vec::new(),
        Value::Array(rows) => rows,
        other => vec![other],
    })
}

fn truncate_sample(text: &str) -> String {
    if text.chars().count() <= SAMPLE_CHARS {
        return text.to_string();
    }
    let head: String = text.chars().take(SAMPLE_CHARS).collect();
    format!("{head}...")
}
