// SPDX-License-Identifier: GPL-3.0-only

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{Duration, SystemTime};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingLevel;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

const LOG_PREFIX: &str = "sd-formatter.log";
const KEEP_DAYS: u64 = 7;

/// Install stdout logging and, when enabled, a daily rolling log file.
///
/// `RUST_LOG` takes precedence over `level`. A log directory that cannot be
/// created only disables the file layer.
pub(crate) fn init(level: LoggingLevel, log_to_disk: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,{}", crate_directives(level))));

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_timer(tracing_subscriber::fmt::time::SystemTime);

    if !log_to_disk {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stdout_layer)
            .init();
        return;
    }

    match file_writer() {
        Ok((writer, guard)) => {
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false)
                .with_timer(tracing_subscriber::fmt::time::SystemTime);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(stdout_layer)
                .with(file_layer)
                .init();

            // Keep the background logging worker alive for the duration of the process.
            let _ = LOG_GUARD.set(guard);
        }
        Err(e) => {
            eprintln!("sd-formatter: failed to initialize file logging: {e:#}");
            tracing_subscriber::registry()
                .with(env_filter)
                .with(stdout_layer)
                .init();
        }
    }
}

fn crate_directives(level: LoggingLevel) -> String {
    let level = level.as_directive();
    ["sd_formatter", "media_pipeline", "media_sys", "media_contracts"]
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

fn file_writer() -> anyhow::Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    let dir = default_log_dir();
    let prefix = OsString::from(LOG_PREFIX);

    if let Err(e) = fs::create_dir_all(&dir) {
        return Err(anyhow::anyhow!(
            "create log directory failed: {} ({})",
            dir.display(),
            e
        ));
    }

    cleanup_old_logs(&dir, &prefix);

    let appender = tracing_appender::rolling::daily(&dir, &prefix);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    Ok((writer, guard))
}

pub(crate) fn default_log_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("SD_FORMATTER_LOG_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(local_appdata) = std::env::var_os("LOCALAPPDATA") {
        return PathBuf::from(local_appdata).join("SDFormatter").join("logs");
    }

    if let Some(xdg_state) = std::env::var_os("XDG_STATE_HOME") {
        return PathBuf::from(xdg_state).join("sd-formatter").join("logs");
    }

    if let Some(home) = std::env::var_os("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("state")
            .join("sd-formatter")
            .join("logs");
    }

    std::env::temp_dir().join("sd-formatter").join("logs")
}

fn cleanup_old_logs(dir: &Path, prefix: &OsString) {
    let cutoff = SystemTime::now().checked_sub(Duration::from_secs(KEEP_DAYS * 24 * 60 * 60));
    let Some(cutoff) = cutoff else { return };

    let prefix = prefix.to_string_lossy();

    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if !file_type.is_file() {
            continue;
        }

        let file_name = entry.file_name();
        // Only touch files created by our rolling appender.
        if !file_name.to_string_lossy().starts_with(prefix.as_ref()) {
            continue;
        }

        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        let Ok(modified) = metadata.modified() else {
            continue;
        };
        if modified >= cutoff {
            continue;
        }

        let _ = fs::remove_file(entry.path());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_cover_our_crates() {
        let directives = crate_directives(LoggingLevel::Debug);
        assert!(directives.contains("media_pipeline=debug"));
        assert!(directives.contains("sd_formatter=debug"));
    }

    #[test]
    fn cleanup_keeps_fresh_and_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("sd-formatter.log.2026-10-18"), "fresh").unwrap();
        fs::write(dir.path().join("other.log"), "not ours").unwrap();

        cleanup_old_logs(dir.path(), &OsString::from(LOG_PREFIX));

        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }
}
