// SPDX-License-Identifier: GPL-3.0-only

//! SD Formatter - guarded formatting of SD cards and USB disks
//!
//! Lists disks, resolves a format request from flags and config defaults,
//! confirms destructive intent and runs the formatting pipeline. The JSON
//! report goes to stdout and optionally to a file.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use media_contracts::CommandExecutor;
use media_pipeline::{Confirmation, FormattingPipeline};
use media_sys::{DiskCatalog, PowerShell};
use media_types::{
    ClusterRequest, FailureKind, FilesystemChoice, FormatRequest, PipelineResult, TableStyle,
    WipeMode,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

mod config;
mod confirm;
mod logging;
mod report;
mod table;

use config::{Config, LoggingLevel};
use confirm::TerminalPrompt;
use report::RunReport;

#[derive(Parser, Debug)]
#[command(
    name = "sd-formatter",
    version,
    about = "Format SD cards and USB disks. USE WITH CAUTION: this erases the selected disk."
)]
struct Args {
    /// List available disks
    #[arg(long)]
    list: bool,

    /// Show details for one disk
    #[arg(long, value_name = "DISK")]
    info: Option<u32>,

    /// Disk number to format
    #[arg(long)]
    disk: Option<u32>,

    /// Volume label
    #[arg(long)]
    label: Option<String>,

    /// AUTO, FAT32, EXFAT or NTFS
    #[arg(long = "fs", value_name = "FS")]
    filesystem: Option<FilesystemChoice>,

    /// Allocation unit: AUTO, DEFAULT or bytes
    #[arg(long, value_name = "CLUSTER")]
    cluster: Option<ClusterRequest>,

    /// Full format instead of quick
    #[arg(long)]
    full: bool,

    /// GPT partition table instead of MBR
    #[arg(long)]
    gpt: bool,

    /// Camera-friendly FAT32, 32 KiB clusters and label
    #[arg(long)]
    camera_compat: bool,

    /// none, metadata or zero-all
    #[arg(long, value_name = "MODE")]
    wipe: Option<WipeMode>,

    /// Write test after formatting
    #[arg(long)]
    test_io: bool,

    /// Write test size in MB
    #[arg(long, value_name = "MB")]
    test_io_size: Option<u32>,

    /// Skip filesystem/label verification
    #[arg(long)]
    skip_verify: bool,

    /// Also write the JSON report to this file
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,

    /// Log the plan without modifying the device
    #[arg(long)]
    dry_run: bool,

    /// Do not ask for confirmation
    #[arg(long, short = 'y')]
    yes: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn format_request(&self, disk: u32, config: &Config) -> FormatRequest {
        let mut request = FormatRequest::new(
            disk,
            self.label
                .clone()
                .unwrap_or_else(|| config.default_label.clone()),
        );
        request.filesystem = self.filesystem.unwrap_or(config.default_filesystem);
        request.cluster = self.cluster.unwrap_or_default();
        request.quick = config.quick && !self.full;
        request.wipe = self.wipe.unwrap_or(config.default_wipe);
        request.camera_compat = self.camera_compat;
        request.partition_style = if self.gpt {
            TableStyle::Gpt
        } else {
            config.partition_style
        };
        request.dry_run = self.dry_run;
        request.skip_verify = self.skip_verify;
        request.io_test_mb = self
            .test_io
            .then(|| self.test_io_size.unwrap_or(config.io_test_size_mb));
        request
    }
}

/// Process exit status for a finished run.
fn exit_status(result: &PipelineResult) -> u8 {
    match result.error_kind {
        None => 0,
        Some(FailureKind::ConfirmationMismatch | FailureKind::Cancelled) => 3,
        Some(kind) if kind.is_pre_mutation() => 2,
        Some(_) => 1,
    }
}

/// Wait for the progress printer; reports whether it ended cleanly.
async fn join_printer(printer: JoinHandle<()>) -> bool {
    match printer.await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Progress printer stopped: {e}");
            false
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let config = Config::load()?;

    let level = LoggingLevel::from_verbosity(args.verbose).unwrap_or(config.log_level);
    logging::init(level, config.log_to_disk);
    tracing::info!("Starting SD Formatter v{}", env!("CARGO_PKG_VERSION"));

    let executor: Arc<dyn CommandExecutor> =
        Arc::new(PowerShell::new().context("PowerShell is required")?);

    if args.list {
        let disks = DiskCatalog::new(executor.clone()).list_disks().await?;
        println!("{}", table::render_disks(&disks));
        return Ok(ExitCode::SUCCESS);
    }

    if let Some(number) = args.info {
        let disk = DiskCatalog::new(executor.clone()).find(number).await?;
        println!("{}", table::render_disk_info(&disk));
        return Ok(ExitCode::SUCCESS);
    }

    let Some(disk) = args.disk else {
        anyhow::bail!("Nothing to do: pass --list, --info <DISK> or --disk <DISK>");
    };
    let request = args.format_request(disk, &config);

    let confirmation = if args.yes {
        Confirmation::Auto
    } else {
        Confirmation::Prompt(Arc::new(TerminalPrompt))
    };
    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
    let pipeline = FormattingPipeline::new(executor, confirmation).with_progress(progress_tx);

    if !request.dry_run {
        pipeline.verify_privileges().await?;
    }

    let cancel = pipeline.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current step");
            cancel.cancel();
        }
    });

    let printer = tokio::spawn(async move {
        while let Some(event) = progress_rx.recv().await {
            eprintln!("[{:>3}%] {}", event.percent, event.message);
        }
    });

    let result = pipeline.spawn(request).await.context("Formatting task failed")?;
    join_printer(printer).await;

    let report = RunReport::new(&result);
    println!("{}", report.to_json()?);
    if let Some(path) = &args.report {
        report.write_to(path)?;
        tracing::info!("Report written to {}", path.display());
    }

    Ok(ExitCode::from(exit_status(&result)))
}
