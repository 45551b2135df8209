// SPDX-License-Identifier: GPL-3.0-only

//! Formatting state machine
//!
//! `FormattingPipeline::run` walks `PipelineState` in order and always hands
//! back a `PipelineResult`. The first error aborts the remaining states and is
//! recorded in the result together with whatever completed before it.
//!
//! In dry-run mode read-only queries still execute, mutating commands are only
//! logged and listed in `planned_commands`, the assigned letter is simulated
//! and verification is derived from the policy.

mod state;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use media_contracts::{
    AdminCommand, CommandExecutor, CommandKind, CommandOutput, ConfirmationPrompt, FormatError,
    Result,
};
use media_sys::{DiskCatalog, ensure_elevated, scripts};
use media_types::{
    DiskRecord, FormatRequest, IoTestReport, PipelineResult, ProgressEvent, ResolvedPolicy,
    VerifyStatus, WipeMode,
};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub use state::PipelineState;

use crate::policy::resolve_policy;
use crate::safety::ensure_safe_target;
use crate::summary::destructive_summary;

/// Letter reported by dry runs in place of a real assignment.
pub const DRY_RUN_LETTER: &str = "Z";

const OUTPUT_SAMPLE_CHARS: usize = 200;

/// Maps an assigned drive letter to the root directory of its volume.
pub type VolumeRoot = Arc<dyn Fn(&str) -> PathBuf + Send + Sync>;

/// How destructive intent is confirmed before the first mutation.
#[derive(Clone)]
pub enum Confirmation {
    /// The caller already confirmed (e.g. `--yes`)
    Auto,
    /// Ask for the `CONFIRM-<n>` token
    Prompt(Arc<dyn ConfirmationPrompt>),
}

pub struct FormattingPipeline {
    executor: Arc<dyn CommandExecutor>,
    catalog: DiskCatalog,
    confirmation: Confirmation,
    progress: Option<UnboundedSender<ProgressEvent>>,
    cancel: CancellationToken,
    volume_root: VolumeRoot,
}

impl FormattingPipeline {
    pub fn new(executor: Arc<dyn CommandExecutor>, confirmation: Confirmation) -> Self {
        Self {
            catalog: DiskCatalog::new(executor.clone()),
            executor,
            confirmation,
            progress: None,
            cancel: CancellationToken::new(),
            volume_root: Arc::new(|letter: &str| PathBuf::from(format!("{letter}:\\"))),
        }
    }

    pub fn with_progress(mut self, progress: UnboundedSender<ProgressEvent>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_volume_root(mut self, volume_root: VolumeRoot) -> Self {
        self.volume_root = volume_root;
        self
    }

    /// Token that stops the run at the next state boundary.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn catalog(&self) -> &DiskCatalog {
        &self.catalog
    }

    /// Fails with `InsufficientPrivilege` unless the process is elevated.
    pub async fn verify_privileges(&self) -> Result<()> {
        ensure_elevated(self.executor.as_ref()).await
    }

    /// Run on a separate tokio task.
    pub fn spawn(self, request: FormatRequest) -> JoinHandle<PipelineResult> {
        tokio::spawn(async move { self.run(&request).await })
    }

    pub async fn run(&self, request: &FormatRequest) -> PipelineResult {
        let started = Instant::now();
        let mut run = Run {
            pipeline: self,
            request,
            result: PipelineResult::pending(request),
            revalidated: false,
        };

        match run.drive().await {
            Ok(()) => info!(
                disk = request.disk,
                "Operation completed successfully (steps: {})",
                run.result.steps.join(", ")
            ),
            Err(e) => {
                error!(disk = request.disk, "Error: {e}");
                if run.result.device_modified {
                    warn!(
                        disk = request.disk,
                        "Disk #{} may be partially modified", request.disk
                    );
                }
                run.result.fail(e.kind(), e.to_string());
            }
        }

        run.result.finish(started.elapsed());
        run.result
    }
}

/// State of one in-flight run.
struct Run<'a> {
    pipeline: &'a FormattingPipeline,
    request: &'a FormatRequest,
    result: PipelineResult,
    revalidated: bool,
}

impl Run<'_> {
    async fn drive(&mut self) -> Result<()> {
        self.enter(PipelineState::Resolve)?;
        let (disk, policy) = self.resolve().await?;

        let mut state = PipelineState::Resolve.next();
        while let Some(current) = state {
            if current.applies(self.request) {
                self.enter(current)?;
                self.execute(current, &disk, &policy).await?;
            } else {
                debug!(state = %current, "Skipping state");
                if current == PipelineState::Verify {
                    self.result.verify = Some(VerifyStatus::Skipped);
                }
            }
            state = current.next();
        }
        Ok(())
    }

    /// Cancellation check and progress notification at a state boundary.
    fn enter(&self, state: PipelineState) -> Result<()> {
        if state != PipelineState::Done && self.pipeline.cancel.is_cancelled() {
            info!(state = %state, "Cancellation requested");
            return Err(FormatError::Cancelled(state.phase().to_string()));
        }
        info!(state = %state, "{}", state.message());
        if let Some(progress) = &self.pipeline.progress {
            // a dropped receiver only means nobody is watching
            let _ = progress.send(ProgressEvent::new(
                state.phase(),
                state.message(),
                state.percent(),
            ));
        }
        Ok(())
    }

    async fn execute(
        &mut self,
        state: PipelineState,
        disk: &DiskRecord,
        policy: &ResolvedPolicy,
    ) -> Result<()> {
        match state {
            PipelineState::Resolve | PipelineState::Done => Ok(()),
            PipelineState::Confirm => self.confirm(disk, policy).await,
            PipelineState::Dismount => self.dismount(disk).await,
            PipelineState::Wipe => self.wipe(disk).await,
            PipelineState::Initialize => self.initialize(disk).await,
            PipelineState::PartitionAndFormat => self.partition_and_format(disk, policy).await,
            PipelineState::Verify => self.verify(policy).await,
            PipelineState::IoTest => self.io_test().await,
        }
    }

    // === States ===

    async fn resolve(&mut self) -> Result<(DiskRecord, ResolvedPolicy)> {
        let disk = self.pipeline.catalog.find(self.request.disk).await?;
        self.result.record_disk(&disk);

        ensure_safe_target(&disk)?;
        let policy = resolve_policy(self.request, &disk)?;
        info!(
            disk = disk.number,
            "Policy: {} cluster={} label='{}'", policy.filesystem, policy.cluster, policy.label
        );

        self.result.policy = Some(policy.clone());
        Ok((disk, policy))
    }

    async fn confirm(&mut self, disk: &DiskRecord, policy: &ResolvedPolicy) -> Result<()> {
        let prompt = match &self.pipeline.confirmation {
            Confirmation::Auto => {
                debug!("Confirmation given up front");
                return Ok(());
            }
            Confirmation::Prompt(prompt) => prompt.clone(),
        };

        let expected = self.request.confirmation_token();
        let summary = destructive_summary(disk, self.request, policy);
        let answer = prompt.request_token(&summary, &expected).await?;
        if answer.trim() != expected {
            return Err(FormatError::ConfirmationMismatch { expected });
        }
        Ok(())
    }

    async fn dismount(&mut self, disk: &DiskRecord) -> Result<()> {
        if let Err(e) = self.issue(scripts::dismount_volumes(disk.number)).await {
            warn!(disk = disk.number, "Dismount failed, continuing: {e}");
        }
        self.result.record_step("dismount_volumes");
        Ok(())
    }

    async fn wipe(&mut self, disk: &DiskRecord) -> Result<()> {
        self.revalidate(disk).await?;

        if self.request.wipe == WipeMode::ZeroAll {
            info!(
                disk = disk.number,
                "Wipe: full zero-fill. This can take a long time"
            );
            self.issue(scripts::zero_fill(disk.number)).await?;
            self.result.record_step("zero_fill");
        }

        self.issue(scripts::clear_metadata(disk.number)).await?;
        Ok(())
    }

    async fn initialize(&mut self, disk: &DiskRecord) -> Result<()> {
        self.revalidate(disk).await?;
        self.issue(scripts::initialize(disk.number, self.request.partition_style))
            .await?;
        self.result.record_step("clear_and_init");
        Ok(())
    }

    async fn partition_and_format(
        &mut self,
        disk: &DiskRecord,
        policy: &ResolvedPolicy,
    ) -> Result<()> {
        let command = scripts::create_partition_and_format(
            disk.number,
            policy.filesystem,
            &policy.label,
            policy.cluster,
            self.request.quick,
        );
        let name = command.name();

        let letter = match self.issue(command).await.map_err(no_free_letter)? {
            None => DRY_RUN_LETTER.to_string(),
            Some(output) => {
                scripts::parse_drive_letter(&output).ok_or_else(|| FormatError::Decode {
                    command: name.to_string(),
                    reason: "no drive letter in output".to_string(),
                    sample: sample(&output),
                })?
            }
        };

        info!(disk = disk.number, "Formatted volume mounted as {letter}:");
        self.result.drive_letter = letter;
        self.result.record_step("create_partition_and_format");
        Ok(())
    }

    async fn verify(&mut self, policy: &ResolvedPolicy) -> Result<()> {
        if self.request.dry_run {
            info!("[DRY-RUN] Verification simulated from policy");
        } else if let Err(e) = self.inspect_volume(policy).await {
            self.result.verify = Some(VerifyStatus::Failed);
            return Err(e);
        }

        self.result.verify = Some(VerifyStatus::Ok);
        self.result.record_step("verify");
        Ok(())
    }

    async fn io_test(&mut self) -> Result<()> {
        let size_mb = self.request.io_test_mb.unwrap_or_default();

        let report = if self.request.dry_run {
            IoTestReport {
                ok: true,
                message: "dry-run".to_string(),
                size_mb,
            }
        } else {
            let root = (self.pipeline.volume_root)(&self.result.drive_letter);
            tokio::task::spawn_blocking(move || io_test::run_io_test(&root, size_mb))
                .await
                .map_err(|e| FormatError::IoTestFailed(e.to_string()))?
        };

        let ok = report.ok;
        let message = report.message.clone();
        self.result.test_io = Some(report);
        if !ok {
            return Err(FormatError::IoTestFailed(message));
        }
        self.result.record_step("test_io");
        Ok(())
    }

    // === Helpers ===

    /// Issue a mutating command, or only record it in dry-run mode.
    async fn issue(&mut self, command: AdminCommand) -> Result<Option<CommandOutput>> {
        if self.request.dry_run {
            info!("[DRY-RUN] would run {}", command.name());
            debug!("[DRY-RUN] {}", command.script.trim());
            self.result
                .planned_commands
                .push(command.name().to_string());
            return Ok(None);
        }

        if !matches!(command.kind, CommandKind::DismountVolumes { .. }) {
            self.result.device_modified = true;
        }
        self.pipeline.executor.execute(&command).await.map(Some)
    }

    /// Re-check the target right before the first destructive command.
    async fn revalidate(&mut self, disk: &DiskRecord) -> Result<()> {
        if self.revalidated {
            return Ok(());
        }

        let fresh = self.pipeline.catalog.find(disk.number).await?;
        if fresh.unique_id != disk.unique_id {
            return Err(FormatError::TargetChanged {
                disk: disk.number,
                reason: "unique id differs".to_string(),
            });
        }
        if fresh.size_bytes != disk.size_bytes {
            return Err(FormatError::TargetChanged {
                disk: disk.number,
                reason: format!("size {} != {}", fresh.size_bytes, disk.size_bytes),
            });
        }
        ensure_safe_target(&fresh)?;

        debug!(disk = disk.number, "Target re-validated");
        self.revalidated = true;
        Ok(())
    }

    async fn inspect_volume(&self, policy: &ResolvedPolicy) -> Result<()> {
        let letter = self
            .result
            .drive_letter
            .chars()
            .next()
            .ok_or_else(|| FormatError::VerificationFailed("no drive letter assigned".to_string()))?;

        let output = self
            .pipeline
            .executor
            .execute(&scripts::inspect_volume(letter))
            .await?;
        let (filesystem, label) = scripts::parse_volume_inspection(&output).ok_or_else(|| {
            FormatError::VerificationFailed(format!("unexpected volume output: {}", sample(&output)))
        })?;

        if !filesystem.eq_ignore_ascii_case(policy.filesystem.as_str()) || label != policy.label {
            return Err(FormatError::VerificationFailed(format!(
                "expected {}/'{}', found {}/'{}'",
                policy.filesystem, policy.label, filesystem, label
            )));
        }
        Ok(())
    }
}

fn no_free_letter(error: FormatError) -> FormatError {
    match error {
        FormatError::Command { ref stderr, .. }
            if stderr.contains(scripts::NO_FREE_LETTER_MARKER) =>
        {
            FormatError::NoFreeLetter
        }
        other => other,
    }
}

fn sample(output: &CommandOutput) -> String {
    output.stdout.trim().chars().take(OUTPUT_SAMPLE_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use media_testing::{FakeExecutor, fixtures};
    use media_types::{ClusterSize, Filesystem, FilesystemChoice, RunStatus};
    use tokio::sync::mpsc;

    use super::*;

    fn pipeline(fake: &Arc<FakeExecutor>) -> FormattingPipeline {
        FormattingPipeline::new(fake.clone(), Confirmation::Auto)
    }

    #[tokio::test]
    async fn happy_path_records_steps_in_order() {
        let fake = Arc::new(FakeExecutor::new(vec![fixtures::sd_card(3, 32_000_000_000)]));
        let result = pipeline(&fake).run(&FormatRequest::new(3, "CAM")).await;

        assert_eq!(result.status, RunStatus::Ok, "{:?}", result.error);
        assert_eq!(
            result.steps,
            vec![
                "dismount_volumes",
                "clear_and_init",
                "create_partition_and_format",
                "verify"
            ]
        );
        assert_eq!(result.drive_letter, "E");
        assert_eq!(result.verify, Some(VerifyStatus::Ok));
        assert!(result.device_modified);
        assert!(result.planned_commands.is_empty());
    }

    #[tokio::test]
    async fn zero_all_records_zero_fill_before_clear_and_init() {
        let fake = Arc::new(FakeExecutor::new(vec![fixtures::sd_card(3, 32_000_000_000)]));
        let mut request = FormatRequest::new(3, "X");
        request.wipe = WipeMode::ZeroAll;
        request.skip_verify = true;

        let result = pipeline(&fake).run(&request).await;

        assert_eq!(
            result.steps,
            vec![
                "dismount_volumes",
                "zero_fill",
                "clear_and_init",
                "create_partition_and_format"
            ]
        );
        assert_eq!(result.verify, Some(VerifyStatus::Skipped));
    }

    #[tokio::test]
    async fn wipe_none_skips_clear_but_initializes() {
        let fake = Arc::new(FakeExecutor::new(vec![fixtures::sd_card(3, 32_000_000_000)]));
        let mut request = FormatRequest::new(3, "X");
        request.wipe = WipeMode::None;

        let result = pipeline(&fake).run(&request).await;

        assert!(result.is_ok(), "{:?}", result.error);
        assert!(result.steps.contains(&"clear_and_init".to_string()));
        assert!(
            !fake
                .issued_names()
                .contains(&"clear_metadata".to_string())
        );
        // the old FAT partition is gone, only the new one remains
        assert_eq!(fake.disk(3).unwrap().partitions.len(), 1);
    }

    #[tokio::test]
    async fn dismount_failure_is_swallowed() {
        let fake = Arc::new(FakeExecutor::new(vec![fixtures::sd_card(3, 32_000_000_000)]));
        fake.fail_on("dismount_volumes", "volume in use");

        let result = pipeline(&fake).run(&FormatRequest::new(3, "X")).await;

        assert!(result.is_ok(), "{:?}", result.error);
        assert_eq!(result.steps[0], "dismount_volumes");
    }

    #[tokio::test]
    async fn missing_letter_range_maps_to_no_free_letter() {
        let fake = Arc::new(FakeExecutor::new(vec![fixtures::sd_card(3, 32_000_000_000)]));
        fake.fail_on("create_partition_and_format", scripts::NO_FREE_LETTER_MARKER);

        let result = pipeline(&fake).run(&FormatRequest::new(3, "X")).await;

        assert_eq!(result.error_kind, Some(media_types::FailureKind::NoFreeLetter));
        assert_eq!(result.steps, vec!["dismount_volumes", "clear_and_init"]);
        assert!(result.device_modified);
    }

    #[tokio::test]
    async fn swapped_card_is_refused_before_wiping() {
        let fake = Arc::new(FakeExecutor::new(vec![fixtures::sd_card(3, 32_000_000_000)]));
        fake.swap_after_listing(fixtures::sd_card(3, 16_000_000_000));

        let result = pipeline(&fake).run(&FormatRequest::new(3, "X")).await;

        assert_eq!(result.error_kind, Some(media_types::FailureKind::UnsafeTarget));
        assert!(!result.device_modified);
        assert_eq!(result.steps, vec!["dismount_volumes"]);
    }

    #[tokio::test]
    async fn explicit_policy_reaches_format_command() {
        let fake = Arc::new(FakeExecutor::new(vec![fixtures::sd_card(3, 128_000_000_000)]));
        let mut request = FormatRequest::new(3, "Archive");
        request.filesystem = FilesystemChoice::Fixed(Filesystem::Ntfs);
        request.quick = false;

        let result = pipeline(&fake).run(&request).await;

        assert!(result.is_ok(), "{:?}", result.error);
        let policy = result.policy.unwrap();
        assert_eq!(policy.filesystem, Filesystem::Ntfs);
        assert_eq!(policy.cluster, ClusterSize::Default);
        let format = fake
            .issued()
            .into_iter()
            .find(|command| command.name() == "create_partition_and_format")
            .unwrap();
        assert!(format.script.contains("-Full"));
        assert!(format.script.contains("-NewFileSystemLabel 'Archive'"));
    }

    #[tokio::test]
    async fn progress_is_monotone_and_ends_at_100() {
        let fake = Arc::new(FakeExecutor::new(vec![fixtures::sd_card(3, 32_000_000_000)]));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let result = pipeline(&fake)
            .with_progress(tx)
            .run(&FormatRequest::new(3, "X"))
            .await;
        assert!(result.is_ok());

        let mut percents = Vec::new();
        while let Ok(event) = rx.try_recv() {
            percents.push(event.percent);
        }
        assert!(percents.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(percents.first(), Some(&0));
        assert_eq!(percents.last(), Some(&100));
    }

    #[tokio::test]
    async fn privileges_come_from_executor() {
        let fake = Arc::new(FakeExecutor::new(Vec::new()));
        assert!(pipeline(&fake).verify_privileges().await.is_ok());

        fake.set_elevated(false);
        assert!(matches!(
            pipeline(&fake).verify_privileges().await,
            Err(FormatError::InsufficientPrivilege(_))
        ));
    }
}
