//! Staging a flashable payload for the recovery.
//!
//! The sequence is strictly ordered and stops at the first failing step:
//!
//! 1. legacy devices only: refuse if the probe failed, then place the bridge
//!    files in the framework directory
//! 2. make sure the recovery directory exists
//! 3. copy the payload into it
//! 4. write the recovery command file
//!
//! Once staged, the user is asked whether to reboot into recovery. Declining
//! in an auto-applying mode removes what was staged so nothing is flashed
//! behind the user's back on some later recovery boot.
//!
//! Every abort leaves the full transcript plus one summary line, including
//! when the shell dies mid-step. Only a refused root request is returned as
//! an error.
//!
//! The planner holds the shell by `&mut` for the whole sequence, so at most
//! one flash can be staged through a session at a time.

use std::fmt;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use super::reboot::{RebootAction, RebootController, RebootOutcome};
use super::{FlashLayout, RecoveryFlashRequest, BRIDGE_ASSET};
use crate::assets::AssetStore;
use crate::confirm::{ConfirmationGate, Decision};
use crate::device::DeviceInfo;
use crate::messages;
use crate::probe::{probe_asset, CompatibilityResult};
use crate::shell::{quote, AcquisitionError, CommandOutcome, PrivilegedShell, ShellError};
use crate::transcript::Transcript;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashStep {
    Compatibility,
    LegacyBridge,
    RecoveryDir,
    PayloadCopy,
    CommandFile,
}

impl fmt::Display for FlashStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlashStep::Compatibility => "compatibility",
            FlashStep::LegacyBridge => "legacy bridge",
            FlashStep::RecoveryDir => "recovery directory",
            FlashStep::PayloadCopy => "payload copy",
            FlashStep::CommandFile => "command file",
        };
        f.write_str(name)
    }
}

/// The step that stopped staging and the line it added to the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    pub step: FlashStep,
    pub summary: String,
}

/// A payload sitting in the recovery directory with a command file pointing at it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFlash {
    pub request: RecoveryFlashRequest,
    pub staged_payload: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Staged(StagedFlash),
    Aborted(StepFailure),
}

/// What happened after the reboot question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashResolution {
    Rebooting,
    RebootFailed,
    /// Declined in an auto-applying mode; staged files were removed.
    DeclinedCleanedUp,
    /// Declined in manual mode; staged files are left for the user.
    DeclinedKept,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlashOutcome {
    Aborted(StepFailure),
    Resolved(FlashResolution),
}

pub struct RecoveryFlashPlanner<'a, S: PrivilegedShell + ?Sized> {
    shell: &'a mut S,
    assets: &'a dyn AssetStore,
    layout: &'a FlashLayout,
    device: &'a DeviceInfo,
    compat: &'a CompatibilityResult,
}

impl<'a, S: PrivilegedShell + ?Sized> RecoveryFlashPlanner<'a, S> {
    pub fn new(
        shell: &'a mut S,
        assets: &'a dyn AssetStore,
        layout: &'a FlashLayout,
        device: &'a DeviceInfo,
        compat: &'a CompatibilityResult,
    ) -> Self {
        Self {
            shell,
            assets,
            layout,
            device,
            compat,
        }
    }

    /// Stage, then ask about rebooting.
    ///
    /// Only a refused root request is an error. Everything else that goes
    /// wrong ends up in `log` and in the returned outcome.
    pub fn run(
        &mut self,
        request: RecoveryFlashRequest,
        gate: &mut dyn ConfirmationGate,
        log: &mut Transcript,
    ) -> Result<FlashOutcome, AcquisitionError> {
        match self.stage(request, log)? {
            StageOutcome::Aborted(failure) => Ok(FlashOutcome::Aborted(failure)),
            StageOutcome::Staged(staged) => {
                let resolution = self.offer_reboot(&staged, gate, log)?;
                Ok(FlashOutcome::Resolved(resolution))
            }
        }
    }

    pub fn stage(
        &mut self,
        request: RecoveryFlashRequest,
        log: &mut Transcript,
    ) -> Result<StageOutcome, AcquisitionError> {
        info!(payload = %request.payload_path.display(), mode = %request.mode, "staging flash");

        if self.device.is_legacy() {
            if let Some(failure) = self.stage_legacy_bridge(log)? {
                return Ok(StageOutcome::Aborted(failure));
            }
        }

        let layout = self.layout;
        let dir = &layout.recovery_dir;
        let dir_arg = quote(&dir.to_string_lossy());

        // Existence check only; its output is not interesting.
        match self.exec(&format!("ls {}", dir_arg), false, log)? {
            None => {
                return Ok(abort(log, FlashStep::RecoveryDir, messages::file_create_directory_failed(dir)));
            }
            Some(listed) if listed.success() => {}
            Some(_) => {
                log.push(messages::file_creating_directory(dir));
                let mkdir = format!("mkdir {}", dir_arg);
                let summary = messages::file_create_directory_failed(dir);
                if let Some(failure) = self.run_step(&mkdir, true, FlashStep::RecoveryDir, summary, log)? {
                    return Ok(StageOutcome::Aborted(failure));
                }
            }
        }

        let payload = &request.payload_path;
        log.push(messages::file_copying(payload.display()));
        let copy = format!("cp -a {} {}/", quote(&payload.to_string_lossy()), dir_arg);
        let summary = messages::file_copy_failed(payload, dir);
        if let Some(failure) = self.run_step(&copy, true, FlashStep::PayloadCopy, summary, log)? {
            return Ok(StageOutcome::Aborted(failure));
        }

        let staged_payload = layout.staged_payload(&request.file_name());
        log.push(messages::file_writing_recovery_command());
        let update_arg = format!("--update_package={}", staged_payload.display());
        let write = format!(
            "echo {} > {}",
            quote(&update_arg),
            quote(&layout.command_file().to_string_lossy())
        );
        let summary = messages::file_writing_recovery_command_failed();
        if let Some(failure) = self.run_step(&write, false, FlashStep::CommandFile, summary, log)? {
            return Ok(StageOutcome::Aborted(failure));
        }

        debug!(staged = %staged_payload.display(), "flash staged");
        Ok(StageOutcome::Staged(StagedFlash {
            request,
            staged_payload,
        }))
    }

    fn stage_legacy_bridge(&mut self, log: &mut Transcript) -> Result<Option<StepFailure>, AcquisitionError> {
        if !self.compat.is_compatible() {
            log.extend(self.compat.diagnostics().iter().cloned());
            let summary = messages::phone_not_compatible(self.device.sdk, &self.device.abi);
            log.push(summary.clone());
            warn!(sdk = self.device.sdk, abi = %self.device.abi, "refusing to flash on incompatible device");
            return Ok(Some(StepFailure {
                step: FlashStep::Compatibility,
                summary,
            }));
        }

        let Some(app_process) = probe_asset(self.device.sdk, self.device.asset_folder()) else {
            return Ok(Some(abort_step(log, FlashStep::LegacyBridge, messages::file_extract_failed("app_process"))));
        };
        if let Err(err) = self.assets.write_asset(&app_process, &self.layout.app_process(), 0o700) {
            warn!(error = %err, "app_process extraction failed");
            return Ok(Some(abort_step(log, FlashStep::LegacyBridge, messages::file_extract_failed("app_process"))));
        }

        log.push(messages::file_copying(BRIDGE_ASSET));
        if let Err(err) = self.assets.write_asset(BRIDGE_ASSET, &self.layout.bridge_jar(), 0o644) {
            warn!(error = %err, "bridge extraction failed");
            return Ok(Some(abort_step(log, FlashStep::LegacyBridge, messages::file_extract_failed(BRIDGE_ASSET))));
        }

        // A failing sync is not fatal, a lost shell is.
        match self.exec("sync", true, log)? {
            Some(synced) => {
                log.extend(synced.transcript);
                Ok(None)
            }
            None => Ok(Some(abort_step(log, FlashStep::LegacyBridge, messages::file_extract_failed(BRIDGE_ASSET)))),
        }
    }

    /// Ask whether to reboot into recovery now.
    pub fn offer_reboot(
        &mut self,
        staged: &StagedFlash,
        gate: &mut dyn ConfirmationGate,
        log: &mut Transcript,
    ) -> Result<FlashResolution, AcquisitionError> {
        let file_name = staged.request.file_name();
        let automatic = staged.request.mode.applies_automatically();
        if automatic {
            log.push(messages::auto_flash_note(&file_name));
        } else {
            log.push(messages::manual_flash_note(&file_name));
        }
        log.blank();
        log.push(messages::reboot_recovery_confirmation());

        match gate.confirm(&log.render()) {
            Decision::Confirmed => {
                let outcome = RebootController::new(&mut *self.shell, self.layout)
                    .perform(&RebootAction::recovery(), log)?;
                Ok(match outcome {
                    RebootOutcome::Issued => FlashResolution::Rebooting,
                    RebootOutcome::Failed => FlashResolution::RebootFailed,
                })
            }
            Decision::Declined if automatic => {
                info!("reboot declined, removing staged flash");
                self.remove_staged(staged, log);
                Ok(FlashResolution::DeclinedCleanedUp)
            }
            Decision::Declined => {
                info!("reboot declined, leaving staged flash for manual use");
                Ok(FlashResolution::DeclinedKept)
            }
        }
    }

    /// Best effort: every target is attempted and the toolset always goes.
    fn remove_staged(&mut self, staged: &StagedFlash, log: &mut Transcript) {
        let targets = [self.layout.command_file(), staged.staged_payload.clone()];
        for target in &targets {
            let command = format!("rm {}", quote(&target.to_string_lossy()));
            match self.shell.execute(&command, true) {
                Ok(removed) => log.extend(removed.transcript),
                Err(err) => {
                    warn!(%command, error = %err, "cleanup command failed");
                    log.push(err.to_string());
                }
            }
        }
        self.shell.remove_toolset();
    }

    /// Run one command. `None` means the shell could not run it at all
    /// (channel lost, toolset missing); the reason is already in `log`.
    fn exec(
        &mut self,
        command: &str,
        with_toolset: bool,
        log: &mut Transcript,
    ) -> Result<Option<CommandOutcome>, AcquisitionError> {
        match self.shell.execute(command, with_toolset) {
            Ok(outcome) => Ok(Some(outcome)),
            Err(ShellError::Acquisition(err)) => Err(err),
            Err(err) => {
                warn!(%command, error = %err, "privileged command did not run");
                log.push(err.to_string());
                Ok(None)
            }
        }
    }

    /// Run a step's command, keeping its output. Any failure aborts with
    /// `summary`.
    fn run_step(
        &mut self,
        command: &str,
        with_toolset: bool,
        step: FlashStep,
        summary: String,
        log: &mut Transcript,
    ) -> Result<Option<StepFailure>, AcquisitionError> {
        let Some(outcome) = self.exec(command, with_toolset, log)? else {
            return Ok(Some(abort_step(log, step, summary)));
        };
        let ok = outcome.success();
        log.extend(outcome.transcript);
        if ok {
            Ok(None)
        } else {
            Ok(Some(abort_step(log, step, summary)))
        }
    }
}

fn abort_step(log: &mut Transcript, step: FlashStep, summary: String) -> StepFailure {
    log.blank();
    log.push(summary.clone());
    warn!(%step, %summary, "staging stopped");
    StepFailure { step, summary }
}

fn abort(log: &mut Transcript, step: FlashStep, summary: String) -> StageOutcome {
    StageOutcome::Aborted(abort_step(log, step, summary))
}
