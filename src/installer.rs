//! The installer instance.
//!
//! Owns the privileged session and everything a flash or reboot needs:
//! device facts, the probe result, preferences, the loaded manifest and the
//! last transcript shown to the user. Nothing here is process-global.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::assets::AssetStore;
use crate::confirm::{ConfirmationGate, Decision};
use crate::device::DeviceInfo;
use crate::flash::{
    FlashLayout, FlashOutcome, RebootAction, RebootController, RebootOutcome, RecoveryFlashPlanner,
    RecoveryFlashRequest,
};
use crate::manifest::{Manifest, Release, Selection, VERSION_CODE};
use crate::messages;
use crate::probe::CompatibilityResult;
use crate::settings::Settings;
use crate::shell::{AcquisitionError, PrivilegedShell};
use crate::status::KnownIssue;
use crate::transcript::Transcript;

/// How a downloaded payload was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlashStatus {
    /// The install warning was declined; nothing ran.
    WarningDeclined,
    /// Root could not be obtained.
    RootDenied,
    Finished(FlashOutcome),
}

#[derive(Debug, Clone)]
pub struct FlashReport {
    pub status: FlashStatus,
    pub transcript: Transcript,
}

pub struct Installer<S: PrivilegedShell> {
    shell: S,
    assets: Arc<dyn AssetStore>,
    layout: FlashLayout,
    device: DeviceInfo,
    compat: CompatibilityResult,
    settings: Settings,
    manifest: Option<Manifest>,
    last_transcript: Option<Transcript>,
}

impl<S: PrivilegedShell> Installer<S> {
    pub fn new(
        shell: S,
        assets: Arc<dyn AssetStore>,
        layout: FlashLayout,
        device: DeviceInfo,
        compat: CompatibilityResult,
        settings: Settings,
    ) -> Self {
        Self {
            shell,
            assets,
            layout,
            device,
            compat,
            settings,
            manifest: None,
            last_transcript: None,
        }
    }

    pub fn device(&self) -> &DeviceInfo {
        &self.device
    }

    pub fn compatibility(&self) -> &CompatibilityResult {
        &self.compat
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn shell(&self) -> &S {
        &self.shell
    }

    pub fn set_manifest(&mut self, manifest: Manifest) {
        self.manifest = Some(manifest);
    }

    /// Packages offered for this device, if a manifest is loaded.
    pub fn selection(&self) -> Option<Selection> {
        self.manifest.as_ref().map(|m| m.select(&self.device))
    }

    pub fn last_transcript(&self) -> Option<&Transcript> {
        self.last_transcript.as_ref()
    }

    /// A newer installer release, when the loaded manifest advertises one.
    pub fn pending_update(&self) -> Option<&Release> {
        let manifest = self.manifest.as_ref()?;
        if manifest.update_available(VERSION_CODE) {
            manifest.release.as_ref()
        } else {
            None
        }
    }

    /// A downloaded payload is ready: stage it for the recovery and offer to
    /// reboot into it. Every outcome, including a refused root request, is
    /// reported with its transcript.
    pub fn handle_download(&mut self, payload: impl Into<PathBuf>, gate: &mut dyn ConfirmationGate) -> FlashReport {
        let payload = payload.into();
        let mut log = Transcript::new();
        info!(payload = %payload.display(), "{}", messages::download_ready(&payload));

        if !self.settings.hide_install_warning && gate.confirm(&messages::install_warning()) == Decision::Declined {
            return self.report(FlashStatus::WarningDeclined, log);
        }

        if let Err(err) = self.shell.acquire() {
            return self.root_denied(err, log);
        }

        let request = RecoveryFlashRequest::new(payload, self.settings.install_mode());
        let outcome = RecoveryFlashPlanner::new(
            &mut self.shell,
            self.assets.as_ref(),
            &self.layout,
            &self.device,
            &self.compat,
        )
        .run(request, gate, &mut log);

        match outcome {
            Ok(outcome) => self.report(FlashStatus::Finished(outcome), log),
            Err(err) => self.root_denied(err, log),
        }
    }

    /// Reboot, asking first when reboot confirmation is enabled.
    /// `None` when the user declined.
    pub fn reboot(
        &mut self,
        action: RebootAction,
        gate: &mut dyn ConfirmationGate,
    ) -> Result<Option<(RebootOutcome, Transcript)>, AcquisitionError> {
        if self.settings.confirm_reboots {
            let prompt = match &action {
                RebootAction::Reboot => messages::reboot_prompt(),
                RebootAction::SoftRestart => messages::soft_reboot_prompt(),
                RebootAction::RebootInto(_) => messages::reboot_recovery_prompt(),
            };
            if gate.confirm(&prompt) == Decision::Declined {
                return Ok(None);
            }
        }

        let mut log = Transcript::new();
        let outcome = RebootController::new(&mut self.shell, &self.layout).perform(&action, &mut log);
        self.last_transcript = Some(log.clone());
        Ok(Some((outcome?, log)))
    }

    /// Advisory only.
    pub fn known_issue(&self, root: &Path) -> Option<KnownIssue> {
        KnownIssue::detect(root, self.last_transcript.as_ref())
    }

    pub fn shutdown(&mut self) {
        self.shell.dispose();
    }

    fn root_denied(&mut self, err: AcquisitionError, mut log: Transcript) -> FlashReport {
        warn!(error = %err, "root acquisition failed");
        log.push(messages::root_failed());
        self.report(FlashStatus::RootDenied, log)
    }

    fn report(&mut self, status: FlashStatus, transcript: Transcript) -> FlashReport {
        self.last_transcript = Some(transcript.clone());
        FlashReport { status, transcript }
    }
}
