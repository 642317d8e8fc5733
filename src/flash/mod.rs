//! Recovery flashing: staging payloads and rebooting to apply them.
//!
//! - `planner` - stage a payload in the recovery directory and ask to reboot
//! - `reboot` - reboot, reboot into a target, or soft restart

pub mod planner;
pub mod reboot;

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::mode::InstallMode;

pub use planner::{
    FlashOutcome, FlashResolution, FlashStep, RecoveryFlashPlanner, StageOutcome, StagedFlash,
    StepFailure,
};
pub use reboot::{RebootAction, RebootController, RebootOutcome};

/// Asset name of the legacy bridge jar.
pub const BRIDGE_ASSET: &str = "XposedBridge.jar";

/// On-device locations the flashing sequence touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashLayout {
    pub recovery_dir: PathBuf,
    pub framework_dir: PathBuf,
}

impl FlashLayout {
    pub fn new(recovery_dir: impl Into<PathBuf>, framework_dir: impl Into<PathBuf>) -> Self {
        Self {
            recovery_dir: recovery_dir.into(),
            framework_dir: framework_dir.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.recovery_dir, &config.framework_dir)
    }

    /// File the recovery reads its instructions from.
    pub fn command_file(&self) -> PathBuf {
        self.recovery_dir.join("command")
    }

    /// Empty file some kernels check to boot straight into recovery.
    pub fn boot_sentinel(&self) -> PathBuf {
        self.recovery_dir.join("boot")
    }

    pub fn staged_payload(&self, file_name: &str) -> PathBuf {
        self.recovery_dir.join(file_name)
    }

    pub fn app_process(&self) -> PathBuf {
        self.framework_dir.join("bin/app_process")
    }

    pub fn bridge_jar(&self) -> PathBuf {
        self.framework_dir.join("bin").join(BRIDGE_ASSET)
    }
}

/// One payload about to be staged. Consumed by the planner; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryFlashRequest {
    pub payload_path: PathBuf,
    pub mode: InstallMode,
}

impl RecoveryFlashRequest {
    pub fn new(payload_path: impl Into<PathBuf>, mode: InstallMode) -> Self {
        Self {
            payload_path: payload_path.into(),
            mode,
        }
    }

    pub fn file_name(&self) -> String {
        self.payload_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn payload(&self) -> &Path {
        &self.payload_path
    }
}
