//! Compatibility probe.
//!
//! On the old SDKs the framework replaces `app_process`, so before offering an
//! install we run the replacement binary unprivileged and ask it for its
//! version. If it can't answer on this build, installing it would bootloop.

use std::fs;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::assets::{AssetError, AssetStore};
use crate::device::DeviceInfo;

/// Argument the probe binary answers with its version.
pub const PROBE_ARG: &str = "--xposedversion";

/// First stdout line of a healthy probe starts with this.
pub const VERSION_PREFIX: &str = "Xposed version: ";

/// Highest SDK that uses the `app_process` replacement and legacy bridge.
pub const LEGACY_MAX_SDK: u32 = 19;

/// Outcome of probing this build. Created once per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibilityResult {
    is_compatible: bool,
    diagnostics: Vec<String>,
}

impl CompatibilityResult {
    pub fn new(is_compatible: bool, diagnostics: Vec<String>) -> Self {
        Self {
            is_compatible,
            diagnostics,
        }
    }

    /// Result for builds the probe does not apply to.
    pub fn assumed() -> Self {
        Self::new(true, Vec::new())
    }

    pub fn is_compatible(&self) -> bool {
        self.is_compatible
    }

    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("could not write app_process to cache: {0}")]
    Materialize(#[from] AssetError),

    #[error("could not run probe binary: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("probe binary did not answer within {0:?}")]
    Timeout(Duration),
}

/// Asset holding the probe build for this SDK, if the SDK needs probing.
pub fn probe_asset(sdk: u32, folder: &str) -> Option<String> {
    let suffix = match sdk {
        15 => "sdk15",
        16..=18 => "sdk16",
        19 => "sdk19",
        _ => return None,
    };
    Some(format!("{}app_process_xposed_{}", folder, suffix))
}

/// Whether `first_line` is a healthy answer to [`PROBE_ARG`].
pub fn reports_version(first_line: Option<&str>) -> bool {
    matches!(first_line, Some(line) if !line.is_empty() && line.starts_with(VERSION_PREFIX))
}

pub struct CompatibilityProbe {
    assets: Arc<dyn AssetStore>,
    timeout: Duration,
}

impl CompatibilityProbe {
    pub fn new(assets: Arc<dyn AssetStore>, timeout: Duration) -> Self {
        Self { assets, timeout }
    }

    /// Probe `device`. Never fails: problems become diagnostics and an
    /// incompatible result.
    pub async fn run(&self, device: &DeviceInfo) -> CompatibilityResult {
        let Some(asset) = probe_asset(device.sdk, device.asset_folder()) else {
            debug!(sdk = device.sdk, "probe not needed for this SDK");
            return CompatibilityResult::assumed();
        };

        let mut diagnostics = Vec::new();
        let compatible = match self.probe(&asset, &mut diagnostics).await {
            Ok(compatible) => compatible,
            Err(err) => {
                warn!(asset = %asset, "compatibility probe failed: {}", err);
                diagnostics.push(err.to_string());
                false
            }
        };

        info!(sdk = device.sdk, compatible, "compatibility probe finished");
        CompatibilityResult::new(compatible, diagnostics)
    }

    async fn probe(&self, asset: &str, diagnostics: &mut Vec<String>) -> Result<bool, ProbeError> {
        let dest = self.assets.cache_dir().join("app_process");
        let binary = self.assets.write_asset(asset, &dest, 0o700)?;

        let result = self.spawn_and_read(&binary, diagnostics).await;
        remove_probe_binary(&binary);
        result
    }

    async fn spawn_and_read(&self, binary: &Path, diagnostics: &mut Vec<String>) -> Result<bool, ProbeError> {
        let child = Command::new(binary)
            .arg(PROBE_ARG)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ProbeError::Timeout(self.timeout))??;

        let stderr = String::from_utf8_lossy(&output.stderr);
        diagnostics.extend(stderr.lines().map(str::to_string));

        let stdout = String::from_utf8_lossy(&output.stdout);
        let first_line = stdout.lines().next();
        debug!(first_line = first_line.unwrap_or(""), "probe answered");
        Ok(reports_version(first_line))
    }
}

fn remove_probe_binary(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        if err.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), "could not delete probe binary: {}", err);
        }
    }
}
