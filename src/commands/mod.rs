//! CLI command handlers.
//!
//! Each submodule handles a specific CLI command:
//! - `status` - Show installed framework state
//! - `preflight` - Run preflight checks
//! - `probe` - Run the compatibility probe
//! - `flash` - Install/uninstall payloads and reboots
//! - `settings` - Install mode, preferences, disable toggle
//! - `packages` - List packages offered by a manifest
//! - `show` - Display information

mod flash;
mod packages;
mod preflight;
mod probe;
mod settings;
mod show;
mod status;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use crate::assets::{AssetStore, DirAssetStore, Toolset};
use crate::config::Config;
use crate::device::DeviceInfo;
use crate::flash::FlashLayout;
use crate::installer::Installer;
use crate::probe::{CompatibilityProbe, CompatibilityResult};
use crate::settings::Settings;
use crate::shell::{RootShellSession, SessionConfig};
use crate::task::BackgroundTask;

pub use flash::{cmd_flash, cmd_reboot, FlashKind};
pub use packages::cmd_packages;
pub use preflight::cmd_preflight;
pub use probe::cmd_probe;
pub use settings::{cmd_mode, cmd_set, cmd_toggle};
pub use show::{cmd_show, ShowTarget};
pub use status::cmd_status;

/// Filesystem root that ROM quirks are looked up under.
pub const DEVICE_ROOT: &str = "/";

/// Everything a device-facing command needs.
pub struct Context {
    pub config: Config,
    pub assets: Arc<dyn AssetStore>,
    pub device: DeviceInfo,
}

impl Context {
    pub fn detect(config: Config) -> Result<Self> {
        let device = DeviceInfo::detect(&config)?;
        let assets: Arc<dyn AssetStore> =
            Arc::new(DirAssetStore::new(&config.asset_dir, &config.cache_dir));
        Ok(Self {
            config,
            assets,
            device,
        })
    }

    pub fn device_root(&self) -> &Path {
        Path::new(DEVICE_ROOT)
    }

    /// Run the compatibility probe on the worker pool.
    pub async fn probe(&self) -> Result<CompatibilityResult> {
        let probe = CompatibilityProbe::new(self.assets.clone(), self.config.probe_timeout);
        let device = self.device.clone();
        let task = BackgroundTask::start("probe", async move { probe.run(&device).await });
        Ok(task.join().await?)
    }

    pub fn installer(&self, compat: CompatibilityResult, settings: Settings) -> Installer<RootShellSession> {
        let toolset = Toolset::for_folder(self.assets.clone(), self.device.asset_folder());
        let shell = RootShellSession::new(SessionConfig::new(&self.config.su_binary), toolset);
        Installer::new(
            shell,
            self.assets.clone(),
            FlashLayout::from_config(&self.config),
            self.device.clone(),
            compat,
            settings,
        )
    }
}
