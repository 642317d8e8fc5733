//! Status command - shows what is installed and what this device is.

use anyhow::Result;

use super::Context;
use crate::messages;
use crate::settings::{JsonSettingsStore, SettingsStore};
use crate::status::{self, KnownIssue};

pub fn cmd_status(ctx: &Context) -> Result<()> {
    let settings = JsonSettingsStore::new(&ctx.config.settings_path).load()?;
    if !settings.hide_install_warning {
        println!("{}\n", messages::install_warning());
    }

    let device = &ctx.device;
    println!("Device:");
    println!("  SDK: {}", device.sdk);
    println!("  Architecture: {} ({})", device.arch(), device.abi);
    if !device.manufacturer.is_empty() {
        println!("  Manufacturer: {}", device.manufacturer);
    }
    if let Some(ui) = device.ui_framework(ctx.device_root()) {
        println!("  UI framework: {}", ui);
    }
    println!();

    let state = status::install_status(&ctx.config.prop_file, &ctx.config.disable_flag());
    println!("{}", state.describe());
    println!("Install mode: {}", settings.install_mode());

    if let Some(issue) = KnownIssue::detect(ctx.device_root(), None) {
        println!("\n{}", issue.banner());
    }
    Ok(())
}
