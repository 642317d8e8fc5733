//! Packages command - lists what a manifest offers for this device.

use std::path::Path;

use anyhow::Result;

use super::Context;
use crate::manifest::{Manifest, Selection};
use crate::messages;
use crate::probe::CompatibilityResult;
use crate::settings::{JsonSettingsStore, SettingsStore};
use crate::task::BackgroundTask;

pub async fn cmd_packages(ctx: &Context, manifest_path: &Path) -> Result<()> {
    let path = manifest_path.to_path_buf();
    let manifest = BackgroundTask::start_blocking("manifest", move || Manifest::load(&path))
        .join()
        .await??;

    // Listing packages never touches root, so the shell stays unstarted.
    let settings = JsonSettingsStore::new(&ctx.config.settings_path).load()?;
    let mut installer = ctx.installer(CompatibilityResult::assumed(), settings);
    installer.set_manifest(manifest);

    match installer.selection() {
        None | Some(Selection::NotCompatible) => {
            println!("{}", messages::phone_not_compatible(ctx.device.sdk, &ctx.device.abi));
        }
        Some(Selection::Offered {
            installers,
            uninstallers,
            default_index,
        }) => {
            println!("Installers:");
            for (i, p) in installers.iter().enumerate() {
                let marker = if i == default_index { "*" } else { " " };
                println!("{} {} (v{}, {}) {}", marker, p.name, p.version, p.architecture, p.link);
            }
            println!("Uninstallers:");
            for (i, p) in uninstallers.iter().enumerate() {
                let marker = if i == default_index { "*" } else { " " };
                println!("{} {} ({}, {}) {}", marker, p.name, p.display_date(), p.architecture, p.link);
            }
        }
    }

    if let Some(release) = installer.pending_update() {
        println!("\nUpdate available: version {} at {}", release.version, release.link);
        if !release.changelog.is_empty() {
            println!("{}", release.changelog);
        }
    }
    Ok(())
}
