//! Probe command - runs the compatibility probe and prints the result.

use anyhow::Result;

use super::Context;
use crate::probe::probe_asset;

pub async fn cmd_probe(ctx: &Context) -> Result<()> {
    let device = &ctx.device;
    println!("Device: SDK {}, {} ({})", device.sdk, device.arch(), device.abi);

    match probe_asset(device.sdk, device.asset_folder()) {
        Some(asset) => println!("Probing with {}...", asset),
        None => println!("SDK {} does not need probing.", device.sdk),
    }

    let compat = ctx.probe().await?;
    for line in compat.diagnostics() {
        println!("  {}", line);
    }
    if compat.is_compatible() {
        println!("Compatible.");
    } else {
        println!("Not compatible.");
    }
    Ok(())
}
