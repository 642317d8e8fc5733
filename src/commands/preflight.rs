//! Preflight command - runs preflight checks.

use anyhow::Result;

use super::Context;
use crate::preflight;

/// Execute the preflight command.
pub async fn cmd_preflight(ctx: &Context, strict: bool) -> Result<()> {
    let compat = ctx.probe().await?;
    let report = preflight::run_preflight(
        &ctx.config,
        ctx.assets.as_ref(),
        &ctx.device,
        &compat,
        ctx.device_root(),
    );

    if strict {
        preflight::require_passed(&report)?;
    } else {
        report.print();
        if !report.is_ready() {
            println!("Some checks failed. Use --strict to exit with an error.");
        }
    }
    Ok(())
}
