//! Preflight checks before installing.
//!
//! Validates root, bundled assets and device compatibility.
//! Run with `xpinstall preflight` to check everything is ready.

mod checks;
mod types;

use std::path::Path;

use anyhow::{bail, Result};

use crate::assets::AssetStore;
use crate::config::Config;
use crate::device::DeviceInfo;
use crate::probe::CompatibilityResult;

pub use types::{Check, PreflightReport, Verdict};

/// Run all preflight checks. `root` is the filesystem root known issues are
/// looked up under.
pub fn run_preflight(
    config: &Config,
    assets: &dyn AssetStore,
    device: &DeviceInfo,
    compat: &CompatibilityResult,
    root: &Path,
) -> PreflightReport {
    let mut results = Vec::new();

    println!("Running preflight checks...\n");

    println!("Checking root...");
    results.push(checks::check_privileged_shell(&config.su_binary));

    println!("Checking bundled assets...");
    results.extend(checks::check_assets(assets, device));

    println!("Checking device...");
    results.push(checks::check_compatibility(device, compat));
    results.push(checks::check_known_issues(root));
    results.push(checks::check_recovery_dir(&config.recovery_dir));

    println!();

    PreflightReport { checks: results }
}

/// Print the report and bail if any check failed.
pub fn require_passed(report: &PreflightReport) -> Result<()> {
    report.print();

    if !report.is_ready() {
        bail!(
            "Preflight failed: {} check(s) failed. Fix the issues above before installing.",
            report.tally(Verdict::Blocker)
        );
    }

    println!("All preflight checks passed!\n");
    Ok(())
}
