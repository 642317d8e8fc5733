//! Individual preflight checks.

use std::path::Path;

use crate::assets::{AssetStore, TOOLSET_ASSET};
use crate::device::DeviceInfo;
use crate::flash::BRIDGE_ASSET;
use crate::probe::{probe_asset, CompatibilityResult};
use crate::process;
use crate::status::KnownIssue;

use super::types::Check;

pub fn check_privileged_shell(su_binary: &str) -> Check {
    match process::which(su_binary) {
        Some(path) => Check::ready_with("privileged shell", &path.display().to_string()),
        None => Check::blocker(
            "privileged shell",
            &format!("'{}' not found in PATH. The device must be rooted.", su_binary),
        ),
    }
}

/// Bundled binaries this device will need.
pub fn check_assets(assets: &dyn AssetStore, device: &DeviceInfo) -> Vec<Check> {
    let mut results = Vec::new();
    let folder = device.asset_folder();

    let toolset = format!("{}{}", folder, TOOLSET_ASSET);
    results.push(check_asset(assets, "toolset", &toolset));

    match probe_asset(device.sdk, folder) {
        Some(probe) => results.push(check_asset(assets, "probe binary", &probe)),
        None if device.is_legacy() => results.push(Check::blocker(
            "probe binary",
            &format!("No app_process build for SDK {}", device.sdk),
        )),
        None => results.push(Check::not_applicable(
            "probe binary",
            &format!("not needed on SDK {}", device.sdk),
        )),
    }

    if device.is_legacy() {
        results.push(check_asset(assets, "bridge jar", BRIDGE_ASSET));
    } else {
        results.push(Check::not_applicable("bridge jar", "shipped inside the flashable payload"));
    }

    results
}

fn check_asset(assets: &dyn AssetStore, label: &'static str, name: &str) -> Check {
    if assets.has_asset(name) {
        Check::ready_with(label, name)
    } else {
        Check::blocker(label, format!("Asset '{}' is not bundled", name))
    }
}

pub fn check_compatibility(device: &DeviceInfo, compat: &CompatibilityResult) -> Check {
    if compat.is_compatible() {
        return Check::ready_with(
            "compatibility",
            &format!("SDK {} on {}", device.sdk, device.arch()),
        );
    }
    let mut details = format!("SDK {} on {} is not supported", device.sdk, device.abi);
    if !compat.diagnostics().is_empty() {
        details.push_str(" (");
        details.push_str(&compat.diagnostics().join("; "));
        details.push(')');
    }
    Check::blocker("compatibility", &details)
}

pub fn check_known_issues(root: &Path) -> Check {
    match KnownIssue::detect(root, None) {
        Some(issue) => Check::caution("known issues", &issue.banner()),
        None => Check::ready("known issues"),
    }
}

pub fn check_recovery_dir(recovery_dir: &Path) -> Check {
    if recovery_dir.is_dir() {
        Check::ready_with("recovery directory", &recovery_dir.display().to_string())
    } else {
        Check::caution(
            "recovery directory",
            &format!("{} not visible without root; it is created when needed", recovery_dir.display()),
        )
    }
}
