//! Framework package manifest.
//!
//! A manifest lists installer and uninstaller payloads plus the latest
//! installer release. Which payloads are offered depends on the device.

use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::device::{Arch, DeviceInfo};
use crate::probe::LEGACY_MAX_SDK;

/// Version code of this installer, compared against [`Release::version`].
pub const VERSION_CODE: &str = "1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallerPackage {
    pub name: String,
    pub link: String,
    pub architecture: String,
    pub sdk: u32,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UninstallerPackage {
    pub name: String,
    pub link: String,
    pub architecture: String,
    /// `yyyyMMdd`
    #[serde(default)]
    pub date: String,
}

impl UninstallerPackage {
    /// Date as `yyyy-mm-dd` when it has the expected shape.
    pub fn display_date(&self) -> String {
        let d = &self.date;
        if d.len() == 8 && d.bytes().all(|b| b.is_ascii_digit()) {
            format!("{}-{}-{}", &d[..4], &d[4..6], &d[6..])
        } else {
            d.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub version: String,
    pub link: String,
    #[serde(default)]
    pub changelog: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default, rename = "installer")]
    pub installers: Vec<InstallerPackage>,
    #[serde(default, rename = "uninstaller")]
    pub uninstallers: Vec<UninstallerPackage>,
    #[serde(default, rename = "apk")]
    pub release: Option<Release>,
}

/// Packages offered for one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Nothing fits this device.
    NotCompatible,
    Offered {
        installers: Vec<InstallerPackage>,
        uninstallers: Vec<UninstallerPackage>,
        /// Preselected index into both lists.
        default_index: usize,
    },
}

impl Manifest {
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse package manifest")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn installers_for_sdk(&self, sdk: u32) -> Vec<InstallerPackage> {
        self.installers.iter().filter(|i| i.sdk == sdk).cloned().collect()
    }

    pub fn select(&self, device: &DeviceInfo) -> Selection {
        let installers = self.installers_for_sdk(device.sdk);
        if installers.is_empty() || self.uninstallers.is_empty() {
            return Selection::NotCompatible;
        }

        if device.sdk <= LEGACY_MAX_SDK {
            // Legacy devices get one installer and the newest uninstaller.
            let first = installers[..1].to_vec();
            let last = self.uninstallers[self.uninstallers.len() - 1..].to_vec();
            return Selection::Offered {
                installers: first,
                uninstallers: last,
                default_index: 0,
            };
        }

        let wanted = arch_index(device.arch(), device.sdk);
        Selection::Offered {
            default_index: wanted.min(installers.len() - 1),
            installers,
            uninstallers: self.uninstallers.clone(),
        }
    }

    /// Whether the manifest's release is newer than `current`.
    pub fn update_available(&self, current: &str) -> bool {
        self.release
            .as_ref()
            .map(|r| compare_versions(current, &r.version) == Some(Ordering::Less))
            .unwrap_or(false)
    }
}

fn arch_index(arch: Arch, sdk: u32) -> usize {
    match arch {
        Arch::Arm64 | Arch::X86_64 => 1,
        Arch::X86 if sdk > LEGACY_MAX_SDK => 2,
        _ => 0,
    }
}

/// Compare two decimal version codes of any length.
/// `None` when either is not a plain non-negative integer.
pub fn compare_versions(a: &str, b: &str) -> Option<Ordering> {
    let a = normalize_digits(a)?;
    let b = normalize_digits(b)?;
    Some(a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
}

fn normalize_digits(s: &str) -> Option<&str> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let trimmed = s.trim_start_matches('0');
    Some(if trimmed.is_empty() { "0" } else { trimmed })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"{
        "installer": [
            {"link": "https://dl/xp-21-arm.zip", "name": "xposed-v89-sdk21-arm", "architecture": "arm", "sdk": 21, "version": "89"},
            {"link": "https://dl/xp-21-arm64.zip", "name": "xposed-v89-sdk21-arm64", "architecture": "arm64", "sdk": 21, "version": "89"},
            {"link": "https://dl/xp-21-x86.zip", "name": "xposed-v89-sdk21-x86", "architecture": "x86", "sdk": 21, "version": "89"},
            {"link": "https://dl/xp-19.zip", "name": "xposed-v58", "architecture": "arm", "sdk": 19, "version": "58"},
            {"link": "https://dl/xp-19b.zip", "name": "xposed-v58b", "architecture": "arm", "sdk": 19, "version": "58"}
        ],
        "uninstaller": [
            {"link": "https://dl/un-1.zip", "name": "uninstaller-old", "architecture": "arm", "date": "20150101"},
            {"link": "https://dl/un-2.zip", "name": "uninstaller-new", "architecture": "arm", "date": "20161231"}
        ],
        "apk": {"version": "12", "link": "https://dl/app.apk", "changelog": "fixes"}
    }"#;

    #[test]
    fn modern_device_gets_full_lists_and_arch_index() {
        let manifest = Manifest::parse(MANIFEST).unwrap();
        let device = DeviceInfo::new(21, "arm64-v8a", "Google");
        match manifest.select(&device) {
            Selection::Offered {
                installers,
                uninstallers,
                default_index,
            } => {
                assert_eq!(installers.len(), 3);
                assert_eq!(uninstallers.len(), 2);
                assert_eq!(default_index, 1);
            }
            other => panic!("unexpected selection: {:?}", other),
        }

        let x86 = DeviceInfo::new(21, "x86", "Asus");
        assert!(matches!(manifest.select(&x86), Selection::Offered { default_index: 2, .. }));
    }

    #[test]
    fn legacy_device_gets_first_installer_and_last_uninstaller() {
        let manifest = Manifest::parse(MANIFEST).unwrap();
        let device = DeviceInfo::new(19, "x86", "Asus");
        match manifest.select(&device) {
            Selection::Offered {
                installers,
                uninstallers,
                default_index,
            } => {
                assert_eq!(installers.len(), 1);
                assert_eq!(installers[0].name, "xposed-v58");
                assert_eq!(uninstallers.len(), 1);
                assert_eq!(uninstallers[0].name, "uninstaller-new");
                assert_eq!(default_index, 0);
            }
            other => panic!("unexpected selection: {:?}", other),
        }
    }

    #[test]
    fn default_index_is_clamped() {
        let mut manifest = Manifest::parse(MANIFEST).unwrap();
        manifest.installers.retain(|i| i.architecture == "arm");
        let device = DeviceInfo::new(21, "x86", "Asus");
        assert!(matches!(manifest.select(&device), Selection::Offered { default_index: 0, .. }));
    }

    #[test]
    fn unknown_sdk_or_no_uninstallers_is_not_compatible() {
        let manifest = Manifest::parse(MANIFEST).unwrap();
        assert_eq!(manifest.select(&DeviceInfo::new(26, "arm64-v8a", "x")), Selection::NotCompatible);

        let mut no_uninstallers = manifest.clone();
        no_uninstallers.uninstallers.clear();
        assert_eq!(no_uninstallers.select(&DeviceInfo::new(21, "armeabi-v7a", "x")), Selection::NotCompatible);
    }

    #[test]
    fn version_comparison_handles_long_numbers() {
        assert_eq!(compare_versions("9", "10"), Some(Ordering::Less));
        assert_eq!(compare_versions("0010", "10"), Some(Ordering::Equal));
        assert_eq!(
            compare_versions("123456789012345678901234567890", "123456789012345678901234567889"),
            Some(Ordering::Greater)
        );
        assert_eq!(compare_versions("1.2", "3"), None);
    }

    #[test]
    fn update_check() {
        let manifest = Manifest::parse(MANIFEST).unwrap();
        assert!(manifest.update_available("11"));
        assert!(!manifest.update_available("12"));
        assert!(!Manifest::default().update_available("1"));
        assert_eq!(manifest.uninstallers[1].display_date(), "2016-12-31");
    }
}
