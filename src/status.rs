//! Installed framework state: version, disable flag, known ROM issues.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::messages;
use crate::transcript::Transcript;

/// Parse `key=value` lines of `xposed.prop`. Missing file means empty.
pub fn read_prop_file(path: &Path) -> HashMap<String, String> {
    let Ok(content) = fs::read_to_string(path) else {
        return HashMap::new();
    };
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallStatus {
    NotInstalled,
    Active(String),
    /// Installed, but the disable flag is set.
    Inactive(String),
}

impl InstallStatus {
    pub fn evaluate(installed: Option<&str>, disabled: bool) -> Self {
        match installed {
            None => InstallStatus::NotInstalled,
            Some(version) if disabled => InstallStatus::Inactive(version.to_string()),
            Some(version) => InstallStatus::Active(version.to_string()),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            InstallStatus::NotInstalled => "Xposed framework is not installed".to_string(),
            InstallStatus::Active(v) => format!("Xposed framework version {} is active", v),
            InstallStatus::Inactive(v) => {
                format!("Xposed framework version {} is installed, but not active", v)
            }
        }
    }
}

/// Read install status from the prop file and disable flag.
pub fn install_status(prop_file: &Path, disable_flag: &Path) -> InstallStatus {
    let props = read_prop_file(prop_file);
    InstallStatus::evaluate(props.get("version").map(String::as_str), disable_flag.exists())
}

/// Flip the disable flag. Returns true when the framework will be enabled
/// after the next reboot.
pub fn toggle_disabled(disable_flag: &Path) -> Result<bool> {
    if disable_flag.exists() {
        fs::remove_file(disable_flag)
            .with_context(|| format!("Failed to remove {}", disable_flag.display()))?;
        println!("{}", messages::framework_on_next_reboot());
        Ok(true)
    } else {
        if let Some(parent) = disable_flag.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::File::create(disable_flag)
            .with_context(|| format!("Failed to create {}", disable_flag.display()))?;
        println!("{}", messages::framework_off_next_reboot());
        Ok(false)
    }
}

/// ROM quirks known to break the framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownIssue {
    AliyunOs,
    MiuiDexspy,
    SegmentationFault,
}

impl KnownIssue {
    pub fn name(self) -> &'static str {
        match self {
            KnownIssue::AliyunOs => "Aliyun OS",
            KnownIssue::MiuiDexspy => "MIUI/Dexspy",
            KnownIssue::SegmentationFault => "Segmentation fault",
        }
    }

    pub fn link(self) -> &'static str {
        match self {
            KnownIssue::AliyunOs => "http://forum.xda-developers.com/showpost.php?p=52289793&postcount=5",
            KnownIssue::MiuiDexspy => "http://forum.xda-developers.com/showpost.php?p=52291098&postcount=6",
            KnownIssue::SegmentationFault => {
                "http://forum.xda-developers.com/showpost.php?p=52292102&postcount=7"
            }
        }
    }

    pub fn banner(self) -> String {
        format!("{} ({})", messages::known_issue(self.name()), self.link())
    }

    /// First matching issue. `root` is the filesystem root, `last_transcript`
    /// the most recently displayed transcript.
    pub fn detect(root: &Path, last_transcript: Option<&Transcript>) -> Option<Self> {
        if root.join("system/framework/core.jar.jex").exists() {
            Some(KnownIssue::AliyunOs)
        } else if root.join("data/miui/DexspyInstaller.jar").exists() {
            Some(KnownIssue::MiuiDexspy)
        } else if last_transcript.is_some_and(Transcript::mentions_segfault) {
            Some(KnownIssue::SegmentationFault)
        } else {
            None
        }
    }
}
