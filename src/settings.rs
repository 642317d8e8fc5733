//! Persisted preferences.
//!
//! Storage is plain JSON; the installer only reads and writes scalars.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::mode::InstallMode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Raw persisted value; read through [`Settings::install_mode`].
    pub install_mode: i64,
    pub confirm_reboots: bool,
    pub hide_install_warning: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            install_mode: InstallMode::Normal.stored(),
            confirm_reboots: true,
            hide_install_warning: false,
        }
    }
}

impl Settings {
    pub fn install_mode(&self) -> InstallMode {
        InstallMode::resolve(self.install_mode)
    }

    pub fn set_install_mode(&mut self, mode: InstallMode) {
        self.install_mode = mode.stored();
    }

    /// Apply a `key=value` style update from the CLI.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "install-mode" | "install_mode" => {
                let raw: i64 = value
                    .parse()
                    .with_context(|| format!("install-mode expects 0, 1 or 2, got '{}'", value))?;
                self.install_mode = raw;
            }
            "confirm-reboots" | "confirm_reboots" => self.confirm_reboots = parse_bool(value)?,
            "hide-install-warning" | "hide_install_warning" => {
                self.hide_install_warning = parse_bool(value)?
            }
            _ => bail!(
                "Unknown setting '{}'. Known: install-mode, confirm-reboots, hide-install-warning",
                key
            ),
        }
        Ok(())
    }

    pub fn print(&self) {
        println!("Settings:");
        println!("  install-mode: {} ({})", self.install_mode, self.install_mode());
        println!("  confirm-reboots: {}", self.confirm_reboots);
        println!("  hide-install-warning: {}", self.hide_install_warning);
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => bail!("Expected true/false, got '{}'", value),
    }
}

/// Key/value persistence for [`Settings`].
pub trait SettingsStore {
    fn load(&self) -> Result<Settings>;
    fn save(&self, settings: &Settings) -> Result<()>;
}

/// Settings kept in a JSON file.
#[derive(Debug, Clone)]
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonSettingsStore {
    /// A missing file yields defaults.
    fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            return Ok(Settings::default());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings in {}", self.path.display()))
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}
