//! Preference commands: install mode, generic settings, disable toggle.

use anyhow::Result;

use crate::config::Config;
use crate::mode::InstallMode;
use crate::settings::{JsonSettingsStore, SettingsStore};
use crate::status;

/// Show the install mode, or store a new one.
pub fn cmd_mode(config: &Config, value: Option<i64>) -> Result<()> {
    let store = JsonSettingsStore::new(&config.settings_path);
    let mut settings = store.load()?;

    match value {
        None => {
            let current = settings.install_mode();
            for mode in InstallMode::ALL {
                let marker = if mode == current { "*" } else { " " };
                println!("{} {} {}", marker, mode.stored(), mode.label());
            }
        }
        Some(raw) => {
            let mode = InstallMode::resolve(raw);
            settings.set_install_mode(mode);
            store.save(&settings)?;
            println!("Install mode: {}", mode);
        }
    }
    Ok(())
}

pub fn cmd_set(config: &Config, key: &str, value: &str) -> Result<()> {
    let store = JsonSettingsStore::new(&config.settings_path);
    let mut settings = store.load()?;
    settings.set(key, value)?;
    store.save(&settings)?;
    settings.print();
    Ok(())
}

/// Flip the framework disable flag.
pub fn cmd_toggle(config: &Config) -> Result<()> {
    status::toggle_disabled(&config.disable_flag())?;
    Ok(())
}
