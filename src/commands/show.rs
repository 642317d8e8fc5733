//! Show command - displays information.

use anyhow::Result;

use crate::config::Config;
use crate::settings::{JsonSettingsStore, SettingsStore};

/// Show target for the show command.
pub enum ShowTarget {
    /// Show configuration
    Config,
    /// Show persisted preferences
    Settings,
}

/// Execute the show command.
pub fn cmd_show(target: ShowTarget, config: &Config) -> Result<()> {
    match target {
        ShowTarget::Config => config.print(),
        ShowTarget::Settings => JsonSettingsStore::new(&config.settings_path).load()?.print(),
    }
    Ok(())
}
