//! Configuration management for xpinstall.
//!
//! Reads configuration from environment variables. `main` loads `.env`
//! into the environment first; variables already set win over the file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Data directory the framework itself reads its bridge and flags from.
pub const DEFAULT_FRAMEWORK_DIR: &str = "/data/data/de.robv.android.xposed.installer";

/// Canonical recovery staging directory.
pub const DEFAULT_RECOVERY_DIR: &str = "/cache/recovery";

/// Property file written by the installed framework.
pub const DEFAULT_PROP_FILE: &str = "/system/xposed.prop";

const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;

/// xpinstall configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Program that opens the privileged shell (default: su)
    pub su_binary: String,
    /// Root of the bundled assets (probe binaries, toolset, bridge jar)
    pub asset_dir: PathBuf,
    /// Framework data directory (bin/, conf/)
    pub framework_dir: PathBuf,
    /// Writable scratch directory for materialized binaries
    pub cache_dir: PathBuf,
    /// Recovery staging directory
    pub recovery_dir: PathBuf,
    /// Upper bound on a compatibility probe run
    pub probe_timeout: Duration,
    /// Persisted preferences file
    pub settings_path: PathBuf,
    /// Installed framework property file
    pub prop_file: PathBuf,
    /// Device overrides for running off-device
    pub sdk_override: Option<u32>,
    pub abi_override: Option<String>,
    pub manufacturer_override: Option<String>,
}

impl Config {
    /// Load configuration from the process environment. Relative paths
    /// resolve against `base_dir`.
    pub fn load(base_dir: &Path) -> Self {
        let env_vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(&env_vars, base_dir)
    }

    /// Build a configuration from an explicit variable map.
    pub fn from_vars(vars: &HashMap<String, String>, base_dir: &Path) -> Self {
        let path_var = |key: &str, default: PathBuf| -> PathBuf {
            vars.get(key)
                .map(|s| {
                    let path = PathBuf::from(s);
                    if path.is_absolute() {
                        path
                    } else {
                        base_dir.join(path)
                    }
                })
                .unwrap_or(default)
        };

        let framework_dir = path_var("XPINSTALL_FRAMEWORK_DIR", PathBuf::from(DEFAULT_FRAMEWORK_DIR));
        let cache_dir = path_var("XPINSTALL_CACHE_DIR", framework_dir.join("cache"));

        let settings_path = path_var(
            "XPINSTALL_SETTINGS",
            dirs::config_dir()
                .unwrap_or_else(|| base_dir.to_path_buf())
                .join("xpinstall/settings.json"),
        );

        let probe_timeout = vars
            .get("XPINSTALL_PROBE_TIMEOUT")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS));

        Self {
            su_binary: vars
                .get("XPINSTALL_SU")
                .cloned()
                .unwrap_or_else(|| "su".to_string()),
            asset_dir: path_var("XPINSTALL_ASSETS", base_dir.join("assets")),
            framework_dir,
            cache_dir,
            recovery_dir: path_var("XPINSTALL_RECOVERY_DIR", PathBuf::from(DEFAULT_RECOVERY_DIR)),
            probe_timeout,
            settings_path,
            prop_file: path_var("XPINSTALL_PROP", PathBuf::from(DEFAULT_PROP_FILE)),
            sdk_override: vars
                .get("XPINSTALL_SDK")
                .and_then(|s| s.trim().parse().ok()),
            abi_override: vars.get("XPINSTALL_ABI").cloned(),
            manufacturer_override: vars.get("XPINSTALL_MANUFACTURER").cloned(),
        }
    }

    /// Flag file whose presence deactivates the installed framework.
    pub fn disable_flag(&self) -> PathBuf {
        self.framework_dir.join("conf/disabled")
    }

    /// Print configuration for debugging.
    pub fn print(&self) {
        println!("Configuration:");
        println!("  XPINSTALL_SU: {}", self.su_binary);
        println!("  XPINSTALL_ASSETS: {}", self.asset_dir.display());
        println!("  XPINSTALL_FRAMEWORK_DIR: {}", self.framework_dir.display());
        println!("  XPINSTALL_CACHE_DIR: {}", self.cache_dir.display());
        println!("  XPINSTALL_RECOVERY_DIR: {}", self.recovery_dir.display());
        println!("  XPINSTALL_PROBE_TIMEOUT: {}s", self.probe_timeout.as_secs());
        println!("  XPINSTALL_SETTINGS: {}", self.settings_path.display());
        println!("  XPINSTALL_PROP: {}", self.prop_file.display());
        if let Some(sdk) = self.sdk_override {
            println!("  XPINSTALL_SDK: {}", sdk);
        }
        if let Some(abi) = &self.abi_override {
            println!("  XPINSTALL_ABI: {}", abi);
        }
        if self.asset_dir.is_dir() {
            println!("  Assets: FOUND");
        } else {
            println!("  Assets: NOT FOUND (set XPINSTALL_ASSETS)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(&HashMap::new(), Path::new("/opt/xp"));
        assert_eq!(config.su_binary, "su");
        assert_eq!(config.recovery_dir, PathBuf::from("/cache/recovery"));
        assert_eq!(config.asset_dir, PathBuf::from("/opt/xp/assets"));
        assert_eq!(config.probe_timeout, Duration::from_secs(10));
        assert_eq!(
            config.disable_flag(),
            PathBuf::from(DEFAULT_FRAMEWORK_DIR).join("conf/disabled")
        );
        assert!(config.sdk_override.is_none());
    }

    #[test]
    fn test_relative_paths_resolve_against_base() {
        let config = Config::from_vars(
            &vars(&[("XPINSTALL_ASSETS", "bundle"), ("XPINSTALL_CACHE_DIR", "/tmp/xpc")]),
            Path::new("/opt/xp"),
        );
        assert_eq!(config.asset_dir, PathBuf::from("/opt/xp/bundle"));
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/xpc"));
    }

    #[test]
    fn test_overrides_parse() {
        let config = Config::from_vars(
            &vars(&[
                ("XPINSTALL_SDK", "19"),
                ("XPINSTALL_ABI", "x86"),
                ("XPINSTALL_PROBE_TIMEOUT", "3"),
                ("XPINSTALL_SU", "/system/xbin/su"),
            ]),
            Path::new("/"),
        );
        assert_eq!(config.sdk_override, Some(19));
        assert_eq!(config.abi_override.as_deref(), Some("x86"));
        assert_eq!(config.probe_timeout, Duration::from_secs(3));
        assert_eq!(config.su_binary, "/system/xbin/su");
    }

    #[test]
    fn test_bad_numbers_fall_back() {
        let config = Config::from_vars(
            &vars(&[("XPINSTALL_SDK", "kitkat"), ("XPINSTALL_PROBE_TIMEOUT", "soon")]),
            Path::new("/"),
        );
        assert!(config.sdk_override.is_none());
        assert_eq!(config.probe_timeout, Duration::from_secs(10));
    }
}
