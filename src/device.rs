//! What we know about the device we're running on.

use std::fmt;
use std::path::Path;

use crate::config::Config;
use crate::process;

/// Normalised CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    Arm,
    Arm64,
    X86,
    X86_64,
}

impl Arch {
    /// Map an ABI string (`armeabi-v7a`, `arm64-v8a`, `x86`, ...) to an arch.
    pub fn from_abi(abi: &str) -> Self {
        match abi {
            "x86" => Arch::X86,
            "x86_64" => Arch::X86_64,
            abi if abi.starts_with("arm64") => Arch::Arm64,
            _ => Arch::Arm,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Arch::Arm => "arm",
            Arch::Arm64 => "arm64",
            Arch::X86 => "x86",
            Arch::X86_64 => "x86_64",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub sdk: u32,
    pub abi: String,
    pub manufacturer: String,
}

impl DeviceInfo {
    pub fn new(sdk: u32, abi: impl Into<String>, manufacturer: impl Into<String>) -> Self {
        Self {
            sdk,
            abi: abi.into(),
            manufacturer: manufacturer.into(),
        }
    }

    /// Read build properties, preferring the overrides in `config`.
    pub fn detect(config: &Config) -> anyhow::Result<Self> {
        let sdk = match config.sdk_override {
            Some(sdk) => sdk,
            None => {
                let raw = process::getprop("ro.build.version.sdk").ok_or_else(|| {
                    anyhow::anyhow!(
                        "Could not read ro.build.version.sdk. Not on a device? Set XPINSTALL_SDK."
                    )
                })?;
                raw.parse()
                    .map_err(|_| anyhow::anyhow!("Unexpected SDK version '{}'", raw))?
            }
        };

        let abi = config
            .abi_override
            .clone()
            .or_else(|| process::getprop("ro.product.cpu.abi"))
            .unwrap_or_else(|| "armeabi-v7a".to_string());

        let manufacturer = config
            .manufacturer_override
            .clone()
            .or_else(|| process::getprop("ro.product.manufacturer"))
            .unwrap_or_default();

        Ok(Self::new(sdk, abi, manufacturer))
    }

    pub fn arch(&self) -> Arch {
        Arch::from_abi(&self.abi)
    }

    /// Asset folder holding the native binaries for this CPU.
    pub fn asset_folder(&self) -> &'static str {
        if self.abi.starts_with("x86") {
            "x86/"
        } else {
            "arm/"
        }
    }

    pub fn is_legacy(&self) -> bool {
        self.sdk <= crate::probe::LEGACY_MAX_SDK
    }

    /// Vendor UI framework, shown in the help text because those ROMs need
    /// vendor-specific installers.
    pub fn ui_framework(&self, root: &Path) -> Option<&'static str> {
        let has = |rel: &str| root.join(rel).exists();
        if self.manufacturer.eq_ignore_ascii_case("samsung") && has("system/framework/twframework.jar") {
            return Some("Samsung TouchWiz");
        }
        if self.manufacturer.eq_ignore_ascii_case("xiaomi")
            && has("system/framework/framework-miui-res.apk")
        {
            return Some("Xiaomi MIUI");
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn arch_from_abi() {
        assert_eq!(Arch::from_abi("x86"), Arch::X86);
        assert_eq!(Arch::from_abi("x86_64"), Arch::X86_64);
        assert_eq!(Arch::from_abi("arm64-v8a"), Arch::Arm64);
        assert_eq!(Arch::from_abi("armeabi-v7a"), Arch::Arm);
        assert_eq!(Arch::from_abi("mips"), Arch::Arm);
    }

    #[test]
    fn asset_folder_by_abi() {
        assert_eq!(DeviceInfo::new(19, "x86", "").asset_folder(), "x86/");
        assert_eq!(DeviceInfo::new(19, "x86_64", "").asset_folder(), "x86/");
        assert_eq!(DeviceInfo::new(19, "armeabi-v7a", "").asset_folder(), "arm/");
    }

    #[test]
    fn detect_uses_overrides() {
        let vars: HashMap<String, String> = [
            ("XPINSTALL_SDK", "18"),
            ("XPINSTALL_ABI", "x86"),
            ("XPINSTALL_MANUFACTURER", "samsung"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let config = Config::from_vars(&vars, Path::new("/"));

        let device = DeviceInfo::detect(&config).unwrap();
        assert_eq!(device, DeviceInfo::new(18, "x86", "samsung"));
        assert!(device.is_legacy());
    }

    #[test]
    fn ui_framework_needs_vendor_and_file() {
        let root = TempDir::new().unwrap();
        let samsung = DeviceInfo::new(21, "arm64-v8a", "SAMSUNG");
        assert_eq!(samsung.ui_framework(root.path()), None);

        fs::create_dir_all(root.path().join("system/framework")).unwrap();
        fs::write(root.path().join("system/framework/twframework.jar"), "").unwrap();
        assert_eq!(samsung.ui_framework(root.path()), Some("Samsung TouchWiz"));

        let other = DeviceInfo::new(21, "arm64-v8a", "google");
        assert_eq!(other.ui_framework(root.path()), None);
    }
}
