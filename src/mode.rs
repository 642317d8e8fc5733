//! Install mode, kept as a closed enum everywhere except the settings file.

use std::fmt;

/// How a staged payload gets applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstallMode {
    /// Stage the payload and reboot into recovery right away.
    #[default]
    Normal,
    /// Same as `Normal`, but named for users who picked recovery flashing.
    RecoveryAuto,
    /// Stage the payload and leave the reboot to the user.
    RecoveryManual,
}

impl InstallMode {
    pub const ALL: [InstallMode; 3] = [
        InstallMode::Normal,
        InstallMode::RecoveryAuto,
        InstallMode::RecoveryManual,
    ];

    /// Map a persisted integer to a mode. Anything unknown is `Normal`.
    pub fn resolve(stored: i64) -> Self {
        match stored {
            1 => InstallMode::RecoveryAuto,
            2 => InstallMode::RecoveryManual,
            _ => InstallMode::Normal,
        }
    }

    /// Integer written back to the settings file.
    pub fn stored(self) -> i64 {
        match self {
            InstallMode::Normal => 0,
            InstallMode::RecoveryAuto => 1,
            InstallMode::RecoveryManual => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            InstallMode::Normal => "Normal",
            InstallMode::RecoveryAuto => "Recovery (flash zip automatically)",
            InstallMode::RecoveryManual => "Recovery (flash zip manually)",
        }
    }

    /// Whether a declined reboot should undo the staging.
    pub fn applies_automatically(self) -> bool {
        !matches!(self, InstallMode::RecoveryManual)
    }
}

impl fmt::Display for InstallMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
