//! xpinstall - Xposed framework installer.
//!
//! Probes whether the framework can run on this device, stages flashable
//! payloads for the recovery through a persistent root shell, and issues
//! privileged reboots.
//!
//! See `tests/` for the scripted-shell scenarios that pin the flashing
//! sequence.

pub mod assets;
pub mod commands;
pub mod config;
pub mod confirm;
pub mod device;
pub mod flash;
pub mod installer;
pub mod manifest;
pub mod messages;
pub mod mode;
pub mod preflight;
pub mod probe;
pub mod process;
pub mod settings;
pub mod shell;
pub mod status;
pub mod task;
pub mod transcript;
