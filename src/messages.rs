//! User-facing transcript lines.
//!
//! Every line that ends up in a transcript or a prompt is produced here so the
//! wording stays in one place.

use std::path::Path;

pub fn root_failed() -> String {
    "Could not obtain root access. Make sure the device is rooted and the request was granted."
        .to_string()
}

pub fn file_copying(what: impl std::fmt::Display) -> String {
    format!("Copying {}...", what)
}

pub fn file_extract_failed(name: &str) -> String {
    format!("Could not extract {} from the bundled assets", name)
}

pub fn file_creating_directory(dir: &Path) -> String {
    format!("Creating directory {}...", dir.display())
}

pub fn file_create_directory_failed(dir: &Path) -> String {
    format!("Could not create directory {}", dir.display())
}

pub fn file_copy_failed(source: &Path, dest: &Path) -> String {
    format!("Could not copy {} to {}", source.display(), dest.display())
}

pub fn file_writing_recovery_command() -> String {
    "Writing recovery command file...".to_string()
}

pub fn file_writing_recovery_command_failed() -> String {
    "Could not write the recovery command file".to_string()
}

pub fn phone_not_compatible(sdk: u32, abi: &str) -> String {
    format!(
        "Xposed is not (yet) compatible with Android SDK version {} or your processor architecture ({}).",
        sdk, abi
    )
}

pub fn auto_flash_note(file: &str) -> String {
    format!(
        "{} will be flashed automatically as soon as the device boots into recovery.",
        file
    )
}

pub fn manual_flash_note(file: &str) -> String {
    format!(
        "{} is staged in the recovery directory. Reboot into recovery and flash it manually.",
        file
    )
}

pub fn reboot_recovery_confirmation() -> String {
    "Do you want to reboot into recovery now?".to_string()
}

pub fn reboot_failed() -> String {
    "Reboot failed".to_string()
}

pub fn install_warning() -> String {
    "Installing or removing the framework modifies the system partition. \
     A bad payload can leave the device in a boot loop; make sure you have a backup."
        .to_string()
}

pub fn reboot_prompt() -> String {
    "Reboot the device now?".to_string()
}

pub fn reboot_recovery_prompt() -> String {
    "Reboot into recovery now?".to_string()
}

pub fn soft_reboot_prompt() -> String {
    "Restart the UI and zygote now (soft reboot)?".to_string()
}

pub fn download_ready(path: &Path) -> String {
    format!("Payload ready at {}", path.display())
}

pub fn framework_on_next_reboot() -> String {
    "The framework will be active after the next reboot.".to_string()
}

pub fn framework_off_next_reboot() -> String {
    "The framework will be disabled after the next reboot.".to_string()
}

pub fn known_issue(name: &str) -> String {
    format!("Known issue detected: {}", name)
}
