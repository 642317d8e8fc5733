//! Compatibility probe with shell scripts standing in for app_process builds.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use helpers::TestEnv;
use serial_test::serial;
use xpinstall::assets::{AssetStore, DirAssetStore};
use xpinstall::device::DeviceInfo;
use xpinstall::probe::CompatibilityProbe;

fn probe(env: &TestEnv, timeout: Duration) -> CompatibilityProbe {
    let store: Arc<dyn AssetStore> = Arc::new(DirAssetStore::new(&env.assets, &env.cache));
    CompatibilityProbe::new(store, timeout)
}

#[tokio::test]
#[serial]
async fn healthy_binary_is_compatible() {
    let env = TestEnv::new();
    env.script_asset(
        "arm/app_process_xposed_sdk19",
        "[ \"$1\" = --xposedversion ] || exit 9\necho 'Xposed version: 89'",
    );

    let result = probe(&env, Duration::from_secs(10))
        .run(&DeviceInfo::new(19, "armeabi-v7a", "Google"))
        .await;

    assert!(result.is_compatible());
    assert!(result.diagnostics().is_empty());
    assert!(!env.cache.join("app_process").exists(), "probe binary is always deleted");
}

#[tokio::test]
#[serial]
async fn stderr_is_collected_when_probe_fails() {
    let env = TestEnv::new();
    env.script_asset(
        "x86/app_process_xposed_sdk16",
        "echo 'CANNOT LINK EXECUTABLE' >&2\necho 'libdvm.so missing symbol' >&2\nexit 1",
    );

    let result = probe(&env, Duration::from_secs(10))
        .run(&DeviceInfo::new(17, "x86", "Asus"))
        .await;

    assert!(!result.is_compatible());
    assert_eq!(
        result.diagnostics(),
        &["CANNOT LINK EXECUTABLE".to_string(), "libdvm.so missing symbol".to_string()]
    );
    assert!(!env.cache.join("app_process").exists());
}

#[tokio::test]
#[serial]
async fn wrong_first_line_is_incompatible() {
    let env = TestEnv::new();
    env.script_asset("arm/app_process_xposed_sdk15", "echo 'usage: app_process'\necho 'Xposed version: 89'");

    let result = probe(&env, Duration::from_secs(10))
        .run(&DeviceInfo::new(15, "armeabi", "HTC"))
        .await;

    assert!(!result.is_compatible());
    assert!(result.diagnostics().is_empty());
}

#[tokio::test]
#[serial]
async fn hanging_binary_times_out() {
    let env = TestEnv::new();
    env.script_asset("arm/app_process_xposed_sdk16", "exec sleep 30");

    let result = probe(&env, Duration::from_millis(300))
        .run(&DeviceInfo::new(16, "armeabi-v7a", "Sony"))
        .await;

    assert!(!result.is_compatible());
    assert_eq!(result.diagnostics().len(), 1);
    assert!(result.diagnostics()[0].contains("did not answer"));
    assert!(!env.cache.join("app_process").exists());
}

#[tokio::test]
#[serial]
async fn missing_asset_is_a_diagnostic() {
    let env = TestEnv::new();

    let result = probe(&env, Duration::from_secs(10))
        .run(&DeviceInfo::new(18, "armeabi-v7a", "Sony"))
        .await;

    assert!(!result.is_compatible());
    assert!(result.diagnostics()[0].contains("app_process_xposed_sdk16"));
}

#[tokio::test]
#[serial]
async fn modern_sdk_is_not_probed() {
    let env = TestEnv::new();

    let result = probe(&env, Duration::from_secs(10))
        .run(&DeviceInfo::new(21, "arm64-v8a", "Google"))
        .await;

    assert!(result.is_compatible());
    assert!(result.diagnostics().is_empty());
    assert!(!env.cache.exists(), "nothing is materialized");
}
