//! Root shell session against a real `sh` standing in for `su`.

mod helpers;

use std::sync::Arc;

use helpers::TestEnv;
use serial_test::serial;
use xpinstall::assets::{AssetStore, DirAssetStore, Toolset};
use xpinstall::flash::{FlashLayout, RebootAction, RebootController, RebootOutcome};
use xpinstall::messages;
use xpinstall::shell::{AcquisitionError, PrivilegedShell, RootShellSession, SessionConfig, ShellError, ShellState};
use xpinstall::transcript::Transcript;

fn session(env: &TestEnv, program: &str) -> RootShellSession {
    let store: Arc<dyn AssetStore> = Arc::new(DirAssetStore::new(&env.assets, &env.cache));
    RootShellSession::new(SessionConfig::new(program), Toolset::for_folder(store, "arm/"))
}

#[test]
#[serial]
fn execute_captures_output_and_exit_code() {
    let env = TestEnv::new();
    let mut shell = session(&env, "sh");

    shell.acquire().unwrap();
    assert_eq!(shell.state(), ShellState::Started);

    let outcome = shell.execute("echo one; echo two >&2", false).unwrap();
    assert!(outcome.success());
    assert_eq!(outcome.transcript, vec!["one", "two"]);

    let failed = shell.execute("exit_with() { return $1; }; exit_with 3", false).unwrap();
    assert_eq!(failed.exit_code, 3);
    assert!(failed.transcript.is_empty());

    shell.dispose();
    assert_eq!(shell.state(), ShellState::Terminated);
}

#[test]
#[serial]
fn commands_share_one_process() {
    let env = TestEnv::new();
    let mut shell = session(&env, "sh");

    shell.execute("XP_MARK=kept", false).unwrap();
    let outcome = shell.execute("echo $XP_MARK", false).unwrap();
    assert_eq!(outcome.transcript, vec!["kept"]);
}

#[test]
#[serial]
fn missing_output_newline_still_terminates() {
    let env = TestEnv::new();
    let mut shell = session(&env, "sh");

    let outcome = shell.execute("printf partial", false).unwrap();
    assert_eq!(outcome.exit_code, 0);
    assert_eq!(outcome.transcript, vec!["partial"]);
}

#[test]
#[serial]
fn toolset_is_extracted_used_and_removed() {
    let env = TestEnv::new();
    env.script_asset("arm/busybox-xposed", "echo \"toolset:$1\"\nexec \"$@\"");
    let mut shell = session(&env, "sh");

    let outcome = shell.execute("echo hello", true).unwrap();
    assert_eq!(outcome.transcript, vec!["toolset:echo", "hello"]);

    let toolset = env.cache.join("busybox-xposed");
    assert!(toolset.is_file());
    shell.remove_toolset();
    assert!(!toolset.exists());
    // Removing twice is fine.
    shell.remove_toolset();
}

#[test]
#[serial]
fn toolset_path_with_spaces_is_quoted() {
    let env = TestEnv::new();
    env.script_asset("arm/busybox-xposed", "exec \"$@\"");
    let cache = env.base_dir.join("app cache");
    let store: Arc<dyn AssetStore> = Arc::new(DirAssetStore::new(&env.assets, &cache));
    let mut shell = RootShellSession::new(SessionConfig::new("sh"), Toolset::for_folder(store, "arm/"));

    let outcome = shell.execute("echo spaced", true).unwrap();
    assert!(outcome.success(), "transcript: {:?}", outcome.transcript);
    assert_eq!(outcome.transcript, vec!["spaced"]);
    assert!(cache.join("busybox-xposed").is_file());
}

#[test]
#[serial]
fn missing_toolset_asset_is_an_error() {
    let env = TestEnv::new();
    let mut shell = session(&env, "sh");

    let err = shell.execute("mkdir /nonexistent", true).unwrap_err();
    assert!(matches!(err, ShellError::Toolset(_)));
    // The session itself is still usable.
    assert!(shell.execute("true", false).unwrap().success());
}

#[test]
#[serial]
fn spawn_failure_is_distinct_from_denial() {
    let env = TestEnv::new();
    let mut shell = session(&env, "/nonexistent/su");

    let err = shell.acquire().unwrap_err();
    assert!(matches!(err, AcquisitionError::Spawn { .. }));
}

#[test]
#[serial]
fn shell_that_exits_immediately_is_denied() {
    let env = TestEnv::new();
    let mut shell = session(&env, "false");

    let err = shell.acquire().unwrap_err();
    assert!(matches!(err, AcquisitionError::Denied(_)));
    assert_eq!(shell.state(), ShellState::Terminated);
    assert!(matches!(shell.execute("true", false), Err(ShellError::Terminated)));
}

#[test]
#[serial]
fn shell_exiting_mid_sequence_is_an_io_error() {
    let env = TestEnv::new();
    let mut shell = session(&env, "sh");

    let err = shell.execute("exit 0", false).unwrap_err();
    assert!(matches!(err, ShellError::Io(_)));
    assert_eq!(shell.state(), ShellState::Terminated);
}

#[test]
#[serial]
fn dispose_is_idempotent() {
    let env = TestEnv::new();
    let mut shell = session(&env, "sh");

    shell.dispose();
    shell.acquire().unwrap();
    shell.dispose();
    shell.dispose();
    assert_eq!(shell.state(), ShellState::Terminated);
}

#[test]
#[serial]
fn reboot_without_toolset_reports_failure_in_transcript() {
    let env = TestEnv::new();
    let mut shell = session(&env, "sh");
    let layout = FlashLayout::new(env.base_dir.join("recovery"), env.base_dir.join("framework"));
    let mut log = Transcript::new();

    let outcome = RebootController::new(&mut shell, &layout)
        .perform(&RebootAction::Reboot, &mut log)
        .unwrap();

    assert_eq!(outcome, RebootOutcome::Failed);
    assert!(log.contains("toolset unavailable"));
    assert_eq!(log.lines().last().unwrap(), &messages::reboot_failed());
}
