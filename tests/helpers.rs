//! Shared test utilities for xpinstall tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::TempDir;
use xpinstall::assets::{AssetError, AssetStore};
use xpinstall::shell::{AcquisitionError, CommandOutcome, PrivilegedShell, ShellError, ShellState};

/// Test environment with temporary asset and cache directories.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    /// Bundled assets root
    pub assets: PathBuf,
    /// Scratch directory binaries are materialized into
    pub cache: PathBuf,
    pub base_dir: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let base = temp_dir.path();

        let assets = base.join("assets");
        let cache = base.join("cache");
        fs::create_dir_all(&assets).expect("Failed to create assets dir");

        Self {
            assets,
            cache,
            base_dir: base.to_path_buf(),
            _temp_dir: temp_dir,
        }
    }

    /// Add an executable shell script as asset `name`.
    pub fn script_asset(&self, name: &str, body: &str) -> PathBuf {
        let path = self.assets.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("Failed to write script");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }
}

enum Reply {
    Exit(i32, Vec<String>),
    /// The shell dies; later commands see a terminated session.
    LoseChannel,
    /// The toolset cannot be extracted; the session stays usable.
    NoToolset,
}

/// Scripted response for commands starting with a prefix.
struct Response {
    prefix: String,
    reply: Reply,
}

/// [`PrivilegedShell`] that records every command and answers from a script.
/// Unscripted commands succeed with no output.
#[derive(Default)]
pub struct ScriptedShell {
    responses: Vec<Response>,
    deny: bool,
    state: Option<ShellState>,
    pub commands: Vec<(String, bool)>,
    pub acquisitions: usize,
    pub toolset_removals: usize,
    pub disposed: bool,
}

impl ScriptedShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deny_root(mut self) -> Self {
        self.deny = true;
        self
    }

    /// Commands starting with `prefix` exit with `exit_code` and print `output`.
    pub fn respond(mut self, prefix: &str, exit_code: i32, output: &[&str]) -> Self {
        let output = output.iter().map(|s| s.to_string()).collect();
        self.responses.push(Response {
            prefix: prefix.to_string(),
            reply: Reply::Exit(exit_code, output),
        });
        self
    }

    /// The channel breaks when a command starting with `prefix` is sent.
    pub fn break_on(mut self, prefix: &str) -> Self {
        self.responses.push(Response {
            prefix: prefix.to_string(),
            reply: Reply::LoseChannel,
        });
        self
    }

    /// The toolset asset is missing when a command starting with `prefix` is sent.
    pub fn no_toolset_on(mut self, prefix: &str) -> Self {
        self.responses.push(Response {
            prefix: prefix.to_string(),
            reply: Reply::NoToolset,
        });
        self
    }

    pub fn command_lines(&self) -> Vec<&str> {
        self.commands.iter().map(|(c, _)| c.as_str()).collect()
    }

    pub fn ran(&self, prefix: &str) -> bool {
        self.commands.iter().any(|(c, _)| c.starts_with(prefix))
    }
}

impl PrivilegedShell for ScriptedShell {
    fn acquire(&mut self) -> Result<(), AcquisitionError> {
        self.acquisitions += 1;
        if self.deny {
            self.state = Some(ShellState::Terminated);
            return Err(AcquisitionError::Denied("Permission denied".into()));
        }
        self.state = Some(ShellState::Started);
        Ok(())
    }

    fn execute(&mut self, command: &str, with_toolset: bool) -> Result<CommandOutcome, ShellError> {
        if self.state() == ShellState::Unstarted {
            self.acquire()?;
        }
        if self.state() == ShellState::Terminated {
            return Err(ShellError::Terminated);
        }
        self.commands.push((command.to_string(), with_toolset));

        let reply = self
            .responses
            .iter()
            .find(|r| command.starts_with(&r.prefix))
            .map(|r| &r.reply);
        match reply {
            Some(Reply::LoseChannel) => {
                self.state = Some(ShellState::Terminated);
                Err(ShellError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "privileged shell exited mid-command",
                )))
            }
            Some(Reply::NoToolset) => Err(ShellError::Toolset(AssetError::Missing(
                "arm/busybox-xposed".to_string(),
            ))),
            Some(Reply::Exit(exit_code, output)) => Ok(CommandOutcome {
                exit_code: *exit_code,
                transcript: output.clone(),
            }),
            None => Ok(CommandOutcome {
                exit_code: 0,
                transcript: Vec::new(),
            }),
        }
    }

    fn remove_toolset(&mut self) {
        self.toolset_removals += 1;
    }

    fn dispose(&mut self) {
        self.disposed = true;
        self.state = Some(ShellState::Terminated);
    }

    fn state(&self) -> ShellState {
        self.state.unwrap_or(ShellState::Unstarted)
    }
}

/// Asset store that only records what would be written.
pub struct MemoryAssets {
    bundled: HashSet<String>,
    cache: PathBuf,
    pub written: Mutex<Vec<(String, PathBuf, u32)>>,
}

impl MemoryAssets {
    pub fn new(bundled: &[&str]) -> Self {
        Self {
            bundled: bundled.iter().map(|s| s.to_string()).collect(),
            cache: PathBuf::from("/data/data/xp/cache"),
            written: Mutex::new(Vec::new()),
        }
    }

    pub fn writes(&self) -> Vec<(String, PathBuf, u32)> {
        self.written.lock().unwrap().clone()
    }
}

impl AssetStore for MemoryAssets {
    fn write_asset(&self, name: &str, dest: &Path, mode: u32) -> Result<PathBuf, AssetError> {
        if !self.bundled.contains(name) {
            return Err(AssetError::Missing(name.to_string()));
        }
        self.written
            .lock()
            .unwrap()
            .push((name.to_string(), dest.to_path_buf(), mode));
        Ok(dest.to_path_buf())
    }

    fn has_asset(&self, name: &str) -> bool {
        self.bundled.contains(name)
    }

    fn cache_dir(&self) -> &Path {
        &self.cache
    }
}
