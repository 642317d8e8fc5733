//! Unprivileged helper commands.
//!
//! Everything that needs root goes through [`crate::shell`]. This module
//! covers the plain lookups the installer reads device state with
//! (`getprop`, PATH resolution), capturing stderr so failures explain
//! themselves.

use std::path::PathBuf;
use std::process::{Command, ExitStatus};

use anyhow::{bail, Context, Result};

/// Captured output of a finished helper.
#[derive(Debug, Clone)]
pub struct Captured {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl Captured {
    /// First stdout line, trimmed. Empty when there was no output.
    pub fn first_line(&self) -> &str {
        self.stdout.lines().next().unwrap_or("").trim()
    }
}

/// Builder for a one-shot helper command.
pub struct Cmd {
    program: String,
    args: Vec<String>,
    tolerate_failure: bool,
}

impl Cmd {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            tolerate_failure: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Return the output even when the exit status is non-zero.
    pub fn tolerate_failure(mut self) -> Self {
        self.tolerate_failure = true;
        self
    }

    pub fn run(self) -> Result<Captured> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .with_context(|| format!("Could not run '{}'. Is it on PATH?", self.program))?;

        let captured = Captured {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !self.tolerate_failure && !captured.status.success() {
            let code = captured.status.code().unwrap_or(-1);
            match captured.stderr.trim() {
                "" => bail!("'{}' exited with {}", self.program, code),
                stderr => bail!("'{}' exited with {}:\n{}", self.program, code, stderr),
            }
        }
        Ok(captured)
    }
}

/// Read a single Android system property.
///
/// `None` when `getprop` is missing, fails, or prints nothing, which is the
/// normal case off-device.
pub fn getprop(key: &str) -> Option<String> {
    let captured = Cmd::new("getprop").arg(key).run().ok()?;
    match captured.first_line() {
        "" => None,
        value => Some(value.to_string()),
    }
}

/// Resolve a program in PATH (or an explicit path) to its location.
pub fn which(program: &str) -> Option<PathBuf> {
    which::which(program).ok()
}
