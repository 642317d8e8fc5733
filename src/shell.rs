//! The privileged shell session.
//!
//! One long-lived `su` process per session. Commands are written to its stdin
//! one at a time, each followed by an `echo` of a per-session marker and `$?`,
//! so the reader knows where a command's output ends and what it exited with.
//!
//! Every privileged operation in the crate goes through [`PrivilegedShell`];
//! nothing else spawns `su`.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::assets::{AssetError, Toolset};

/// Result of one shell invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub exit_code: i32,
    /// Combined stdout/stderr lines, in the order the shell produced them.
    pub transcript: Vec<String>,
}

impl CommandOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Root could not be obtained.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("could not start privileged shell '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("root access denied{}", reason_suffix(.0))]
    Denied(String),
}

fn reason_suffix(reason: &str) -> String {
    if reason.is_empty() {
        String::new()
    } else {
        format!(": {}", reason)
    }
}

/// Anything that prevents a command from producing a [`CommandOutcome`].
/// A non-zero exit code is not one of these.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    #[error("privileged shell I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("privileged shell has terminated")]
    Terminated,

    #[error("toolset unavailable: {0}")]
    Toolset(#[from] AssetError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellState {
    Unstarted,
    Started,
    Terminated,
}

/// The single channel through which privileged commands are issued.
///
/// Not safe for concurrent submission; callers hold it by `&mut` for the
/// length of a multi-step sequence.
pub trait PrivilegedShell {
    /// Obtain root. Idempotent once started.
    fn acquire(&mut self) -> Result<(), AcquisitionError>;

    /// Run `command` to completion. With `with_toolset` the command runs
    /// through the bundled toolset binary instead of the bare device shell.
    fn execute(&mut self, command: &str, with_toolset: bool) -> Result<CommandOutcome, ShellError>;

    /// Delete the extracted toolset binary from the device.
    fn remove_toolset(&mut self);

    /// Terminate the privileged process. Idempotent.
    fn dispose(&mut self);

    fn state(&self) -> ShellState;
}

/// How to start the privileged shell.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl SessionConfig {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }
}

struct Channel {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

/// [`PrivilegedShell`] backed by a real `su` process.
pub struct RootShellSession {
    config: SessionConfig,
    toolset: Toolset,
    channel: Option<Channel>,
    state: ShellState,
    marker: String,
}

impl RootShellSession {
    pub fn new(config: SessionConfig, toolset: Toolset) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0);
        Self {
            config,
            toolset,
            channel: None,
            state: ShellState::Unstarted,
            marker: format!("__XPINSTALL_END_{}_{:x}__", std::process::id(), nanos),
        }
    }

    fn spawn(&self) -> Result<Channel, AcquisitionError> {
        let mut child = Command::new(&self.config.program)
            .args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| AcquisitionError::Spawn {
                program: self.config.program.clone(),
                source,
            })?;

        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(AcquisitionError::Spawn {
                    program: self.config.program.clone(),
                    source: io::Error::new(io::ErrorKind::BrokenPipe, "shell pipes unavailable"),
                });
            }
        };

        Ok(Channel {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }

    /// Write one command and read until the marker line.
    fn run_on(channel: &mut Channel, marker: &str, command: &str) -> io::Result<CommandOutcome> {
        // stdin is detached so a command can never swallow the script that follows it
        let script = format!("{{\n{}\n}} </dev/null 2>&1\necho \"{} $?\"\n", command, marker);
        channel.stdin.write_all(script.as_bytes())?;
        channel.stdin.flush()?;

        let mut transcript = Vec::new();
        let mut buf = String::new();
        loop {
            buf.clear();
            if channel.stdout.read_line(&mut buf)? == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "privileged shell exited mid-command",
                ));
            }
            let line = buf.trim_end_matches(['\n', '\r']);
            if let Some(pos) = line.find(marker) {
                let before = &line[..pos];
                if !before.is_empty() {
                    transcript.push(before.to_string());
                }
                let exit_code = line[pos + marker.len()..].trim().parse().unwrap_or(-1);
                return Ok(CommandOutcome {
                    exit_code,
                    transcript,
                });
            }
            transcript.push(line.to_string());
        }
    }

    fn collect_denial(channel: &mut Channel) -> String {
        let _ = channel.child.kill();
        let _ = channel.child.wait();
        let mut stderr = String::new();
        if let Some(mut pipe) = channel.child.stderr.take() {
            let _ = pipe.read_to_string(&mut stderr);
        }
        stderr.trim().to_string()
    }

    fn mark_dead(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            let _ = channel.child.kill();
            let _ = channel.child.wait();
        }
        self.state = ShellState::Terminated;
    }
}

impl PrivilegedShell for RootShellSession {
    fn acquire(&mut self) -> Result<(), AcquisitionError> {
        if self.state == ShellState::Started {
            return Ok(());
        }

        debug!(program = %self.config.program, "requesting privileged shell");
        let mut channel = self.spawn()?;

        match Self::run_on(&mut channel, &self.marker, "id") {
            Ok(outcome) if outcome.success() => {
                info!(
                    identity = outcome.transcript.first().map(String::as_str).unwrap_or(""),
                    "privileged shell started"
                );
                self.channel = Some(channel);
                self.state = ShellState::Started;
                Ok(())
            }
            Ok(outcome) => {
                let reason = outcome.transcript.join("\n");
                let _ = Self::collect_denial(&mut channel);
                self.state = ShellState::Terminated;
                warn!(%reason, "privileged shell handshake failed");
                Err(AcquisitionError::Denied(reason))
            }
            Err(_) => {
                let reason = Self::collect_denial(&mut channel);
                self.state = ShellState::Terminated;
                warn!(%reason, "privileged shell refused");
                Err(AcquisitionError::Denied(reason))
            }
        }
    }

    fn execute(&mut self, command: &str, with_toolset: bool) -> Result<CommandOutcome, ShellError> {
        match self.state {
            ShellState::Unstarted => self.acquire()?,
            ShellState::Terminated => return Err(ShellError::Terminated),
            ShellState::Started => {}
        }

        let line = if with_toolset {
            let toolset = self.toolset.ensure()?;
            format!("{} {}", quote(&toolset.to_string_lossy()), command)
        } else {
            command.to_string()
        };

        let Some(channel) = self.channel.as_mut() else {
            return Err(ShellError::Terminated);
        };

        match Self::run_on(channel, &self.marker, &line) {
            Ok(outcome) => {
                debug!(command = %line, exit_code = outcome.exit_code, "privileged command finished");
                Ok(outcome)
            }
            Err(err) => {
                warn!(command = %line, "privileged shell lost: {}", err);
                self.mark_dead();
                Err(ShellError::Io(err))
            }
        }
    }

    fn remove_toolset(&mut self) {
        self.toolset.remove();
    }

    fn dispose(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            let _ = channel.stdin.write_all(b"exit\n");
            let _ = channel.stdin.flush();
            drop(channel.stdin);
            let _ = channel.child.kill();
            let _ = channel.child.wait();
            debug!("privileged shell disposed");
        }
        self.state = ShellState::Terminated;
    }

    fn state(&self) -> ShellState {
        self.state
    }
}

impl Drop for RootShellSession {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Quote `value` for the device shell when it carries anything beyond a
/// conservative set of path characters.
pub fn quote(value: &str) -> String {
    let plain = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/._-+=:,@".contains(c));
    if plain {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', "'\\''"))
    }
}
