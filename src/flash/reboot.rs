//! Privileged reboots.

use tracing::{info, warn};

use super::FlashLayout;
use crate::messages;
use crate::shell::{quote, AcquisitionError, PrivilegedShell, ShellError};
use crate::transcript::Transcript;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebootAction {
    /// Full device reboot.
    Reboot,
    /// Full reboot into a named target such as `recovery`.
    RebootInto(String),
    /// Restart only the compositor and zygote.
    SoftRestart,
}

impl RebootAction {
    pub fn recovery() -> Self {
        RebootAction::RebootInto("recovery".to_string())
    }

    pub fn is_recovery(&self) -> bool {
        matches!(self, RebootAction::RebootInto(target) if target == "recovery")
    }

    /// Command passed to the toolset.
    pub fn command(&self) -> String {
        match self {
            RebootAction::Reboot => "reboot".to_string(),
            RebootAction::RebootInto(target) => format!("reboot {}", quote(target)),
            RebootAction::SoftRestart => {
                "sh -c 'setprop ctl.restart surfaceflinger; setprop ctl.restart zygote'".to_string()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebootOutcome {
    Issued,
    Failed,
}

pub struct RebootController<'a, S: PrivilegedShell + ?Sized> {
    shell: &'a mut S,
    layout: &'a FlashLayout,
}

impl<'a, S: PrivilegedShell + ?Sized> RebootController<'a, S> {
    pub fn new(shell: &'a mut S, layout: &'a FlashLayout) -> Self {
        Self { shell, layout }
    }

    /// Issue `action`. A non-zero exit, or a shell that could not run the
    /// command, adds one "reboot failed" line to `log`. Only a refused root
    /// request is an error. The toolset binary is removed afterwards whatever
    /// happened.
    pub fn perform(&mut self, action: &RebootAction, log: &mut Transcript) -> Result<RebootOutcome, AcquisitionError> {
        let result = self.issue(action, log);
        self.shell.remove_toolset();
        result
    }

    fn issue(&mut self, action: &RebootAction, log: &mut Transcript) -> Result<RebootOutcome, AcquisitionError> {
        self.shell.acquire()?;

        let command = action.command();
        info!(%command, "issuing reboot");
        match self.run(action, &command, log) {
            Ok(0) => return Ok(RebootOutcome::Issued),
            Ok(exit_code) => warn!(%command, exit_code, "reboot command failed"),
            Err(ShellError::Acquisition(err)) => return Err(err),
            Err(err) => {
                warn!(%command, error = %err, "reboot command did not run");
                log.push(err.to_string());
            }
        }
        log.blank();
        log.push(messages::reboot_failed());
        Ok(RebootOutcome::Failed)
    }

    /// Sentinel (recovery only) then the reboot itself. Returns its exit code.
    fn run(&mut self, action: &RebootAction, command: &str, log: &mut Transcript) -> Result<i32, ShellError> {
        if action.is_recovery() {
            let sentinel = self.layout.boot_sentinel();
            let touched = self
                .shell
                .execute(&format!("touch {}", quote(&sentinel.to_string_lossy())), true)?;
            log.extend(touched.transcript);
        }

        let outcome = self.shell.execute(command, true)?;
        log.extend(outcome.transcript);
        Ok(outcome.exit_code)
    }
}
