//! Install, uninstall and reboot commands.
//!
//! Privileged sequences run on the blocking pool. Their confirmation gates
//! post questions over a channel; a separate foreground thread answers them
//! from the terminal (or with `--yes`).

use std::path::PathBuf;

use anyhow::{bail, Context as _, Result};
use tokio::sync::mpsc;

use super::Context;
use crate::confirm::{ChannelGate, ConfirmRequest, ConfirmationGate, Decision, FixedGate, TerminalGate};
use crate::flash::{FlashOutcome, FlashResolution, RebootAction, RebootOutcome};
use crate::installer::{FlashStatus, Installer};
use crate::messages;
use crate::probe::CompatibilityResult;
use crate::settings::{JsonSettingsStore, SettingsStore};
use crate::shell::RootShellSession;
use crate::task::BackgroundTask;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Install,
    Uninstall,
}

impl FlashKind {
    fn verb(self) -> &'static str {
        match self {
            FlashKind::Install => "Installing",
            FlashKind::Uninstall => "Uninstalling",
        }
    }
}

/// Stage `payload` for the recovery and offer to reboot into it.
pub async fn cmd_flash(ctx: &Context, kind: FlashKind, payload: PathBuf, yes: bool) -> Result<()> {
    if !payload.is_file() {
        bail!("Payload not found: {}", payload.display());
    }
    let payload = payload
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", payload.display()))?;

    let settings = JsonSettingsStore::new(&ctx.config.settings_path).load()?;
    println!("{} with {} ({})", kind.verb(), payload.display(), settings.install_mode());

    let compat = ctx.probe().await?;
    let installer = ctx.installer(compat, settings);

    let (report, installer) = run_privileged("flash", installer, yes, move |installer, gate| {
        installer.handle_download(payload, gate)
    })
    .await?;

    println!();
    for line in report.transcript.lines() {
        println!("{}", line);
    }

    if let Some(issue) = installer.known_issue(ctx.device_root()) {
        println!("\n{}", issue.banner());
    }

    match report.status {
        FlashStatus::WarningDeclined => println!("Cancelled."),
        FlashStatus::RootDenied => bail!("{}", messages::root_failed()),
        FlashStatus::Finished(FlashOutcome::Aborted(failure)) => {
            bail!("{} failed at {}: {}", kind.verb(), failure.step, failure.summary)
        }
        FlashStatus::Finished(FlashOutcome::Resolved(resolution)) => match resolution {
            FlashResolution::Rebooting => println!("Rebooting into recovery..."),
            FlashResolution::RebootFailed => bail!("{}", messages::reboot_failed()),
            FlashResolution::DeclinedCleanedUp => println!("Staged files removed."),
            FlashResolution::DeclinedKept => println!("Payload left in the recovery directory."),
        },
    }
    Ok(())
}

/// Reboot, reboot into recovery, or soft reboot.
pub async fn cmd_reboot(ctx: &Context, action: RebootAction, yes: bool) -> Result<()> {
    let settings = JsonSettingsStore::new(&ctx.config.settings_path).load()?;
    // Reboots do not depend on the probe.
    let installer = ctx.installer(CompatibilityResult::assumed(), settings);

    let (result, _) = run_privileged("reboot", installer, yes, move |installer, gate| {
        installer.reboot(action, gate)
    })
    .await?;

    let result = result.with_context(messages::root_failed)?;
    match result {
        None => println!("Cancelled."),
        Some((outcome, transcript)) => {
            for line in transcript.lines() {
                println!("{}", line);
            }
            if outcome == RebootOutcome::Failed {
                bail!("{}", messages::reboot_failed());
            }
        }
    }
    Ok(())
}

/// Run `job` against `installer` on the blocking pool, answering its
/// confirmation questions on a dedicated foreground thread. The installer
/// comes back shut down, with its last transcript intact.
async fn run_privileged<T, F>(
    name: &'static str,
    mut installer: Installer<RootShellSession>,
    yes: bool,
    job: F,
) -> Result<(T, Installer<RootShellSession>)>
where
    T: Send + 'static,
    F: FnOnce(&mut Installer<RootShellSession>, &mut dyn ConfirmationGate) -> T + Send + 'static,
{
    let (mut gate, requests) = ChannelGate::channel(1);

    let foreground = BackgroundTask::start_blocking("confirm", move || answer_requests(requests, yes));
    let worker = BackgroundTask::start_blocking(name, move || {
        let result = job(&mut installer, &mut gate);
        installer.shutdown();
        (result, installer)
    });

    let result = worker.join().await?;
    foreground.join().await?;
    Ok(result)
}

/// Answer until every gate holding the sender is gone.
fn answer_requests(mut requests: mpsc::Receiver<ConfirmRequest>, yes: bool) {
    let mut gate: Box<dyn ConfirmationGate> = if yes {
        Box::new(FixedGate(Decision::Confirmed))
    } else {
        Box::new(TerminalGate)
    };
    while let Some(request) = requests.blocking_recv() {
        let decision = gate.confirm(&request.prompt);
        let _ = request.reply.send(decision);
    }
}
