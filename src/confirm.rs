//! Confirmation gates.
//!
//! A gate is a synchronous decision point: the caller blocks until the user
//! answers, then continues down exactly one branch.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use tokio::sync::{mpsc, oneshot};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Confirmed,
    Declined,
}

pub trait ConfirmationGate {
    /// Show `prompt` and wait for the answer.
    fn confirm(&mut self, prompt: &str) -> Decision;
}

/// Gate that always answers the same way (`--yes`).
#[derive(Debug, Clone, Copy)]
pub struct FixedGate(pub Decision);

impl ConfirmationGate for FixedGate {
    fn confirm(&mut self, _prompt: &str) -> Decision {
        self.0
    }
}

/// Gate that replays queued answers and records the prompts it saw.
/// Declines once the queue runs dry.
#[derive(Debug, Default)]
pub struct ScriptedGate {
    answers: VecDeque<Decision>,
    pub prompts: Vec<String>,
}

impl ScriptedGate {
    pub fn new(answers: impl IntoIterator<Item = Decision>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            prompts: Vec::new(),
        }
    }
}

impl ConfirmationGate for ScriptedGate {
    fn confirm(&mut self, prompt: &str) -> Decision {
        self.prompts.push(prompt.to_string());
        self.answers.pop_front().unwrap_or(Decision::Declined)
    }
}

/// One pending question for the foreground.
#[derive(Debug)]
pub struct ConfirmRequest {
    pub prompt: String,
    pub reply: oneshot::Sender<Decision>,
}

/// Gate used from a background worker: the question is posted to the
/// foreground over a channel and the worker blocks on the reply.
///
/// Must not be used from inside an async task; it blocks the thread.
#[derive(Debug, Clone)]
pub struct ChannelGate {
    tx: mpsc::Sender<ConfirmRequest>,
}

impl ChannelGate {
    pub fn new(tx: mpsc::Sender<ConfirmRequest>) -> Self {
        Self { tx }
    }

    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ConfirmRequest>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

impl ConfirmationGate for ChannelGate {
    fn confirm(&mut self, prompt: &str) -> Decision {
        let (reply, answer) = oneshot::channel();
        let request = ConfirmRequest {
            prompt: prompt.to_string(),
            reply,
        };
        if self.tx.blocking_send(request).is_err() {
            warn!("confirmation channel closed, treating as declined");
            return Decision::Declined;
        }
        answer.blocking_recv().unwrap_or(Decision::Declined)
    }
}

/// Ask on the terminal. Anything but y/yes is a decline.
pub fn ask_terminal(prompt: &str) -> Decision {
    let stdin = io::stdin();
    ask(prompt, &mut stdin.lock(), &mut io::stdout())
}

fn ask(prompt: &str, input: &mut impl BufRead, output: &mut impl Write) -> Decision {
    let _ = write!(output, "{}\n[y/N] ", prompt);
    let _ = output.flush();

    let mut line = String::new();
    if input.read_line(&mut line).is_err() {
        return Decision::Declined;
    }
    match line.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Decision::Confirmed,
        _ => Decision::Declined,
    }
}

/// Terminal gate for the foreground.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalGate;

impl ConfirmationGate for TerminalGate {
    fn confirm(&mut self, prompt: &str) -> Decision {
        ask_terminal(prompt)
    }
}
