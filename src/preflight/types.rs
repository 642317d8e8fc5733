//! Checklist entries and the printed report.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Ready,
    /// Installing will not work until this is fixed.
    Blocker,
    /// Installing may work; read the note.
    Caution,
    /// Does not apply to this device.
    NotApplicable,
}

impl Verdict {
    fn marker(self) -> (&'static str, &'static str) {
        match self {
            Verdict::Ready => ("✓", "PASS"),
            Verdict::Blocker => ("✗", "FAIL"),
            Verdict::Caution => ("⚠", "WARN"),
            Verdict::NotApplicable => ("○", "SKIP"),
        }
    }
}

/// One line of the checklist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub label: &'static str,
    pub verdict: Verdict,
    pub note: Option<String>,
}

impl Check {
    fn new(label: &'static str, verdict: Verdict, note: Option<String>) -> Self {
        Self { label, verdict, note }
    }

    pub fn ready(label: &'static str) -> Self {
        Self::new(label, Verdict::Ready, None)
    }

    pub fn ready_with(label: &'static str, note: impl Into<String>) -> Self {
        Self::new(label, Verdict::Ready, Some(note.into()))
    }

    pub fn blocker(label: &'static str, note: impl Into<String>) -> Self {
        Self::new(label, Verdict::Blocker, Some(note.into()))
    }

    pub fn caution(label: &'static str, note: impl Into<String>) -> Self {
        Self::new(label, Verdict::Caution, Some(note.into()))
    }

    pub fn not_applicable(label: &'static str, note: impl Into<String>) -> Self {
        Self::new(label, Verdict::NotApplicable, Some(note.into()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct PreflightReport {
    pub checks: Vec<Check>,
}

impl PreflightReport {
    pub fn tally(&self, verdict: Verdict) -> usize {
        self.checks.iter().filter(|c| c.verdict == verdict).count()
    }

    /// No blockers.
    pub fn is_ready(&self) -> bool {
        self.tally(Verdict::Blocker) == 0
    }

    /// Report lines, without the trailing newline.
    pub fn render(&self) -> Vec<String> {
        let mut out = vec!["=== Preflight Check Results ===".to_string(), String::new()];

        for check in &self.checks {
            let (icon, tag) = check.verdict.marker();
            match &check.note {
                Some(note) => out.push(format!("  {} [{}] {}: {}", icon, tag, check.label, note)),
                None => out.push(format!("  {} [{}] {}", icon, tag, check.label)),
            }
        }

        out.push(String::new());
        out.push(format!(
            "Summary: {}/{} passed",
            self.tally(Verdict::Ready),
            self.checks.len()
        ));
        let blockers = self.tally(Verdict::Blocker);
        if blockers > 0 {
            out.push(format!("         {} FAILED - installing will not work", blockers));
        }
        let cautions = self.tally(Verdict::Caution);
        if cautions > 0 {
            out.push(format!("         {} warnings", cautions));
        }
        out
    }

    pub fn print(&self) {
        for line in self.render() {
            println!("{}", line);
        }
    }
}
