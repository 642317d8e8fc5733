//! The running message log shown to the user after a privileged sequence.

/// Ordered, display-ready lines accumulated across the steps of one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    lines: Vec<String>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Visual separator before a summary line.
    pub fn blank(&mut self) {
        self.lines.push(String::new());
    }

    pub fn extend<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lines.extend(lines.into_iter().map(Into::into));
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.contains(needle))
    }

    /// Newline-joined and trimmed, ready to display.
    pub fn render(&self) -> String {
        self.lines.join("\n").trim().to_string()
    }

    /// Advisory only: some ROMs crash `app_process` in a way that prints this.
    pub fn mentions_segfault(&self) -> bool {
        self.lines
            .iter()
            .any(|line| line.to_ascii_lowercase().contains("segmentation fault"))
    }
}
