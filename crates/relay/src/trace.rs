//! Dispatch trace: the human-readable record of one turn's model attempts.

use serde::Serialize;

/// Append-only list of trace lines.
///
/// Owned by the orchestrator for the duration of a turn and lent mutably to
/// the dispatcher; handed back to the caller, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DispatchTrace {
    lines: Vec<String>,
}

impl DispatchTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of lines containing `needle`.
    pub fn count_matching(&self, needle: &str) -> usize {
        self.lines.iter().filter(|l| l.contains(needle)).count()
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_append_order() {
        let mut trace = DispatchTrace::new();
        trace.push("invoking model a");
        trace.push(String::from("model a responded in 5 ms"));
        assert_eq!(trace.len(), 2);
        assert_eq!(trace.lines()[0], "invoking model a");
        assert_eq!(trace.count_matching("model a"), 2);
    }
}
