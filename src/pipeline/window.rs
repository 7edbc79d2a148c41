//! Trailing context window over the finalised entry sequence.

use std::collections::VecDeque;

const WINDOW: usize = 2;

/// Remembers the `text` of the last two finalised entries.
///
/// Tracks the output sequence, not the lines seen: only entries passed to
/// [`ContextWindow::record`] count, merged ones included.
#[derive(Debug, Clone, Default)]
pub struct ContextWindow {
    recent: VecDeque<String>,
}

impl ContextWindow {
    /// Window for the next standalone entry: the last two texts in order,
    /// or empty while fewer than two entries exist.
    pub fn current(&self) -> Vec<String> {
        if self.recent.len() < WINDOW {
            return Vec::new();
        }
        self.recent.iter().cloned().collect()
    }

    pub fn record(&mut self, text: &str) {
        if self.recent.len() == WINDOW {
            self.recent.pop_front();
        }
        self.recent.push_back(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_until_two_entries() {
        let mut w = ContextWindow::default();
        assert!(w.current().is_empty());
        w.record("a");
        assert!(w.current().is_empty());
        w.record("b");
        assert_eq!(w.current(), vec!["a", "b"]);
    }

    #[test]
    fn keeps_only_last_two_in_order() {
        let mut w = ContextWindow::default();
        for t in ["a", "b", "c", "d"] {
            w.record(t);
        }
        assert_eq!(w.current(), vec!["c", "d"]);
    }
}
