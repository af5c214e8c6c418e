//! # Command History Store
//!
//! Append-only store of previously entered lines with chronological
//! browsing, prefix search, and `!`-style event recall.
//!
//! The store keeps committed entries plus one "in progress" slot holding the
//! line currently being typed. A cursor walks the combined range
//! `0..=len()`; index `len()` is the in-progress slot. Committed entries are
//! never mutated: editing a recalled line and resubmitting it appends a new
//! entry (append-always), and browsing away from the in-progress line
//! stashes the typed text so walking forward restores it.
//!
//! All failure modes here (recall past either end, search or bang recall
//! with no match) are non-fatal: the caller gets `None` and rings the bell.

/// Browse/search direction through the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Toward older entries
    Backward,
    /// Toward newer entries
    Forward,
}

/// Ordered, append-only history of committed lines plus the in-progress slot.
#[derive(Debug, Default)]
pub struct History {
    entries: Vec<String>,
    cursor: usize,
    pending: String,
}

impl History {
    /// Creates an empty history; the cursor sits on the in-progress slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been committed yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current cursor position, `0..=len()`.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Committed entry text at `index`.
    pub fn entry(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|s| s.as_str())
    }

    /// Iterates committed entries, oldest first (the `history` command).
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|s| s.as_str())
    }

    /// Commits a finished line. Empty lines are discarded.
    ///
    /// The cursor returns to the in-progress slot and the pending text is
    /// cleared, ready for the next line.
    pub fn append(&mut self, line: &str) {
        if !line.is_empty() {
            self.entries.push(line.to_string());
        }
        self.cursor = self.entries.len();
        self.pending.clear();
    }

    /// Resets the cursor to the in-progress slot without committing.
    pub fn begin_line(&mut self) {
        self.cursor = self.entries.len();
        self.pending.clear();
    }

    /// Moves the cursor one step and returns the text now under it.
    ///
    /// `current` is the line as typed so far; when leaving the in-progress
    /// slot it is stashed so a later forward walk restores it. Stepping past
    /// either end returns `None` and leaves the cursor unchanged.
    pub fn recall(&mut self, direction: Direction, current: &str) -> Option<&str> {
        if self.cursor == self.entries.len() {
            self.pending = current.to_string();
        }
        match direction {
            Direction::Backward => {
                if self.cursor == 0 {
                    return None;
                }
                self.cursor -= 1;
            }
            Direction::Forward => {
                if self.cursor >= self.entries.len() {
                    return None;
                }
                self.cursor += 1;
            }
        }
        Some(self.text_at_cursor())
    }

    /// Jumps to the oldest committed entry (PageUp).
    pub fn jump_oldest(&mut self, current: &str) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        if self.cursor == self.entries.len() {
            self.pending = current.to_string();
        }
        self.cursor = 0;
        Some(self.text_at_cursor())
    }

    /// Jumps to the in-progress slot (PageDown).
    pub fn jump_latest(&mut self) -> &str {
        self.cursor = self.entries.len();
        self.text_at_cursor()
    }

    /// Repositions the cursor onto a committed entry (search accept).
    pub fn set_cursor(&mut self, index: usize) -> Option<&str> {
        if index > self.entries.len() {
            return None;
        }
        self.cursor = index;
        Some(self.text_at_cursor())
    }

    fn text_at_cursor(&self) -> &str {
        if self.cursor == self.entries.len() {
            &self.pending
        } else {
            &self.entries[self.cursor]
        }
    }

    /// Incremental search: first committed entry starting with `text`,
    /// scanning from `start` toward older (`Backward`) or newer (`Forward`)
    /// entries, `start` included.
    ///
    /// The match rule is prefix match, not substring, even though the UI
    /// calls it "search".
    pub fn search(&self, text: &str, direction: Direction, start: usize) -> Option<usize> {
        if text.is_empty() || self.entries.is_empty() {
            return None;
        }
        let last = self.entries.len() - 1;
        let mut index = start.min(last);
        loop {
            if self.entries[index].starts_with(text) {
                return Some(index);
            }
            match direction {
                Direction::Backward => {
                    if index == 0 {
                        return None;
                    }
                    index -= 1;
                }
                Direction::Forward => {
                    if index == last {
                        return None;
                    }
                    index += 1;
                }
            }
        }
    }

    /// Resolves a history-bang specifier (the text after `!`).
    ///
    /// `!` (from `!!`) names the most recent committed entry, all-digits
    /// names an absolute index, anything else is a prefix scanned from the
    /// most recent entry backward. `None` means no substitution.
    pub fn resolve_bang(&self, spec: &str) -> Option<&str> {
        if spec == "!" {
            return self.entries.last().map(|s| s.as_str());
        }
        if !spec.is_empty() && spec.bytes().all(|b| b.is_ascii_digit()) {
            let index: usize = spec.parse().ok()?;
            return self.entry(index);
        }
        if spec.is_empty() {
            return None;
        }
        let last = self.entries.len().checked_sub(1)?;
        let index = self.search(spec, Direction::Backward, last)?;
        self.entry(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> History {
        let mut h = History::new();
        h.append("lsres");
        h.append("showrpt 3");
        h.append("power 3 on");
        h
    }

    #[test]
    fn test_append_skips_empty() {
        let mut h = History::new();
        h.append("");
        assert!(h.is_empty());
        h.append("lsres");
        assert_eq!(h.len(), 1);
        assert_eq!(h.cursor(), 1);
    }

    #[test]
    fn test_recall_walks_every_entry_once() {
        let mut h = seeded();
        let mut seen = Vec::new();
        for _ in 0..h.len() {
            seen.push(h.recall(Direction::Backward, "").unwrap().to_string());
        }
        assert_eq!(seen, vec!["power 3 on", "showrpt 3", "lsres"]);
        // Walking further is a no-op.
        assert_eq!(h.recall(Direction::Backward, ""), None);
        assert_eq!(h.cursor(), 0);
    }

    #[test]
    fn test_recall_backward_at_zero_is_noop() {
        let mut h = seeded();
        for _ in 0..h.len() {
            h.recall(Direction::Backward, "");
        }
        let cursor = h.cursor();
        assert_eq!(h.recall(Direction::Backward, ""), None);
        assert_eq!(h.cursor(), cursor);
    }

    #[test]
    fn test_pending_restored_on_forward_walk() {
        let mut h = seeded();
        assert_eq!(h.recall(Direction::Backward, "half-typed"), Some("power 3 on"));
        assert_eq!(h.recall(Direction::Forward, "power 3 on"), Some("half-typed"));
        assert_eq!(h.cursor(), h.len());
    }

    #[test]
    fn test_recall_forward_at_pending_is_noop() {
        let mut h = seeded();
        assert_eq!(h.recall(Direction::Forward, "typed"), None);
        assert_eq!(h.cursor(), h.len());
    }

    #[test]
    fn test_jump_oldest_and_latest() {
        let mut h = seeded();
        assert_eq!(h.jump_oldest("typed"), Some("lsres"));
        assert_eq!(h.cursor(), 0);
        assert_eq!(h.jump_latest(), "typed");
    }

    #[test]
    fn test_jump_oldest_empty_history() {
        let mut h = History::new();
        assert_eq!(h.jump_oldest("typed"), None);
    }

    #[test]
    fn test_search_is_prefix_match() {
        let h = seeded();
        // "rpt" is a substring of "showrpt 3" but not a prefix.
        assert_eq!(h.search("rpt", Direction::Backward, 2), None);
        assert_eq!(h.search("show", Direction::Backward, 2), Some(1));
        assert_eq!(h.search("power", Direction::Forward, 0), Some(2));
    }

    #[test]
    fn test_search_empty_text() {
        let h = seeded();
        assert_eq!(h.search("", Direction::Backward, 2), None);
    }

    #[test]
    fn test_resolve_bang_last() {
        let h = seeded();
        assert_eq!(h.resolve_bang("!"), Some("power 3 on"));
    }

    #[test]
    fn test_resolve_bang_index() {
        let h = seeded();
        assert_eq!(h.resolve_bang("0"), Some("lsres"));
        assert_eq!(h.resolve_bang("1"), Some("showrpt 3"));
        assert_eq!(h.resolve_bang("9"), None);
    }

    #[test]
    fn test_resolve_bang_prefix_most_recent_first() {
        let mut h = seeded();
        h.append("showrdr 5");
        assert_eq!(h.resolve_bang("show"), Some("showrdr 5"));
        assert_eq!(h.resolve_bang("lsr"), Some("lsres"));
        assert_eq!(h.resolve_bang("nosuch"), None);
    }

    #[test]
    fn test_resolve_bang_empty_history() {
        let h = History::new();
        assert_eq!(h.resolve_bang("!"), None);
        assert_eq!(h.resolve_bang("0"), None);
        assert_eq!(h.resolve_bang("x"), None);
    }

    #[test]
    fn test_append_always_after_recall() {
        let mut h = seeded();
        h.recall(Direction::Backward, "");
        // Resubmitting an edited recalled line appends; it never rewrites
        // the committed slot.
        h.append("power 3 off");
        assert_eq!(h.entry(2), Some("power 3 on"));
        assert_eq!(h.entry(3), Some("power 3 off"));
        assert_eq!(h.len(), 4);
    }
}
