//! Ordered term consumption with single-slot pushback

use crate::term::{Term, TermKind};

/// The dispatcher's view of a parsed line: terms consumed strictly in
/// order, with a single-slot unget.
///
/// The pushback is deliberately one slot deep (a saved position, not a
/// stack); callers are written against that limit. Two ungets in a row are
/// a caller bug and trip a debug assertion.
#[derive(Debug, Default)]
pub struct TermStream {
    terms: Vec<Term>,
    cursor: usize,
    can_unget: bool,
}

impl TermStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discards everything: start of a new command.
    pub fn reset(&mut self) {
        self.terms.clear();
        self.cursor = 0;
        self.can_unget = false;
    }

    /// Appends freshly parsed terms (argument-collection re-parses append to
    /// the same stream the command started with).
    pub fn extend(&mut self, terms: Vec<Term>) {
        self.terms.extend(terms);
    }

    /// Consumes and returns the next term.
    ///
    /// `CmdEnd` is a fence, not a term: it is never consumed, so every
    /// subsequent call keeps returning `None` until the stream is reset.
    /// `Empty` terms are skipped.
    pub fn next(&mut self) -> Option<&Term> {
        while self.cursor < self.terms.len() {
            match self.terms[self.cursor].kind {
                TermKind::CmdEnd => return None,
                TermKind::Empty => self.cursor += 1,
                _ => {
                    self.cursor += 1;
                    self.can_unget = true;
                    return Some(&self.terms[self.cursor - 1]);
                }
            }
        }
        None
    }

    /// Rewinds the consumption cursor by one term.
    pub fn unget(&mut self) {
        debug_assert!(self.can_unget, "unget without a preceding get");
        if self.cursor > 0 {
            self.cursor -= 1;
        }
        self.can_unget = false;
    }

    /// All terms of the current statement (redirection scan).
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// True when every consumable term has been handed out.
    pub fn is_exhausted(&self) -> bool {
        self.terms[self.cursor..]
            .iter()
            .all(|t| matches!(t.kind, TermKind::CmdEnd | TermKind::Empty))
    }
}
