//! Classified tokens produced by the tokenizer

/// How a term participates in a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermKind {
    /// First term of a statement: the command name
    Cmd,
    /// Argument term
    Item,
    /// End of input for a script statement; never produced interactively
    CmdEnd,
    /// `>` or `>>`
    Redirect,
    /// The statement is malformed (unterminated quote in a script)
    Error,
    /// Placeholder; skipped by the stream
    Empty,
}

/// One classified token from a raw input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub kind: TermKind,
    pub text: String,
}

impl Term {
    pub fn new(kind: TermKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_construction() {
        let t = Term::new(TermKind::Cmd, "lsres");
        assert_eq!(t.kind, TermKind::Cmd);
        assert_eq!(t.text, "lsres");
    }
}
