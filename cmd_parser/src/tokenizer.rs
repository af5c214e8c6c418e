//! Single-pass statement tokenizer
//!
//! Splits a raw line into whitespace-delimited terms, honoring quoted
//! strings, history-bang expansion, statement separators and redirection
//! operators. Scan-position precedence: quoted span, redirection, bang,
//! separator, whitespace. Comment lines are discarded before any statement
//! splitting happens.

use crate::term::{Term, TermKind};
use cmd_history::History;
use thiserror::Error;

/// Whether the first term of the statement names a command or continues an
/// argument prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Parsing a fresh statement; the first term is the command name.
    NewCommand,
    /// Collecting extra arguments for an in-progress interactive prompt.
    Arguments,
}

/// Where the raw text came from. Script input gets a `CmdEnd` sentinel and
/// strict quote checking; interactive input gets bang expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Interactive,
    Script,
}

/// Requested output redirection for one statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectMode {
    /// `>`: truncate the target file
    Truncate,
    /// `>>`: append to the target file
    Append,
}

/// A malformed statement: unterminated quote (script) or more than one
/// redirection operator.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("syntax error")]
pub struct SyntaxError;

/// One tokenized statement plus its normalized display text (used in
/// diagnostics such as `Invalid command:`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedStatement {
    pub terms: Vec<Term>,
    pub display: String,
}

/// True when the physical line is a comment and produces no terms at all.
///
/// Checked once per physical input line, not per statement.
pub fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

/// Splits off the first statement of `input`, honoring quoted spans.
///
/// Returns the statement text (without the separator) and the remainder
/// after the separator.
pub fn split_first_statement(input: &str) -> (&str, &str) {
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'"' {
                    i += 1;
                }
                if i == bytes.len() {
                    return (input, "");
                }
            }
            b';' => return (&input[..i], &input[i + 1..]),
            _ => {}
        }
        i += 1;
    }
    (input, "")
}

/// Tokenizes one statement.
///
/// Bang expansion is textual: the resolved history line is spliced into the
/// remaining text and scanning resumes at the same position. A failed
/// expansion consumes the specifier and substitutes nothing.
pub fn parse_statement(
    statement: &str,
    mode: ParseMode,
    source: InputSource,
    history: &History,
) -> ParsedStatement {
    let mut line: Vec<char> = statement.chars().collect();
    let mut terms: Vec<Term> = Vec::new();
    let mut kind = match mode {
        ParseMode::NewCommand => TermKind::Cmd,
        ParseMode::Arguments => TermKind::Item,
    };
    let mut word = String::new();
    let mut i = 0;

    while i < line.len() {
        let c = line[i];
        if c.is_whitespace() {
            flush(&mut terms, &mut word, &mut kind);
            i += 1;
            continue;
        }
        if c == '"' && word.is_empty() {
            match line[i + 1..].iter().position(|&q| q == '"') {
                Some(offset) => {
                    let text: String = line[i + 1..i + 1 + offset].iter().collect();
                    terms.push(Term::new(kind, text));
                    kind = TermKind::Item;
                    i += offset + 2;
                }
                None => {
                    // Unterminated quote: consume to end of line.
                    let text: String = line[i..].iter().collect();
                    terms.push(Term::new(kind, text));
                    kind = TermKind::Item;
                    if source == InputSource::Script {
                        terms.push(Term::new(TermKind::Error, ";"));
                    }
                    i = line.len();
                }
            }
            continue;
        }
        if c == '>' {
            flush(&mut terms, &mut word, &mut kind);
            if line.get(i + 1) == Some(&'>') {
                terms.push(Term::new(TermKind::Redirect, ">>"));
                i += 2;
            } else {
                terms.push(Term::new(TermKind::Redirect, ">"));
                i += 1;
            }
            kind = TermKind::Item;
            continue;
        }
        if c == '!' && source == InputSource::Interactive {
            let (spec, consumed) = bang_spec(&line[i..]);
            match history.resolve_bang(&spec) {
                Some(expansion) => {
                    let expansion: Vec<char> = expansion.chars().collect();
                    line.splice(i..i + consumed, expansion);
                    // Re-scan the substituted text from the same position.
                }
                None => {
                    i += consumed;
                }
            }
            continue;
        }
        word.push(c);
        i += 1;
    }
    flush(&mut terms, &mut word, &mut kind);
    if source == InputSource::Script {
        terms.push(Term::new(TermKind::CmdEnd, ";"));
    }

    let display = terms
        .iter()
        .filter(|t| matches!(t.kind, TermKind::Cmd | TermKind::Item | TermKind::Redirect))
        .map(display_text)
        .collect::<Vec<_>>()
        .join(" ");
    ParsedStatement { terms, display }
}

/// Display form of one term. Terms that came from a quoted span carry
/// whitespace (or are empty), so they get their quotes back; re-parsing the
/// display text must reproduce the same terms, because the display form is
/// what history recall and bang expansion feed back into the parser.
fn display_text(term: &Term) -> String {
    let needs_quotes = term.kind != TermKind::Redirect
        && !term.text.starts_with('"')
        && (term.text.is_empty() || term.text.chars().any(char::is_whitespace));
    if needs_quotes {
        format!("\"{}\"", term.text)
    } else {
        term.text.clone()
    }
}

/// Scans a statement's terms for a redirection request.
///
/// A second redirection operator or a parse-error term makes the whole
/// statement malformed.
pub fn redirect_request(terms: &[Term]) -> Result<Option<RedirectMode>, SyntaxError> {
    let mut redirect = None;
    for term in terms {
        match term.kind {
            TermKind::Error => return Err(SyntaxError),
            TermKind::Redirect => {
                if redirect.is_some() {
                    return Err(SyntaxError);
                }
                redirect = Some(if term.text == ">>" {
                    RedirectMode::Append
                } else {
                    RedirectMode::Truncate
                });
            }
            _ => {}
        }
    }
    Ok(redirect)
}

fn flush(terms: &mut Vec<Term>, word: &mut String, kind: &mut TermKind) {
    if !word.is_empty() {
        terms.push(Term::new(*kind, word.clone()));
        word.clear();
        *kind = TermKind::Item;
    }
}

/// Extracts the bang specifier starting at a `!`: `!!` (spec `"!"`), or the
/// run of non-whitespace after the `!`. Returns (spec, chars consumed
/// including the leading `!`).
fn bang_spec(rest: &[char]) -> (String, usize) {
    if rest.get(1) == Some(&'!') {
        return ("!".to_string(), 2);
    }
    let mut end = 1;
    while end < rest.len() && !rest[end].is_whitespace() {
        end += 1;
    }
    (rest[1..end].iter().collect(), end)
}
