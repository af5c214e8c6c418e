//! # Command Tokenizer / Parser
//!
//! Turns raw input lines into ordered sequences of classified [`Term`]s:
//! whitespace-delimited words, quoted spans, `;` statement separators,
//! `>`/`>>` redirection operators, `#` comment lines, and `!` history
//! expansion. Consumption happens through [`TermStream`], which supports the
//! dispatcher's single-slot pushback.

mod stream;
mod term;
mod tokenizer;

pub use stream::TermStream;
pub use term::{Term, TermKind};
pub use tokenizer::{
    is_comment, parse_statement, redirect_request, split_first_statement, InputSource, ParseMode,
    ParsedStatement, RedirectMode, SyntaxError,
};
