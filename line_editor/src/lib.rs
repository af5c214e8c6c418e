//! # Line Editing Engine
//!
//! Converts a stream of decoded keystrokes into a finished line of text,
//! with in-place editing, history navigation, incremental search, and
//! tab-completion.
//!
//! ## Design
//!
//! The editor is pure with respect to the OS: keys come in through the
//! [`KeySource`] trait, rendering goes out through any `io::Write`, and
//! completions come from the [`Completer`] trait. The same editor runs
//! against the raw terminal in production and against scripted keys and a
//! byte buffer in tests, so every key binding is testable without a tty.
//!
//! Rendering rewrites only the affected span of the line (tail reprint plus
//! backspaces), never the whole line.

mod buffer;
mod editor;

pub use buffer::EditBuffer;
pub use editor::LineEditor;

use std::io;

use shell_types::Key;

/// Source of decoded keystrokes.
///
/// `push_back` re-queues one key so the next `next_key` returns it; the
/// editor uses it for the Ctrl-N alias and to hand the key that terminated
/// the search submode back to the main loop.
pub trait KeySource {
    fn next_key(&mut self) -> io::Result<Key>;
    fn push_back(&mut self, key: Key);
}

impl<K: KeySource + ?Sized> KeySource for Box<K> {
    fn next_key(&mut self) -> io::Result<Key> {
        (**self).next_key()
    }

    fn push_back(&mut self, key: Key) {
        (**self).push_back(key)
    }
}

/// Completion provider for the token under the cursor.
pub trait Completer {
    /// All candidates starting with `partial`, plus their longest common
    /// prefix. An empty candidate list carries an empty prefix.
    fn complete(&self, partial: &str) -> (Vec<String>, String);
}
