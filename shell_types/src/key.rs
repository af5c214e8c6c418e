//! Platform-independent key representation
//!
//! The terminal layer decodes raw bytes (including VT escape sequences) into
//! these values; the line editor consumes them without knowing where they
//! came from.

/// One decoded keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Printable character
    Char(char),

    // Navigation
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,

    // Editing
    Enter,
    Backspace,
    Delete,
    Insert,
    Tab,

    /// Control-chord (`Ctrl('a')` for Ctrl-A, always lowercase)
    Ctrl(char),
}

impl Key {
    /// Decodes a single non-escape byte.
    ///
    /// Escape sequences span several bytes and are decoded by the terminal
    /// layer; `None` means the byte is not meaningful on its own.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'\n' | b'\r' => Some(Key::Enter),
            b'\t' => Some(Key::Tab),
            0x08 | 0x7F => Some(Key::Backspace),
            c @ 0x01..=0x1A => Some(Key::Ctrl((b'a' + c - 1) as char)),
            c if (0x20..0x7F).contains(&c) => Some(Key::Char(c as char)),
            _ => None,
        }
    }

    /// True for keys the incremental-search submode treats as search text.
    pub fn is_printable(&self) -> bool {
        matches!(self, Key::Char(_))
    }
}
