//! Single-line edit buffer
//!
//! Holds the line being typed and the cursor, maintaining the invariant
//! `0 <= cursor <= len <= capacity`. All mutations are pure buffer
//! operations; rendering is the editor's job.

/// The line under edit.
#[derive(Debug)]
pub struct EditBuffer {
    chars: Vec<char>,
    cursor: usize,
    capacity: usize,
}

impl EditBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            chars: Vec::new(),
            cursor: 0,
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// True when no further character can be inserted.
    pub fn is_full(&self) -> bool {
        self.chars.len() >= self.capacity
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    /// Characters from `from` to the end of the line.
    pub fn tail(&self, from: usize) -> String {
        self.chars[from.min(self.chars.len())..].iter().collect()
    }

    /// Inserts at the cursor, shifting the tail right. Returns `false`
    /// (and changes nothing) when the buffer is full.
    pub fn insert(&mut self, ch: char) -> bool {
        if self.is_full() {
            return false;
        }
        self.chars.insert(self.cursor, ch);
        self.cursor += 1;
        true
    }

    /// Replaces the character at the cursor (insert-toggle mode); appends
    /// when the cursor sits at the end.
    pub fn overwrite(&mut self, ch: char) -> bool {
        if self.cursor == self.chars.len() {
            return self.insert(ch);
        }
        self.chars[self.cursor] = ch;
        self.cursor += 1;
        true
    }

    /// Backspace: removes the character left of the cursor.
    pub fn delete_left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        self.chars.remove(self.cursor);
        true
    }

    /// Delete: removes the character at the cursor, cursor unchanged.
    pub fn delete_at(&mut self) -> bool {
        if self.cursor >= self.chars.len() {
            return false;
        }
        self.chars.remove(self.cursor);
        true
    }

    /// Ctrl-K: drops everything from the cursor to the end, returning how
    /// many characters were removed.
    pub fn kill_to_end(&mut self) -> usize {
        let removed = self.chars.len() - self.cursor;
        self.chars.truncate(self.cursor);
        removed
    }

    pub fn move_left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    pub fn move_right(&mut self) -> bool {
        if self.cursor >= self.chars.len() {
            return false;
        }
        self.cursor += 1;
        true
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.chars.len();
    }

    /// Replaces the whole line (history recall), cursor at the end. Text
    /// beyond capacity is truncated.
    pub fn set_text(&mut self, text: &str) {
        self.chars = text.chars().take(self.capacity).collect();
        self.cursor = self.chars.len();
    }

    pub fn clear(&mut self) {
        self.chars.clear();
        self.cursor = 0;
    }

    /// Start index of the whitespace-delimited token ending at the cursor.
    pub fn token_start(&self) -> usize {
        let mut start = self.cursor;
        while start > 0 && !self.chars[start - 1].is_whitespace() {
            start -= 1;
        }
        start
    }

    /// The token ending at the cursor (tab-completion input).
    pub fn token_before_cursor(&self) -> String {
        self.chars[self.token_start()..self.cursor].iter().collect()
    }

    /// Replaces `start..cursor` with `replacement`, cursor after it.
    pub fn replace_token(&mut self, start: usize, replacement: &str) {
        let mut chars: Vec<char> = self.chars[..start].to_vec();
        chars.extend(replacement.chars());
        chars.extend_from_slice(&self.chars[self.cursor..]);
        chars.truncate(self.capacity);
        self.cursor = (start + replacement.chars().count()).min(chars.len());
        self.chars = chars;
    }
}
