//! Screenful accounting for the `-more-` prompt

/// Counts printed lines against the terminal height.
///
/// The session owns the actual `-more-` interaction; the pager only decides
/// when a pause is due. One row is reserved for the prompt itself.
#[derive(Debug)]
pub struct Pager {
    rows: u16,
    printed: u16,
    pub enabled: bool,
}

impl Pager {
    pub fn new(rows: u16, enabled: bool) -> Self {
        Self {
            rows: rows.max(2),
            printed: 0,
            enabled,
        }
    }

    /// Starts a fresh listing (called per dispatched statement).
    pub fn reset(&mut self) {
        self.printed = 0;
    }

    /// Accounts for one printed line; `true` means the screen is full and
    /// the caller should pause. Pausing restarts the count.
    pub fn note_line(&mut self) -> bool {
        if !self.enabled {
            return false;
        }
        self.printed += 1;
        if self.printed >= self.rows - 1 {
            self.printed = 0;
            return true;
        }
        false
    }
}
