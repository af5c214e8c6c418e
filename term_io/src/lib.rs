//! # Raw Terminal I/O
//!
//! The single point of contact with the OS terminal driver: raw
//! (non-canonical, no-echo) mode acquisition with guaranteed restore,
//! escape-sequence decoding of keystrokes into [`shell_types::Key`], window
//! size queries, and the stdout redirection save-stack used by `>`/`>>`.

mod raw;
mod redirect;

pub use raw::RawTerminal;
pub use redirect::{RedirectStack, MAX_REDIRECTIONS};

use thiserror::Error;

/// Terminal-layer failures.
///
/// Only [`TermError::NoTerminal`] at startup is fatal to the process; every
/// other variant is reported and the shell keeps running.
#[derive(Debug, Error)]
pub enum TermError {
    #[error("can not open terminal")]
    NoTerminal,

    #[error("can not read terminal attrs")]
    Attrs,

    #[error("too many redirections")]
    TooManyRedirections,

    #[error("can not open/create file: {path}")]
    RedirectTarget { path: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Terminal window size in (rows, cols), with the historical 24x80 fallback
/// when the ioctl fails or reports zeros.
pub fn window_size() -> (u16, u16) {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };
    if rc != 0 || ws.ws_row == 0 || ws.ws_col == 0 {
        (24, 80)
    } else {
        (ws.ws_row, ws.ws_col)
    }
}

/// True when the given descriptor is a tty.
pub fn is_tty(fd: i32) -> bool {
    unsafe { libc::isatty(fd) == 1 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_size_has_fallback() {
        let (rows, cols) = window_size();
        assert!(rows > 0);
        assert!(cols > 0);
    }
}
