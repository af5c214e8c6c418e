//! Stdout redirection save-stack
//!
//! `>`/`>>` wrap exactly one command dispatch: `begin` swaps fd 1 for the
//! target file after saving a dup of the current stdout, `end` swaps it
//! back. The saved descriptors form a LIFO so nested redirections restore
//! in reverse order, bounded by a fixed-size array.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::os::unix::io::AsRawFd;
use std::path::Path;

use crate::TermError;

/// Maximum concurrently active redirections.
pub const MAX_REDIRECTIONS: usize = 10;

/// LIFO of saved stdout descriptors.
#[derive(Debug)]
pub struct RedirectStack {
    saved: [libc::c_int; MAX_REDIRECTIONS],
    depth: usize,
}

impl RedirectStack {
    pub fn new() -> Self {
        Self {
            saved: [-1; MAX_REDIRECTIONS],
            depth: 0,
        }
    }

    /// Current nesting depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Points fd 1 at `path`, truncating the file unless `append`.
    ///
    /// The previous stdout descriptor is saved for [`RedirectStack::end`];
    /// the file handle itself is closed once duplicated onto fd 1.
    pub fn begin(&mut self, path: &Path, append: bool) -> Result<(), TermError> {
        if self.depth >= MAX_REDIRECTIONS {
            return Err(TermError::TooManyRedirections);
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(!append)
            .append(append)
            .open(path)
            .map_err(|_| TermError::RedirectTarget {
                path: path.display().to_string(),
            })?;
        io::stdout().flush()?;
        let saved = unsafe { libc::dup(libc::STDOUT_FILENO) };
        if saved < 0 {
            return Err(TermError::Io(io::Error::last_os_error()));
        }
        if unsafe { libc::dup2(file.as_raw_fd(), libc::STDOUT_FILENO) } < 0 {
            unsafe { libc::close(saved) };
            return Err(TermError::Io(io::Error::last_os_error()));
        }
        self.saved[self.depth] = saved;
        self.depth += 1;
        Ok(())
    }

    /// Restores the most recently saved stdout descriptor.
    pub fn end(&mut self) -> Result<(), TermError> {
        if self.depth == 0 {
            return Ok(());
        }
        io::stdout().flush()?;
        self.depth -= 1;
        let saved = self.saved[self.depth];
        unsafe {
            libc::dup2(saved, libc::STDOUT_FILENO);
            libc::close(saved);
        }
        self.saved[self.depth] = -1;
        Ok(())
    }
}

impl Default for RedirectStack {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RedirectStack {
    fn drop(&mut self) {
        while self.depth > 0 {
            let _ = self.end();
        }
    }
}
