//! Raw-mode terminal guard and keystroke decoding

use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::os::unix::io::AsRawFd;

use shell_types::Key;

use crate::TermError;

const ESC: u8 = 0x1B;
const CSI: u8 = b'[';

/// The controlling terminal in raw mode.
///
/// Acquiring it switches the terminal to non-canonical, no-echo mode
/// (VMIN=1, VTIME=0); dropping it restores the saved attributes. The guard
/// is acquired once per process at session start; every exit path must run
/// its drop (or call [`RawTerminal::restore`] explicitly before
/// `process::exit`), otherwise the user's shell is left in raw mode.
pub struct RawTerminal {
    tty: File,
    saved: libc::termios,
    restored: bool,
    pushback: Option<Key>,
}

impl RawTerminal {
    /// Opens the controlling terminal and enters raw mode.
    pub fn acquire() -> Result<Self, TermError> {
        let tty = OpenOptions::new()
            .read(true)
            .write(true)
            .open("/dev/tty")
            .map_err(|_| TermError::NoTerminal)?;
        let fd = tty.as_raw_fd();

        let mut saved: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(fd, &mut saved) } != 0 {
            return Err(TermError::Attrs);
        }

        let mut raw = saved;
        raw.c_lflag &= !(libc::ICANON | libc::ECHO | libc::ECHOCTL);
        raw.c_cc[libc::VMIN] = 1;
        raw.c_cc[libc::VTIME] = 0;
        if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &raw) } != 0 {
            return Err(TermError::Attrs);
        }

        Ok(Self {
            tty,
            saved,
            restored: false,
            pushback: None,
        })
    }

    /// Restores the saved terminal attributes. Idempotent; also runs on
    /// drop. Called explicitly on the `quit` path before `process::exit`.
    pub fn restore(&mut self) {
        if !self.restored {
            let fd = self.tty.as_raw_fd();
            unsafe { libc::tcsetattr(fd, libc::TCSANOW, &self.saved) };
            self.restored = true;
        }
    }

    /// Re-queues one key; the next [`RawTerminal::read_key`] returns it.
    pub fn push_back(&mut self, key: Key) {
        self.pushback = Some(key);
    }

    /// Blocking read of the next decoded keystroke.
    ///
    /// Multi-byte VT escape sequences are folded into single [`Key`]
    /// values; bytes that decode to nothing are skipped.
    pub fn read_key(&mut self) -> io::Result<Key> {
        if let Some(key) = self.pushback.take() {
            return Ok(key);
        }
        loop {
            let byte = self.read_byte()?;
            if byte != ESC {
                if let Some(key) = Key::from_byte(byte) {
                    return Ok(key);
                }
                continue;
            }
            if self.read_byte()? != CSI {
                continue;
            }
            match self.read_byte()? {
                b'A' => return Ok(Key::Up),
                b'B' => return Ok(Key::Down),
                b'C' => return Ok(Key::Right),
                b'D' => return Ok(Key::Left),
                b'H' => return Ok(Key::Home),
                b'F' => return Ok(Key::End),
                code @ (b'2' | b'3' | b'5' | b'6') => {
                    // Trailing '~'
                    self.read_byte()?;
                    return Ok(match code {
                        b'2' => Key::Insert,
                        b'3' => Key::Delete,
                        b'5' => Key::PageUp,
                        _ => Key::PageDown,
                    });
                }
                _ => continue,
            }
        }
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        let mut byte = [0u8; 1];
        loop {
            match self.tty.read(&mut byte) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "terminal closed",
                    ))
                }
                Ok(_) => return Ok(byte[0]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        self.restore();
    }
}
