//! # Shell Core Types
//!
//! Shared vocabulary for the hwshell workspace: the modal block enum, the
//! decoded keystroke type, and command result codes. Every other crate
//! depends on this one; it depends on nothing but `thiserror`.

mod block;
mod key;
mod response;

pub use block::Block;
pub use key::Key;
pub use response::{CommandFailure, CommandResult, DispatchOutcome};

/// Largest line the editor and parser will accept, in bytes.
///
/// Reaching it while typing forces an end-of-line instead of truncating.
pub const LINE_CAPACITY: usize = 1024;
