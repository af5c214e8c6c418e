//! # Hardware Management Shell
//!
//! Interactive command shell over a managed hardware system: a line editor
//! with history, tab-completion and incremental search, a quote- and
//! history-aware tokenizer, and a modal dispatcher that narrows the visible
//! command set while a sensor, control, inventory, annunciator, hot swap,
//! diagnostics, or firmware block is active.
//!
//! The library exposes the session and command table so integration tests
//! can drive a complete shell over scripted keystrokes and an in-memory
//! managed system.

pub mod backend;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod pager;
pub mod session;

pub use backend::{BackendError, HotSwapState, ManagedSystem, Severity, SimSystem};
pub use commands::registry;
pub use config::{ConfigError, ShellConfig};
pub use session::{ShellSession, TerminalKeys, MAX_INPUT_FILES};
