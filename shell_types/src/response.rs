//! Command and dispatch result codes

use thiserror::Error;

/// Why a command handler gave up.
///
/// Both variants are surfaced to the user and are never fatal; when input is
/// coming from a script file they additionally abandon the rest of that file.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandFailure {
    /// Bad arguments to an otherwise-valid command; usage is printed.
    #[error("invalid parameters")]
    Params,

    /// The underlying operation failed.
    #[error("command failed")]
    Command,
}

/// What every registered handler returns.
pub type CommandResult = Result<(), CommandFailure>;

/// Result of one dispatch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No term was available, or the statement began with a non-command
    /// term; the caller must prompt for more input.
    NeedsMoreInput,
    /// The command name resolved to nothing (or to several prefixes).
    NotFound,
    /// The handler ran (successfully or not; failures were reported).
    Ran,
    /// The active block changed; the triggering term was pushed back and
    /// will be re-dispatched inside the new block.
    EnteredBlock,
}
