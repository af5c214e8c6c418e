//! Session state and input plumbing
//!
//! [`ShellSession`] owns everything a shell run mutates: the active block,
//! the history store, the term stream,
//! the redirection save-stack, the bounded stack of open script files, and
//! the display flags. Single-threaded by construction; handlers receive
//! `&mut ShellSession` and nothing else.

use std::fmt::Display;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use cmd_history::History;
use cmd_parser::{
    is_comment, parse_statement, split_first_statement, InputSource, ParseMode, RedirectMode,
    TermStream,
};
use cmd_registry::Registry;
use line_editor::{Completer, KeySource, LineEditor};
use shell_logger::{LogEntry, LogLevel, TraceLog};
use shell_types::{Block, CommandFailure, Key};
use term_io::{window_size, RawTerminal, RedirectStack, TermError};

use crate::backend::ManagedSystem;
use crate::config::ShellConfig;
use crate::pager::Pager;

/// Bound on concurrently open input files (`-f` plus nested `run`).
pub const MAX_INPUT_FILES: usize = 10;

/// How received events are rendered at the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDisplay {
    Off,
    Short,
    Full,
}

/// Resource/instrument pair selected when entering a sub-block.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlockEnv {
    pub resource: Option<u32>,
    pub instrument: Option<u32>,
}

impl BlockEnv {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// [`line_editor::KeySource`] over the raw terminal.
pub struct TerminalKeys {
    term: RawTerminal,
}

impl TerminalKeys {
    pub fn new(term: RawTerminal) -> Self {
        Self { term }
    }
}

impl KeySource for TerminalKeys {
    fn next_key(&mut self) -> io::Result<Key> {
        self.term.read_key()
    }

    fn push_back(&mut self, key: Key) {
        self.term.push_back(key)
    }
}

/// Parameter prompts complete nothing; only command names complete.
struct NullCompleter;

impl Completer for NullCompleter {
    fn complete(&self, _partial: &str) -> (Vec<String>, String) {
        (Vec::new(), String::new())
    }
}

/// Command-name completion within the currently active block.
struct BlockCompleter<'a> {
    registry: &'a Registry<ShellSession>,
    block: Block,
}

impl Completer for BlockCompleter<'_> {
    fn complete(&self, partial: &str) -> (Vec<String>, String) {
        let completion = self.registry.complete(partial, self.block);
        (completion.matches, completion.common_prefix)
    }
}

/// All mutable state of one shell run.
pub struct ShellSession {
    pub(crate) block: Block,
    pub(crate) history: History,
    pub(crate) stream: TermStream,
    pub(crate) system: Box<dyn ManagedSystem>,
    pub(crate) log: TraceLog,
    pub(crate) block_env: BlockEnv,
    pub(crate) event_display: EventDisplay,
    pub(crate) host: Option<String>,
    /// Display text of the statement being dispatched (diagnostics).
    pub(crate) cmd_line: String,
    /// Source of the statement being dispatched.
    pub(crate) source: InputSource,
    pub(crate) exit_requested: bool,
    pub(crate) pager: Pager,

    editor: LineEditor,
    keys: Box<dyn KeySource>,
    term: Box<dyn Write>,
    redirects: RedirectStack,
    scripts: Vec<Box<dyn BufRead>>,
    main_prompt: String,
    /// Unconsumed statements from the current physical line (after `;`).
    pending: String,
    pending_source: InputSource,
    interactive: bool,
}

impl ShellSession {
    pub fn new(
        keys: Box<dyn KeySource>,
        term: Box<dyn Write>,
        system: Box<dyn ManagedSystem>,
        config: &ShellConfig,
    ) -> Self {
        let (rows, _) = window_size();
        let mut log = TraceLog::new();
        log.set_echo(config.debug);
        Self {
            block: Block::Main,
            history: History::new(),
            stream: TermStream::new(),
            system,
            log,
            block_env: BlockEnv::default(),
            event_display: EventDisplay::Off,
            host: config.host.clone(),
            cmd_line: String::new(),
            source: InputSource::Interactive,
            exit_requested: false,
            pager: Pager::new(rows, config.pager),
            editor: LineEditor::new(),
            keys,
            term,
            redirects: RedirectStack::new(),
            scripts: Vec::new(),
            main_prompt: config.prompt.clone(),
            pending: String::new(),
            pending_source: InputSource::Interactive,
            interactive: true,
        }
    }

    /// A session whose input never reaches a terminal (`-f` with no tty,
    /// piped stdin): once the script stack drains, the session ends.
    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    pub fn block(&self) -> Block {
        self.block
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn system(&self) -> &dyn ManagedSystem {
        self.system.as_ref()
    }

    pub fn prompt(&self) -> &str {
        if self.block.is_main() {
            &self.main_prompt
        } else {
            self.block.prompt()
        }
    }

    /// Runs statements until `quit` or end of input.
    pub fn run(&mut self, registry: &Registry<ShellSession>) -> io::Result<()> {
        while !self.exit_requested {
            let next = match self.next_statement(registry) {
                Ok(next) => next,
                // Terminal closed under us: same as quit.
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e),
            };
            let Some((statement, source)) = next else {
                break;
            };
            crate::dispatch::execute_statement(self, registry, &statement, source);
        }
        Ok(())
    }

    /// Next `;`-separated statement, reading physical lines as needed.
    /// `None` means input is exhausted.
    pub(crate) fn next_statement(
        &mut self,
        registry: &Registry<ShellSession>,
    ) -> io::Result<Option<(String, InputSource)>> {
        loop {
            if !self.pending.is_empty() {
                let (statement, rest) = split_first_statement(&self.pending);
                let statement = statement.trim().to_string();
                self.pending = rest.to_string();
                if statement.is_empty() {
                    continue;
                }
                return Ok(Some((statement, self.pending_source)));
            }
            let Some((line, source)) = self.next_line(registry)? else {
                return Ok(None);
            };
            if is_comment(&line) || line.trim().is_empty() {
                continue;
            }
            self.pending = line;
            self.pending_source = source;
        }
    }

    fn next_line(
        &mut self,
        registry: &Registry<ShellSession>,
    ) -> io::Result<Option<(String, InputSource)>> {
        while let Some(reader) = self.scripts.last_mut() {
            let mut line = String::new();
            match reader.read_line(&mut line) {
                Ok(0) => {
                    self.scripts.pop();
                }
                Ok(_) => return Ok(Some((line.trim_end().to_string(), InputSource::Script))),
                Err(_) => {
                    // Unreadable file: drop it, keep the session alive.
                    self.scripts.pop();
                }
            }
        }
        if !self.interactive {
            return Ok(None);
        }
        let completer = BlockCompleter {
            registry,
            block: self.block,
        };
        let prompt = if self.block.is_main() {
            self.main_prompt.clone()
        } else {
            self.block.prompt().to_string()
        };
        let line = self.editor.read_line(
            &mut self.keys,
            &mut self.term,
            &prompt,
            &mut self.history,
            &completer,
            true,
        )?;
        Ok(Some((line, InputSource::Interactive)))
    }

    /// Pushes a script file onto the input stack (`-f`, `run`).
    pub fn run_script(&mut self, path: &Path) -> Result<(), String> {
        if self.scripts.len() >= MAX_INPUT_FILES {
            return Err(format!(
                "too many open input files (max {})",
                MAX_INPUT_FILES
            ));
        }
        let file = File::open(path)
            .map_err(|e| format!("can not run file {}: {}", path.display(), e))?;
        self.scripts.push(Box::new(BufReader::new(file)));
        self.log.record(
            LogEntry::new(LogLevel::Info, "script file opened")
                .with_field("path", path.display().to_string()),
        );
        Ok(())
    }

    /// Any boxed reader works as a script source (piped stdin).
    pub fn push_input(&mut self, reader: Box<dyn BufRead>) -> bool {
        if self.scripts.len() >= MAX_INPUT_FILES {
            return false;
        }
        self.scripts.push(reader);
        true
    }

    /// A handler error inside a script abandons the rest of that file and
    /// falls back to the next input source.
    pub(crate) fn abandon_script(&mut self) {
        if self.scripts.pop().is_some() {
            self.log.debug("script abandoned after command error");
        }
        self.pending.clear();
    }

    // ---- handler output ----------------------------------------------

    /// Prints one line of command output to stdout (which redirection may
    /// have pointed at a file), paging on a full screen. Returns `false`
    /// when the user aborted the listing at the `-more-` prompt.
    pub fn println(&mut self, text: &str) -> bool {
        {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            let _ = out.write_all(text.as_bytes());
            let _ = out.write_all(b"\n");
            let _ = out.flush();
        }
        if !self.interactive || self.redirects.depth() > 0 {
            return true;
        }
        for _ in 0..text.split('\n').count() {
            if self.pager.note_line() && !self.more_prompt() {
                return false;
            }
        }
        true
    }

    fn more_prompt(&mut self) -> bool {
        const PROMPT: &[u8] = b"-more-";
        let _ = self.term.write_all(PROMPT);
        let _ = self.term.flush();
        let key = self.keys.next_key();
        for _ in 0..PROMPT.len() {
            let _ = self.term.write_all(b"\x08 \x08");
        }
        let _ = self.term.flush();
        !matches!(key, Ok(Key::Char('q')) | Ok(Key::Char('Q')) | Err(_))
    }

    /// Prints a failure message and converts it into the command-error
    /// result handlers return through `?`.
    pub(crate) fn fail(&mut self, err: impl Display) -> CommandFailure {
        let text = err.to_string();
        self.println(&text);
        CommandFailure::Command
    }

    // ---- handler parameters ------------------------------------------

    /// Next argument term of the current statement, if any.
    pub(crate) fn next_arg(&mut self) -> Option<String> {
        self.stream.next().map(|t| t.text.clone())
    }

    /// Next argument, prompting interactively when the statement ran out.
    ///
    /// Script statements cannot prompt; a missing argument there is a
    /// parameter error.
    pub(crate) fn ask_string(&mut self, prompt: &str) -> Result<String, CommandFailure> {
        if let Some(arg) = self.next_arg() {
            return Ok(arg);
        }
        if self.source == InputSource::Script || !self.interactive {
            return Err(CommandFailure::Params);
        }
        let line = self
            .editor
            .read_line(
                &mut self.keys,
                &mut self.term,
                prompt,
                &mut self.history,
                &NullCompleter,
                false,
            )
            .map_err(|_| CommandFailure::Command)?;
        let parsed = parse_statement(
            &line,
            ParseMode::Arguments,
            InputSource::Interactive,
            &self.history,
        );
        self.stream.extend(parsed.terms);
        self.next_arg().ok_or(CommandFailure::Params)
    }

    pub(crate) fn ask_int(&mut self, prompt: &str) -> Result<u32, CommandFailure> {
        let text = self.ask_string(prompt)?;
        parse_u32(&text).ok_or(CommandFailure::Params)
    }

    pub(crate) fn ask_float(&mut self, prompt: &str) -> Result<f64, CommandFailure> {
        let text = self.ask_string(prompt)?;
        text.parse().map_err(|_| CommandFailure::Params)
    }

    /// Resource selected on block entry.
    pub(crate) fn env_resource(&self) -> Result<u32, CommandFailure> {
        self.block_env.resource.ok_or(CommandFailure::Params)
    }

    /// Instrument selected on block entry.
    pub(crate) fn env_instrument(&self) -> Result<u32, CommandFailure> {
        self.block_env.instrument.ok_or(CommandFailure::Params)
    }

    // ---- redirection --------------------------------------------------

    pub(crate) fn begin_redirect(
        &mut self,
        path: &str,
        mode: RedirectMode,
    ) -> Result<(), TermError> {
        self.redirects
            .begin(Path::new(path), mode == RedirectMode::Append)
    }

    pub(crate) fn end_redirect(&mut self) {
        let _ = self.redirects.end();
    }
}

/// Accepts decimal or `0x`-prefixed hex.
pub(crate) fn parse_u32(text: &str) -> Option<u32> {
    if let Some(hex) = text.strip_prefix("0x") {
        u32::from_str_radix(hex, 16).ok()
    } else {
        text.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_u32_decimal_and_hex() {
        assert_eq!(parse_u32("42"), Some(42));
        assert_eq!(parse_u32("0x2a"), Some(42));
        assert_eq!(parse_u32("nope"), None);
        assert_eq!(parse_u32("0xzz"), None);
    }

    #[test]
    fn test_block_env_clear() {
        let mut env = BlockEnv {
            resource: Some(1),
            instrument: Some(2),
        };
        env.clear();
        assert!(env.resource.is_none());
        assert!(env.instrument.is_none());
    }
}
