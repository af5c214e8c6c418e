//! # Command Dispatch Table
//!
//! The static registry mapping command names to handlers and to the modal
//! block each command lives in, plus the two read-only queries built on it:
//! name resolution (exact match first, then unambiguous prefix) and
//! tab-completion (match set + longest common prefix).
//!
//! The table is generic over the handler context `C` so it can stay free of
//! any knowledge of the session type that owns it.

use std::fmt;

use shell_types::{Block, CommandResult};

/// One immutable registry entry.
pub struct CommandDef<C> {
    /// Command name as typed
    pub name: &'static str,
    /// Block this command belongs to (`Block::Any` marks universal commands)
    pub block: Block,
    /// Block-entry command: visible from everywhere, and resolving it
    /// switches the active block before the handler runs.
    pub entry: bool,
    /// Handler invoked once the dispatcher is inside the right block
    pub run: fn(&mut C) -> CommandResult,
    /// Help text, including the usage line printed on parameter errors
    pub help: &'static str,
}

impl<C> fmt::Debug for CommandDef<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDef")
            .field("name", &self.name)
            .field("block", &self.block)
            .field("entry", &self.entry)
            .finish()
    }
}

/// Outcome of resolving a typed name against the visible command set.
#[derive(Debug)]
pub enum Lookup<'a, C> {
    /// Exactly one command matched (exactly, or as a unique prefix).
    Found(&'a CommandDef<C>),
    /// Nothing in the visible set matched.
    NotFound,
    /// The text is a prefix of several visible commands.
    Ambiguous,
}

/// Tab-completion answer: every visible command starting with the partial
/// text, plus the longest prefix they all share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub matches: Vec<String>,
    pub common_prefix: String,
}

impl Completion {
    /// No completion is possible.
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Read-only view over the static command table.
pub struct Registry<C: 'static> {
    defs: &'static [CommandDef<C>],
}

impl<C> Registry<C> {
    pub fn new(defs: &'static [CommandDef<C>]) -> Self {
        Self { defs }
    }

    /// Commands visible while `active` is the current block: the block's own
    /// commands, main commands, universal commands, and block entries.
    pub fn visible(&self, active: Block) -> impl Iterator<Item = &CommandDef<C>> {
        self.defs.iter().filter(move |def| {
            def.entry || def.block == active || def.block == Block::Main || def.block == Block::Any
        })
    }

    /// Resolves `name` within the visible set.
    ///
    /// An exact match always wins; otherwise the name must be a prefix of
    /// exactly one visible command. Zero or several prefix matches resolve
    /// to nothing (abbreviated entry must stay unambiguous).
    pub fn lookup(&self, name: &str, active: Block) -> Lookup<'_, C> {
        let mut prefix_match = None;
        let mut prefix_count = 0;
        for def in self.visible(active) {
            if def.name == name {
                return Lookup::Found(def);
            }
            if def.name.starts_with(name) {
                if prefix_count == 0 {
                    prefix_match = Some(def);
                }
                prefix_count += 1;
            }
        }
        match (prefix_match, prefix_count) {
            (Some(def), 1) => Lookup::Found(def),
            (_, 0) => Lookup::NotFound,
            _ => Lookup::Ambiguous,
        }
    }

    /// Tab-completion over the visible command names.
    ///
    /// Pure query: the caller decides how to apply the result to its edit
    /// buffer. An empty match set carries an empty common prefix.
    pub fn complete(&self, partial: &str, active: Block) -> Completion {
        let mut matches: Vec<String> = self
            .visible(active)
            .filter(|def| def.name.starts_with(partial))
            .map(|def| def.name.to_string())
            .collect();
        matches.sort();
        matches.dedup();
        let common_prefix = longest_common_prefix(&matches);
        Completion {
            matches,
            common_prefix,
        }
    }

    /// Visible command names in table order (the `help` listing).
    pub fn visible_names(&self, active: Block) -> Vec<&'static str> {
        self.visible(active).map(|def| def.name).collect()
    }
}

fn longest_common_prefix(names: &[String]) -> String {
    let Some(first) = names.first() else {
        return String::new();
    };
    let mut len = first.len();
    for name in &names[1..] {
        len = len.min(
            first
                .bytes()
                .zip(name.bytes())
                .take_while(|(a, b)| a == b)
                .count(),
        );
    }
    first[..len].to_string()
}
