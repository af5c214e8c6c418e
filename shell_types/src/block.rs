//! Modal sub-shell blocks

use std::fmt;

/// The modal sub-shell a command belongs to (and the one currently active).
///
/// The shell is always in exactly one block. Commands registered under
/// `Main` stay reachable from every sub-shell; `Any` marks universal
/// commands (`help`, `quit`, ...). Blocks do not nest: the only transitions
/// are main -> one sub-block -> main (or directly between sub-blocks, which
/// passes through the same single-level mechanism).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Block {
    /// Top-level shell
    Main,
    /// Universal marker: valid in every block
    Any,
    /// Sensor instrument sub-shell
    Sensor,
    /// Control instrument sub-shell
    Control,
    /// Inventory data sub-shell
    Inventory,
    /// Annunciator sub-shell
    Annunciator,
    /// Hot-swap management sub-shell
    HotSwap,
    /// Diagnostics sub-shell
    Diag,
    /// Firmware upgrade sub-shell
    Firmware,
}

impl Block {
    /// Prompt shown while this block is active.
    pub fn prompt(&self) -> &'static str {
        match self {
            Block::Main | Block::Any => "hwshell> ",
            Block::Sensor => "sensor block ==> ",
            Block::Control => "control block ==> ",
            Block::Inventory => "inventory block ==> ",
            Block::Annunciator => "annunciator block ==> ",
            Block::HotSwap => "hot swap block ==> ",
            Block::Diag => "diag block ==> ",
            Block::Firmware => "firmware block ==> ",
        }
    }

    /// True for the top-level block.
    pub fn is_main(&self) -> bool {
        matches!(self, Block::Main)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Block::Main => "main",
            Block::Any => "any",
            Block::Sensor => "sensor",
            Block::Control => "control",
            Block::Inventory => "inventory",
            Block::Annunciator => "annunciator",
            Block::HotSwap => "hot swap",
            Block::Diag => "diag",
            Block::Firmware => "firmware",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_prompt() {
        assert_eq!(Block::Main.prompt(), "hwshell> ");
        assert!(Block::Main.is_main());
    }

    #[test]
    fn test_block_prompts_differ() {
        assert_eq!(Block::Sensor.prompt(), "sensor block ==> ");
        assert_eq!(Block::HotSwap.prompt(), "hot swap block ==> ");
        assert!(!Block::Sensor.is_main());
    }
}
