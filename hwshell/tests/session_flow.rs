//! End-to-end sessions over scripted keystrokes and the in-memory system.
//!
//! Handler output goes to the process stdout, which redirection swaps at
//! the fd level; every test therefore serializes on one lock.

use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use cmd_registry::Registry;
use line_editor::KeySource;
use shell_types::{Block, Key};

use hwshell::{registry, ShellConfig, ShellSession, SimSystem};

static STDOUT_LOCK: Mutex<()> = Mutex::new(());

fn lock() -> std::sync::MutexGuard<'static, ()> {
    STDOUT_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

/// Replays a fixed key sequence, then reports end of input.
struct ScriptedKeys {
    keys: VecDeque<Key>,
}

impl ScriptedKeys {
    fn typed(text: &str) -> Self {
        let keys = text
            .chars()
            .map(|c| match c {
                '\n' => Key::Enter,
                '\t' => Key::Tab,
                other => Key::Char(other),
            })
            .collect();
        Self { keys }
    }
}

impl KeySource for ScriptedKeys {
    fn next_key(&mut self) -> io::Result<Key> {
        self.keys
            .pop_front()
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))
    }

    fn push_back(&mut self, key: Key) {
        self.keys.push_front(key);
    }
}

fn session_typing(text: &str) -> (ShellSession, Registry<ShellSession>) {
    let config = ShellConfig {
        pager: false,
        ..ShellConfig::default()
    };
    let session = ShellSession::new(
        Box::new(ScriptedKeys::typed(text)),
        Box::new(io::sink()),
        Box::new(SimSystem::with_demo_fixture()),
        &config,
    );
    (session, registry())
}

fn history_of(session: &ShellSession) -> Vec<String> {
    session.history().iter().map(String::from).collect()
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("hwshell_it_{}_{}", std::process::id(), name))
}

#[test]
fn test_semicolon_runs_both_statements() {
    let _guard = lock();
    let (mut session, registry) = session_typing("power 1 off; power 2 off\n");
    session.run(&registry).unwrap();
    let resources = session.system().resources();
    assert!(!resources[0].powered);
    assert!(!resources[1].powered);
    // One history entry per statement, not per physical line.
    assert_eq!(history_of(&session), vec!["power 1 off", "power 2 off"]);
}

#[test]
fn test_unknown_command_does_not_stop_the_session() {
    let _guard = lock();
    // Both statements come from one physical line; the failed first one
    // does not keep the second from running.
    let (mut session, registry) = session_typing("frobnicate; settag 2 \"Rear Tray\"\n");
    session.run(&registry).unwrap();
    assert_eq!(session.system().resources()[1].tag, "Rear Tray");
    assert_eq!(
        history_of(&session),
        vec!["frobnicate", "settag 2 \"Rear Tray\""]
    );
}

#[test]
fn test_bang_bang_repeats_previous_command() {
    let _guard = lock();
    let (mut session, registry) = session_typing("power 2 off\n!!\n");
    session.run(&registry).unwrap();
    // The expansion is what lands in history, so `!!` can never self-refer.
    assert_eq!(history_of(&session), vec!["power 2 off", "power 2 off"]);
}

#[test]
fn test_recalled_quoted_argument_survives_reparse() {
    let _guard = lock();
    // The `!!` expansion re-parses the history text; a quoted argument
    // must come back as one term, not split on its space.
    let (mut session, registry) = session_typing("settag 2 \"Rear Tray\"\n!!\n");
    session.run(&registry).unwrap();
    assert_eq!(session.system().resources()[1].tag, "Rear Tray");
    assert_eq!(
        history_of(&session),
        vec!["settag 2 \"Rear Tray\"", "settag 2 \"Rear Tray\""]
    );
}

#[test]
fn test_bang_prefix_recalls_matching_command() {
    let _guard = lock();
    let (mut session, registry) = session_typing("settag 1 Edge\npower 1 off\n!set\n");
    session.run(&registry).unwrap();
    assert_eq!(
        history_of(&session),
        vec!["settag 1 Edge", "power 1 off", "settag 1 Edge"]
    );
}

#[test]
fn test_block_entry_and_quit_lifecycle() {
    let _guard = lock();
    let (mut session, registry) = session_typing("sen 1 1\nshow\nquit\nquit\n");
    session.run(&registry).unwrap();
    // First quit fell back to main, second one ended the session.
    assert_eq!(session.block(), Block::Main);
    assert!(session.exit_requested());
}

#[test]
fn test_block_commands_mutate_selected_instrument() {
    let _guard = lock();
    let (mut session, registry) = session_typing("sen 1 1\ndisable\nsetthres 10 40\nquit\n");
    session.run(&registry).unwrap();
    let sensor = &session.system().resources()[0].sensors[0];
    assert!(!sensor.enabled);
    assert_eq!(sensor.threshold_low, 10.0);
    assert_eq!(sensor.threshold_high, 40.0);
}

#[test]
fn test_missing_argument_is_prompted_interactively() {
    let _guard = lock();
    // `power` with no arguments pulls both from follow-up prompts.
    let (mut session, registry) = session_typing("power\n2\noff\n");
    session.run(&registry).unwrap();
    assert!(!session.system().resources()[1].powered);
}

#[test]
fn test_control_block_setstate() {
    let _guard = lock();
    let (mut session, registry) = session_typing("ctrl 2 1\nsetstate manual\nstate\nquit\nquit\n");
    session.run(&registry).unwrap();
    assert_eq!(session.system().resources()[1].controls[0].state, "manual");
    assert!(session.exit_requested());
}

#[test]
fn test_main_command_leaves_the_block() {
    let _guard = lock();
    // A main-block command typed inside a sub-shell falls back to main
    // and still runs there.
    let (mut session, registry) = session_typing("sen 1 1\npower 2 off\n");
    session.run(&registry).unwrap();
    assert_eq!(session.block(), Block::Main);
    assert!(!session.system().resources()[1].powered);
}

#[test]
fn test_direct_block_to_block_transition() {
    let _guard = lock();
    // `ctrl` typed inside the sensor block switches without passing main.
    let (mut session, registry) = session_typing("sen 1 1\nctrl 2 1\n");
    session.run(&registry).unwrap();
    assert_eq!(session.block(), Block::Control);
}

#[test]
fn test_redirect_sends_output_to_file() {
    let _guard = lock();
    let path = temp_path("redirect.txt");
    let line = format!("lsres > {}\n", path.display());
    let (mut session, registry) = session_typing(&line);
    session.run(&registry).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("Resource 1"));
    assert!(text.contains("Resource 2"));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_redirect_append_keeps_existing_content() {
    let _guard = lock();
    let path = temp_path("append.txt");
    let line = format!(
        "echo first >> {}\necho second >> {}\n",
        path.display(),
        path.display()
    );
    let (mut session, registry) = session_typing(&line);
    session.run(&registry).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("first"));
    assert!(text.contains("second"));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_script_file_runs_before_the_prompt() {
    let _guard = lock();
    let path = temp_path("boot.cmd");
    std::fs::write(&path, "# boot commands\ndscv\npower 2 off; settag 1 Renamed\n").unwrap();
    let (mut session, registry) = session_typing("");
    session.run_script(&path).unwrap();
    session.run(&registry).unwrap();
    let resources = session.system().resources();
    assert!(!resources[1].powered);
    assert_eq!(resources[0].tag, "Renamed");
    // Script statements never reach history.
    assert!(session.history().is_empty());
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_script_error_abandons_rest_of_file() {
    let _guard = lock();
    let path = temp_path("bad.cmd");
    // Scripts cannot prompt for missing arguments, so the first statement
    // fails and the rest of the file is dropped.
    std::fs::write(&path, "settag 1\nsettag 1 Recovered\n").unwrap();
    let (mut session, registry) = session_typing("");
    session.run_script(&path).unwrap();
    session.run(&registry).unwrap();
    assert_eq!(session.system().resources()[0].tag, "System Chassis");
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_tab_completes_unique_command() {
    let _guard = lock();
    // `ds<Tab>` is unique in the main block and completes to `dscv `.
    let (mut session, registry) = session_typing("ds\t\n");
    session.run(&registry).unwrap();
    assert_eq!(history_of(&session), vec!["dscv"]);
}

#[test]
fn test_abbreviated_command_resolves_unique_prefix() {
    let _guard = lock();
    // `pow` is a prefix of exactly one visible command.
    let (mut session, registry) = session_typing("pow 1 off\n");
    session.run(&registry).unwrap();
    assert!(!session.system().resources()[0].powered);
}

#[test]
fn test_quit_abbreviation_exits_from_main() {
    let _guard = lock();
    let (mut session, registry) = session_typing("q\n");
    session.run(&registry).unwrap();
    assert!(session.exit_requested());
}

#[test]
fn test_comment_lines_are_ignored() {
    let _guard = lock();
    let (mut session, registry) = session_typing("# nothing to see\n\npower 1 off\n");
    session.run(&registry).unwrap();
    assert_eq!(history_of(&session), vec!["power 1 off"]);
}
