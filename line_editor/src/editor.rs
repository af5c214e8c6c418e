//! Key-loop state machine and minimal-span rendering

use std::io::{self, Write};

use cmd_history::{Direction, History};
use shell_types::{Key, LINE_CAPACITY};

use crate::buffer::EditBuffer;
use crate::{Completer, KeySource};

const BELL: &[u8] = b"\x07";
const CLEAR: &[u8] = b"\x0C";

/// The line editor proper.
///
/// One instance lives for the whole session: the insert/overwrite toggle
/// persists across lines, the way the Insert key behaves in a terminal.
#[derive(Debug)]
pub struct LineEditor {
    capacity: usize,
    overwrite: bool,
}

impl LineEditor {
    pub fn new() -> Self {
        Self::with_capacity(LINE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            overwrite: false,
        }
    }

    /// Reads one finished line.
    ///
    /// Blocks on `keys` until Enter (or a full buffer) ends the line. The
    /// prompt is printed here so the search submode can redraw it.
    /// `new_cmd` resets the history cursor to the in-progress slot; a
    /// continuation prompt (interactive parameter entry) keeps it in place.
    ///
    /// The finished line is returned but NOT committed to history: the
    /// caller commits the line after bang-expansion, so a recalled `!!`
    /// never ends up referring to itself.
    pub fn read_line<S, W, C>(
        &mut self,
        keys: &mut S,
        out: &mut W,
        prompt: &str,
        history: &mut History,
        completer: &C,
        new_cmd: bool,
    ) -> io::Result<String>
    where
        S: KeySource,
        W: Write,
        C: Completer,
    {
        if new_cmd {
            history.begin_line();
        }
        let mut buf = EditBuffer::new(self.capacity);
        out.write_all(prompt.as_bytes())?;
        out.flush()?;

        loop {
            let mut key = keys.next_key()?;
            if buf.is_full() {
                // A full line cannot grow; force end-of-line.
                key = Key::Enter;
            }
            match key {
                Key::Enter => {
                    out.write_all(b"\n")?;
                    out.flush()?;
                    return Ok(buf.text());
                }

                Key::Char(c) => {
                    if self.overwrite && buf.cursor() < buf.len() {
                        buf.overwrite(c);
                        write_char(out, c)?;
                    } else if buf.insert(c) {
                        if buf.cursor() == buf.len() {
                            write_char(out, c)?;
                        } else {
                            redraw_tail(out, &buf, buf.cursor() - 1, 0)?;
                        }
                    } else {
                        out.write_all(BELL)?;
                    }
                }

                Key::Backspace | Key::Ctrl('h') => {
                    if buf.delete_left() {
                        backspaces(out, 1)?;
                        redraw_tail(out, &buf, buf.cursor(), 1)?;
                    } else {
                        out.write_all(BELL)?;
                    }
                }

                Key::Delete => {
                    if buf.delete_at() {
                        redraw_tail(out, &buf, buf.cursor(), 1)?;
                    }
                }

                Key::Ctrl('a') | Key::Home => {
                    backspaces(out, buf.cursor())?;
                    buf.move_home();
                }

                Key::Ctrl('e') | Key::End => {
                    write_str(out, &buf.tail(buf.cursor()))?;
                    buf.move_end();
                }

                Key::Ctrl('b') | Key::Left => {
                    if buf.move_left() {
                        backspaces(out, 1)?;
                    } else {
                        out.write_all(BELL)?;
                    }
                }

                Key::Ctrl('f') | Key::Right => {
                    if buf.cursor() < buf.len() {
                        let tail = buf.tail(buf.cursor());
                        if let Some(c) = tail.chars().next() {
                            write_char(out, c)?;
                        }
                        buf.move_right();
                    } else {
                        out.write_all(BELL)?;
                    }
                }

                Key::Ctrl('k') => {
                    let removed = buf.kill_to_end();
                    spaces(out, removed)?;
                    backspaces(out, removed)?;
                }

                Key::Tab => {
                    self.apply_completion(out, &mut buf, completer)?;
                }

                Key::Up => self.recall(out, &mut buf, history, Direction::Backward)?,
                Key::Down => self.recall(out, &mut buf, history, Direction::Forward)?,

                Key::PageUp => {
                    let text = buf.text();
                    match history.jump_oldest(&text) {
                        Some(entry) => {
                            let entry = entry.to_string();
                            replace_line(out, &mut buf, &entry)?;
                        }
                        None => out.write_all(BELL)?,
                    }
                }
                Key::PageDown => {
                    let entry = history.jump_latest().to_string();
                    replace_line(out, &mut buf, &entry)?;
                }

                Key::Ctrl('n') => keys.push_back(Key::Down),

                Key::Ctrl('r') => {
                    self.incremental_search(keys, out, prompt, history, &mut buf, false)?;
                }
                Key::Ctrl('s') => {
                    self.incremental_search(keys, out, prompt, history, &mut buf, true)?;
                }

                Key::Insert => self.overwrite = !self.overwrite,

                Key::Ctrl('g') => out.write_all(BELL)?,
                Key::Ctrl('l') => out.write_all(CLEAR)?,

                Key::Ctrl(_) => {}
            }
            out.flush()?;
        }
    }

    fn recall<W: Write>(
        &self,
        out: &mut W,
        buf: &mut EditBuffer,
        history: &mut History,
        direction: Direction,
    ) -> io::Result<()> {
        let current = buf.text();
        match history.recall(direction, &current) {
            Some(entry) => {
                let entry = entry.to_string();
                replace_line(out, buf, &entry)
            }
            None => out.write_all(BELL),
        }
    }

    fn apply_completion<W: Write, C: Completer>(
        &self,
        out: &mut W,
        buf: &mut EditBuffer,
        completer: &C,
    ) -> io::Result<()> {
        let token = buf.token_before_cursor();
        let start = buf.token_start();
        let (matches, common_prefix) = completer.complete(&token);
        match matches.len() {
            0 => Ok(()),
            1 => {
                let full = format!("{} ", matches[0]);
                rewrite_with_token(out, buf, start, &full)
            }
            _ => {
                // Extend to the shared prefix; a no-op when the token
                // already is that prefix.
                if common_prefix.len() > token.len() {
                    rewrite_with_token(out, buf, start, &common_prefix)
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Incremental history search submode.
    ///
    /// Replaces the whole display line with a `(reverse-i-search)` /
    /// `(i-search)` prompt while printable keys narrow the prefix; any
    /// other key ends the search, is handed back to the main loop, and the
    /// found entry (if any) becomes the edit buffer.
    fn incremental_search<S, W>(
        &self,
        keys: &mut S,
        out: &mut W,
        prompt: &str,
        history: &mut History,
        buf: &mut EditBuffer,
        forward: bool,
    ) -> io::Result<()>
    where
        S: KeySource,
        W: Write,
    {
        let at_pending = history.cursor() >= history.len();
        if history.is_empty()
            || (forward && at_pending)
            || (!forward && history.cursor() == 0 && !at_pending)
        {
            return out.write_all(BELL);
        }

        let direction = if forward {
            Direction::Forward
        } else {
            Direction::Backward
        };
        let label = if forward {
            "(i-search)"
        } else {
            "(reverse-i-search)"
        };

        // Erase the prompt and the line under edit.
        backspaces(out, prompt.len() + buf.cursor())?;
        let span = prompt.len() + buf.len();
        spaces(out, span)?;
        backspaces(out, span)?;

        let mut index = history.cursor().min(history.len() - 1);
        let mut text = String::new();
        let mut moved = false;
        // Width of the search line drawn last iteration: (cursor column,
        // total columns), used to erase it before redrawing.
        let mut drawn: Option<(usize, usize)> = None;

        loop {
            if let Some((col, total)) = drawn {
                backspaces(out, col)?;
                spaces(out, total)?;
                backspaces(out, total)?;
            }
            let head = format!("{}`{}': ", label, text);
            let entry = history.entry(index).unwrap_or("").to_string();
            write_str(out, &head)?;
            write_str(out, &entry)?;
            backspaces(out, entry.len())?;
            out.flush()?;
            drawn = Some((head.len(), head.len() + entry.len()));

            let key = keys.next_key()?;
            match key {
                Key::Char(c) => {
                    text.push(c);
                    match history.search(&text, direction, index) {
                        Some(found) => {
                            index = found;
                            moved = true;
                        }
                        None => out.write_all(BELL)?,
                    }
                }
                Key::Backspace | Key::Ctrl('h') => {
                    text.pop();
                    if !text.is_empty() {
                        if let Some(found) = history.search(&text, direction, index) {
                            index = found;
                            moved = true;
                        }
                    }
                }
                other => {
                    keys.push_back(other);
                    break;
                }
            }
        }

        if let Some((col, total)) = drawn {
            backspaces(out, col)?;
            spaces(out, total)?;
            backspaces(out, total)?;
        }

        if moved {
            if let Some(entry) = history.set_cursor(index) {
                let entry = entry.to_string();
                buf.set_text(&entry);
            }
        }
        out.write_all(prompt.as_bytes())?;
        write_str(out, &buf.text())?;
        out.flush()
    }
}

impl Default for LineEditor {
    fn default() -> Self {
        Self::new()
    }
}

fn backspaces<W: Write>(out: &mut W, n: usize) -> io::Result<()> {
    for _ in 0..n {
        out.write_all(b"\x08")?;
    }
    Ok(())
}

fn spaces<W: Write>(out: &mut W, n: usize) -> io::Result<()> {
    for _ in 0..n {
        out.write_all(b" ")?;
    }
    Ok(())
}

fn write_char<W: Write>(out: &mut W, c: char) -> io::Result<()> {
    let mut encoded = [0u8; 4];
    out.write_all(c.encode_utf8(&mut encoded).as_bytes())
}

fn write_str<W: Write>(out: &mut W, s: &str) -> io::Result<()> {
    out.write_all(s.as_bytes())
}

/// Reprints the buffer from `from` to the end (plus `erase` blanks covering
/// removed characters) and backs the terminal cursor up to the buffer
/// cursor. The terminal cursor must sit at column `from` on entry.
fn redraw_tail<W: Write>(out: &mut W, buf: &EditBuffer, from: usize, erase: usize) -> io::Result<()> {
    let tail = buf.tail(from);
    write_str(out, &tail)?;
    spaces(out, erase)?;
    let tail_len = buf.len() - from;
    backspaces(out, tail_len + erase - (buf.cursor() - from))
}

/// Wipes the current line and replaces it with `text` (history recall),
/// terminal and buffer cursors both at the end.
fn replace_line<W: Write>(out: &mut W, buf: &mut EditBuffer, text: &str) -> io::Result<()> {
    backspaces(out, buf.cursor())?;
    spaces(out, buf.len())?;
    backspaces(out, buf.len())?;
    buf.set_text(text);
    write_str(out, &buf.text())
}

/// Rewrites the line after a tab-completion changed the token at `start`.
fn rewrite_with_token<W: Write>(
    out: &mut W,
    buf: &mut EditBuffer,
    start: usize,
    replacement: &str,
) -> io::Result<()> {
    backspaces(out, buf.cursor())?;
    spaces(out, buf.len())?;
    backspaces(out, buf.len())?;
    buf.replace_token(start, replacement);
    write_str(out, &buf.text())?;
    backspaces(out, buf.len() - buf.cursor())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct ScriptedKeys {
        keys: VecDeque<Key>,
    }

    impl ScriptedKeys {
        fn new(keys: &[Key]) -> Self {
            Self {
                keys: keys.iter().copied().collect(),
            }
        }
    }

    impl KeySource for ScriptedKeys {
        fn next_key(&mut self) -> io::Result<Key> {
            self.keys
                .pop_front()
                .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted"))
        }

        fn push_back(&mut self, key: Key) {
            self.keys.push_front(key);
        }
    }

    struct Names(&'static [&'static str]);

    impl Completer for Names {
        fn complete(&self, partial: &str) -> (Vec<String>, String) {
            let matches: Vec<String> = self
                .0
                .iter()
                .filter(|name| name.starts_with(partial))
                .map(|name| name.to_string())
                .collect();
            let mut prefix = matches.first().cloned().unwrap_or_default();
            for name in &matches[1.min(matches.len())..] {
                let shared = prefix
                    .bytes()
                    .zip(name.bytes())
                    .take_while(|(a, b)| a == b)
                    .count();
                prefix.truncate(shared);
            }
            (matches, prefix)
        }
    }

    const NO_COMPLETION: Names = Names(&[]);

    fn typed(text: &str, trailing: &[Key]) -> ScriptedKeys {
        let mut keys: Vec<Key> = text.chars().map(Key::Char).collect();
        keys.extend_from_slice(trailing);
        ScriptedKeys::new(&keys)
    }

    fn run(
        editor: &mut LineEditor,
        keys: &mut ScriptedKeys,
        history: &mut History,
        completer: &Names,
    ) -> (String, Vec<u8>) {
        let mut out = Vec::new();
        let line = editor
            .read_line(keys, &mut out, "> ", history, completer, true)
            .unwrap();
        (line, out)
    }

    fn seeded_history() -> History {
        let mut h = History::new();
        h.append("lsres");
        h.append("showrpt 3");
        h.append("power 3 on");
        h
    }

    #[test]
    fn test_plain_line() {
        let mut editor = LineEditor::new();
        let mut keys = typed("lsres", &[Key::Enter]);
        let mut history = History::new();
        let (line, out) = run(&mut editor, &mut keys, &mut history, &NO_COMPLETION);
        assert_eq!(line, "lsres");
        let rendered = String::from_utf8(out).unwrap();
        assert!(rendered.starts_with("> "));
        assert!(rendered.contains("lsres"));
        assert!(rendered.ends_with('\n'));
    }

    #[test]
    fn test_backspace_edits_in_place() {
        let mut editor = LineEditor::new();
        let mut keys = typed("lsx", &[Key::Backspace]);
        keys.keys.extend("res".chars().map(Key::Char));
        keys.keys.push_back(Key::Enter);
        let mut history = History::new();
        let (line, _) = run(&mut editor, &mut keys, &mut history, &NO_COMPLETION);
        assert_eq!(line, "lsres");
    }

    #[test]
    fn test_backspace_at_origin_rings_bell() {
        let mut editor = LineEditor::new();
        let mut keys = ScriptedKeys::new(&[Key::Backspace, Key::Enter]);
        let mut history = History::new();
        let (line, out) = run(&mut editor, &mut keys, &mut history, &NO_COMPLETION);
        assert_eq!(line, "");
        assert!(out.contains(&0x07));
    }

    #[test]
    fn test_mid_line_insert_shifts_tail() {
        let mut editor = LineEditor::new();
        let mut keys = typed("pwer", &[Key::Ctrl('a'), Key::Right, Key::Char('o'), Key::Enter]);
        let mut history = History::new();
        let (line, _) = run(&mut editor, &mut keys, &mut history, &NO_COMPLETION);
        assert_eq!(line, "power");
    }

    #[test]
    fn test_delete_key_removes_under_cursor() {
        let mut editor = LineEditor::new();
        let mut keys = typed("abc", &[Key::Home, Key::Delete, Key::Enter]);
        let mut history = History::new();
        let (line, _) = run(&mut editor, &mut keys, &mut history, &NO_COMPLETION);
        assert_eq!(line, "bc");
    }

    #[test]
    fn test_unbound_control_key_is_ignored() {
        let mut editor = LineEditor::new();
        let mut keys = typed("abc", &[Key::Home, Key::Ctrl('d'), Key::Enter]);
        let mut history = History::new();
        let (line, _) = run(&mut editor, &mut keys, &mut history, &NO_COMPLETION);
        assert_eq!(line, "abc");
    }

    #[test]
    fn test_ctrl_k_kills_to_end() {
        let mut editor = LineEditor::new();
        let mut keys = typed(
            "power 3 on",
            &[
                Key::Ctrl('a'),
                Key::Right,
                Key::Right,
                Key::Right,
                Key::Right,
                Key::Right,
                Key::Ctrl('k'),
                Key::Enter,
            ],
        );
        let mut history = History::new();
        let (line, _) = run(&mut editor, &mut keys, &mut history, &NO_COMPLETION);
        assert_eq!(line, "power");
    }

    #[test]
    fn test_home_end_round_trip() {
        let mut editor = LineEditor::new();
        let mut keys = typed("bc", &[Key::Home, Key::Char('a'), Key::End, Key::Char('d'), Key::Enter]);
        let mut history = History::new();
        let (line, _) = run(&mut editor, &mut keys, &mut history, &NO_COMPLETION);
        assert_eq!(line, "abcd");
    }

    #[test]
    fn test_insert_toggles_overwrite() {
        let mut editor = LineEditor::new();
        let mut keys = typed(
            "rxt",
            &[Key::Home, Key::Right, Key::Insert, Key::Char('p'), Key::Enter],
        );
        let mut history = History::new();
        let (line, _) = run(&mut editor, &mut keys, &mut history, &NO_COMPLETION);
        assert_eq!(line, "rpt");
    }

    #[test]
    fn test_tab_single_match_appends_space() {
        let mut editor = LineEditor::new();
        let completer = Names(&["showrpt"]);
        let mut keys = typed("sh", &[Key::Tab, Key::Enter]);
        let mut history = History::new();
        let (line, _) = run(&mut editor, &mut keys, &mut history, &completer);
        assert_eq!(line, "showrpt ");
    }

    #[test]
    fn test_tab_multiple_matches_extends_to_common_prefix() {
        let mut editor = LineEditor::new();
        let completer = Names(&["showrpt", "showrdr"]);
        let mut keys = typed("sh", &[Key::Tab, Key::Enter]);
        let mut history = History::new();
        let (line, _) = run(&mut editor, &mut keys, &mut history, &completer);
        assert_eq!(line, "showr");
    }

    #[test]
    fn test_tab_noop_when_already_at_common_prefix() {
        let mut editor = LineEditor::new();
        let completer = Names(&["showrpt", "showrdr"]);
        let mut keys = typed("showr", &[Key::Tab, Key::Enter]);
        let mut history = History::new();
        let (line, _) = run(&mut editor, &mut keys, &mut history, &completer);
        assert_eq!(line, "showr");
    }

    #[test]
    fn test_tab_completes_second_token() {
        let mut editor = LineEditor::new();
        let completer = Names(&["fans"]);
        let mut keys = typed("show f", &[Key::Tab, Key::Enter]);
        let mut history = History::new();
        let (line, _) = run(&mut editor, &mut keys, &mut history, &completer);
        assert_eq!(line, "show fans ");
    }

    #[test]
    fn test_up_arrow_recalls_latest_entry() {
        let mut editor = LineEditor::new();
        let mut keys = ScriptedKeys::new(&[Key::Up, Key::Enter]);
        let mut history = seeded_history();
        let (line, _) = run(&mut editor, &mut keys, &mut history, &NO_COMPLETION);
        assert_eq!(line, "power 3 on");
    }

    #[test]
    fn test_down_restores_in_progress_text() {
        let mut editor = LineEditor::new();
        let mut keys = typed("pow", &[Key::Up, Key::Down, Key::Enter]);
        let mut history = seeded_history();
        let (line, _) = run(&mut editor, &mut keys, &mut history, &NO_COMPLETION);
        assert_eq!(line, "pow");
    }

    #[test]
    fn test_ctrl_n_is_down_alias() {
        let mut editor = LineEditor::new();
        let mut keys = typed("pow", &[Key::Up, Key::Ctrl('n'), Key::Enter]);
        let mut history = seeded_history();
        let (line, _) = run(&mut editor, &mut keys, &mut history, &NO_COMPLETION);
        assert_eq!(line, "pow");
    }

    #[test]
    fn test_up_on_empty_history_rings_bell() {
        let mut editor = LineEditor::new();
        let mut keys = ScriptedKeys::new(&[Key::Up, Key::Enter]);
        let mut history = History::new();
        let (line, out) = run(&mut editor, &mut keys, &mut history, &NO_COMPLETION);
        assert_eq!(line, "");
        assert!(out.contains(&0x07));
    }

    #[test]
    fn test_page_up_jumps_to_oldest() {
        let mut editor = LineEditor::new();
        let mut keys = ScriptedKeys::new(&[Key::PageUp, Key::Enter]);
        let mut history = seeded_history();
        let (line, _) = run(&mut editor, &mut keys, &mut history, &NO_COMPLETION);
        assert_eq!(line, "lsres");
    }

    #[test]
    fn test_page_down_returns_to_pending() {
        let mut editor = LineEditor::new();
        let mut keys = typed("pow", &[Key::PageUp, Key::PageDown, Key::Enter]);
        let mut history = seeded_history();
        let (line, _) = run(&mut editor, &mut keys, &mut history, &NO_COMPLETION);
        assert_eq!(line, "pow");
    }

    #[test]
    fn test_capacity_overflow_forces_enter() {
        let mut editor = LineEditor::with_capacity(4);
        let mut keys = typed("abcdef", &[Key::Enter]);
        let mut history = History::new();
        let (line, _) = run(&mut editor, &mut keys, &mut history, &NO_COMPLETION);
        assert_eq!(line, "abcd");
    }

    #[test]
    fn test_reverse_search_recalls_matching_entry() {
        let mut editor = LineEditor::new();
        let mut keys = ScriptedKeys::new(&[
            Key::Ctrl('r'),
            Key::Char('s'),
            Key::Char('h'),
            Key::Enter,
        ]);
        let mut history = seeded_history();
        let (line, out) = run(&mut editor, &mut keys, &mut history, &NO_COMPLETION);
        assert_eq!(line, "showrpt 3");
        let rendered = String::from_utf8(out).unwrap();
        assert!(rendered.contains("(reverse-i-search)"));
    }

    #[test]
    fn test_search_no_match_rings_bell_and_keeps_line() {
        let mut editor = LineEditor::new();
        let mut keys = ScriptedKeys::new(&[Key::Ctrl('r'), Key::Char('z'), Key::Enter]);
        let mut history = seeded_history();
        let (line, out) = run(&mut editor, &mut keys, &mut history, &NO_COMPLETION);
        assert_eq!(line, "");
        assert!(out.contains(&0x07));
    }

    #[test]
    fn test_forward_search_at_pending_rings_bell() {
        let mut editor = LineEditor::new();
        let mut keys = ScriptedKeys::new(&[Key::Ctrl('s'), Key::Enter]);
        let mut history = seeded_history();
        let (line, out) = run(&mut editor, &mut keys, &mut history, &NO_COMPLETION);
        assert_eq!(line, "");
        assert!(out.contains(&0x07));
    }

    #[test]
    fn test_forward_search_after_walking_back() {
        let mut editor = LineEditor::new();
        // Walk to the oldest entry, then search forward for "power".
        let mut keys = ScriptedKeys::new(&[
            Key::PageUp,
            Key::Ctrl('s'),
            Key::Char('p'),
            Key::Char('o'),
            Key::Enter,
        ]);
        let mut history = seeded_history();
        let (line, _) = run(&mut editor, &mut keys, &mut history, &NO_COMPLETION);
        assert_eq!(line, "power 3 on");
    }

    #[test]
    fn test_line_is_not_committed_by_editor() {
        let mut editor = LineEditor::new();
        let mut keys = typed("lsres", &[Key::Enter]);
        let mut history = History::new();
        let (_, _) = run(&mut editor, &mut keys, &mut history, &NO_COMPLETION);
        assert!(history.is_empty());
    }

    #[test]
    fn test_ctrl_g_and_l_pass_through() {
        let mut editor = LineEditor::new();
        let mut keys = ScriptedKeys::new(&[Key::Ctrl('g'), Key::Ctrl('l'), Key::Enter]);
        let mut history = History::new();
        let (line, out) = run(&mut editor, &mut keys, &mut history, &NO_COMPLETION);
        assert_eq!(line, "");
        assert!(out.contains(&0x07));
        assert!(out.contains(&0x0C));
    }
}
