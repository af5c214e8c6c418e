//! Statement execution and command dispatch
//!
//! One statement at a time: tokenize, commit to history (interactive),
//! wrap in redirection if requested, then run the dispatch cycle until the
//! statement is spent. Block-entry commands take two cycles: the first
//! switches the active block and ungets the command term, the second
//! resolves it inside the new block and runs the handler.

use cmd_parser::{parse_statement, redirect_request, InputSource, ParseMode, Term, TermKind};
use cmd_registry::{Lookup, Registry};
use shell_types::{Block, CommandFailure, DispatchOutcome};

use crate::commands::print_available;
use crate::session::ShellSession;

/// Executes one parsed statement end to end.
pub fn execute_statement(
    session: &mut ShellSession,
    registry: &Registry<ShellSession>,
    statement: &str,
    source: InputSource,
) {
    let parsed = parse_statement(statement, ParseMode::NewCommand, source, &session.history);
    if source == InputSource::Interactive {
        // Committed after expansion, so `!!` recalls what actually ran and
        // can never refer to itself.
        session.history.append(&parsed.display);
    }
    session.cmd_line = parsed.display.clone();
    session.source = source;
    session.pager.reset();

    let redirect = match redirect_request(&parsed.terms) {
        Ok(redirect) => redirect,
        Err(_) => {
            syntax_error(session);
            return;
        }
    };

    let (exec_terms, target) = split_redirect(parsed.terms);
    if let Some(mode) = redirect {
        let Some(target) = target else {
            syntax_error(session);
            return;
        };
        if let Err(e) = session.begin_redirect(&target, mode) {
            let text = e.to_string();
            session.println(&text);
            let msg = format!("Command failed:\n{}", session.cmd_line);
            session.println(&msg);
            if source == InputSource::Script {
                session.abandon_script();
            }
            return;
        }
    }

    session.stream.reset();
    session.stream.extend(exec_terms);
    while dispatch_one(session, registry) == DispatchOutcome::EnteredBlock {}

    if redirect.is_some() {
        session.end_redirect();
    }
}

/// One dispatch cycle over the session's term stream.
pub fn dispatch_one(
    session: &mut ShellSession,
    registry: &Registry<ShellSession>,
) -> DispatchOutcome {
    let (kind, name) = match session.stream.next() {
        None => return DispatchOutcome::NeedsMoreInput,
        Some(term) => (term.kind, term.text.clone()),
    };
    if kind != TermKind::Cmd {
        // A statement that does not begin with a command term cannot be
        // dispatched; the caller re-prompts.
        return DispatchOutcome::NeedsMoreInput;
    }

    match registry.lookup(&name, session.block) {
        Lookup::NotFound | Lookup::Ambiguous => {
            let msg = format!("Invalid command:\n{}", session.cmd_line);
            session.println(&msg);
            print_available(session, registry);
            if session.source == InputSource::Script {
                session.abandon_script();
            }
            DispatchOutcome::NotFound
        }
        Lookup::Found(def) => {
            if def.block != session.block && def.block != Block::Any {
                // Block transition, both directions: entering a sub-shell
                // and falling back to main when one of its commands is
                // typed inside a sub-shell. Switch, hand the term back,
                // run it on the next cycle inside the new block.
                session.block = def.block;
                session.stream.unget();
                session.log.debug("entered block");
                return DispatchOutcome::EnteredBlock;
            }
            let run = def.run;
            let help = def.help;
            match run(session) {
                Ok(()) => DispatchOutcome::Ran,
                Err(CommandFailure::Params) => {
                    let msg = format!("Invalid parameters:\n{}", session.cmd_line);
                    session.println(&msg);
                    session.println(help);
                    if session.source == InputSource::Script {
                        session.abandon_script();
                    }
                    DispatchOutcome::Ran
                }
                Err(CommandFailure::Command) => {
                    let msg = format!("Command failed:\n{}", session.cmd_line);
                    session.println(&msg);
                    if session.source == InputSource::Script {
                        session.abandon_script();
                    }
                    DispatchOutcome::Ran
                }
            }
        }
    }
}

fn syntax_error(session: &mut ShellSession) {
    let msg = format!("Syntax error:\n{}", session.cmd_line);
    session.println(&msg);
    if session.source == InputSource::Script {
        session.abandon_script();
    }
}

/// Removes the redirection operator and its target from the statement's
/// terms so handlers only ever see their own arguments.
fn split_redirect(terms: Vec<Term>) -> (Vec<Term>, Option<String>) {
    let mut exec = Vec::with_capacity(terms.len());
    let mut target = None;
    let mut iter = terms.into_iter();
    while let Some(term) = iter.next() {
        if term.kind == TermKind::Redirect {
            match iter.next() {
                Some(next) if next.kind == TermKind::Item => target = Some(next.text),
                Some(next) => exec.push(next),
                None => {}
            }
        } else {
            exec.push(term);
        }
    }
    (exec, target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_redirect_extracts_target() {
        let terms = vec![
            Term::new(TermKind::Cmd, "lsres"),
            Term::new(TermKind::Redirect, ">"),
            Term::new(TermKind::Item, "out.txt"),
        ];
        let (exec, target) = split_redirect(terms);
        assert_eq!(exec.len(), 1);
        assert_eq!(exec[0].text, "lsres");
        assert_eq!(target.as_deref(), Some("out.txt"));
    }

    #[test]
    fn test_split_redirect_missing_target() {
        let terms = vec![
            Term::new(TermKind::Cmd, "lsres"),
            Term::new(TermKind::Redirect, ">"),
            Term::new(TermKind::CmdEnd, ";"),
        ];
        let (exec, target) = split_redirect(terms);
        assert!(target.is_none());
        // The end-of-statement fence survives the strip.
        assert_eq!(exec.last().unwrap().kind, TermKind::CmdEnd);
    }

    #[test]
    fn test_split_redirect_without_operator_is_identity() {
        let terms = vec![
            Term::new(TermKind::Cmd, "power"),
            Term::new(TermKind::Item, "3"),
            Term::new(TermKind::Item, "on"),
        ];
        let (exec, target) = split_redirect(terms.clone());
        assert_eq!(exec, terms);
        assert!(target.is_none());
    }
}
