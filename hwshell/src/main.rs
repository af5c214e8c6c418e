//! # hwshell
//!
//! Binary entry point: flag parsing, config loading, terminal setup, and
//! the session run loop.

use std::env;
use std::io::{self, BufReader};
use std::path::Path;
use std::process;

use cmd_parser::InputSource;
use line_editor::KeySource;
use shell_types::Key;
use term_io::{is_tty, RawTerminal};

use hwshell::{dispatch, registry, ShellConfig, ShellSession, SimSystem, TerminalKeys};

/// Key source for a session whose stdin is not a terminal; any read ends
/// the session.
struct NoTerminal;

impl KeySource for NoTerminal {
    fn next_key(&mut self) -> io::Result<Key> {
        Err(io::Error::from(io::ErrorKind::UnexpectedEof))
    }

    fn push_back(&mut self, _key: Key) {}
}

#[derive(Debug, Default)]
struct StartupOptions {
    config_path: Option<String>,
    script_path: Option<String>,
    host: Option<String>,
    eager_discovery: bool,
    debug: bool,
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let options = parse_args(&args).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        print_usage(&args[0]);
        process::exit(1);
    });

    let mut config = match &options.config_path {
        Some(path) => ShellConfig::load(Path::new(path)).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            process::exit(1);
        }),
        None => ShellConfig::default(),
    };
    if options.debug {
        config.debug = true;
    }
    if options.host.is_some() {
        config.host = options.host.clone();
    }

    // The session owns the raw-terminal guard; every error path below
    // returns through run_shell so its drop restores the terminal before
    // the process exits.
    let code = run_shell(&options, &config);
    if code != 0 {
        process::exit(code);
    }
}

fn run_shell(options: &StartupOptions, config: &ShellConfig) -> i32 {
    let interactive = is_tty(libc::STDIN_FILENO);
    let keys: Box<dyn KeySource> = if interactive {
        match RawTerminal::acquire() {
            Ok(term) => Box::new(TerminalKeys::new(term)),
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
    } else {
        Box::new(NoTerminal)
    };

    let system = Box::new(SimSystem::with_demo_fixture());
    let mut session = ShellSession::new(keys, Box::new(io::stdout()), system, config);
    let registry = registry();

    if !interactive {
        // Piped stdin runs like a script file.
        session.push_input(Box::new(BufReader::new(io::stdin())));
        session.set_interactive(false);
    }
    if let Some(path) = &options.script_path {
        if let Err(msg) = session.run_script(Path::new(path)) {
            eprintln!("Error: {}", msg);
            return 1;
        }
    }
    if options.eager_discovery {
        dispatch::execute_statement(&mut session, &registry, "dscv", InputSource::Script);
        dispatch::execute_statement(&mut session, &registry, "event short", InputSource::Script);
    }

    if interactive {
        let banner = format!("hwshell version {}", env!("CARGO_PKG_VERSION"));
        session.println(&banner);
        session.println("Type help for the command list");
    }

    if let Err(e) = session.run(&registry) {
        eprintln!("Error: {}", e);
        return 1;
    }
    0
}

fn parse_args(args: &[String]) -> Result<StartupOptions, String> {
    let mut options = StartupOptions::default();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "-c" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for -c".to_string());
                }
                options.config_path = Some(args[i].clone());
            }
            "-f" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for -f".to_string());
                }
                options.script_path = Some(args[i].clone());
            }
            "-n" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for -n".to_string());
                }
                options.host = Some(args[i].clone());
            }
            "-e" => {
                options.eager_discovery = true;
            }
            "-x" => {
                options.debug = true;
            }
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other => {
                return Err(format!("Unknown option: {}", other));
            }
        }
        i += 1;
    }

    Ok(options)
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} [OPTIONS]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c <FILE>    Session config file (JSON)");
    eprintln!("  -e           Discover resources at startup, short event display");
    eprintln!("  -f <FILE>    Execute commands from a file before the prompt");
    eprintln!("  -n <HOST>    Management host");
    eprintln!("  -x           Enable debug tracing");
    eprintln!("  -h, --help   Show this help message");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        std::iter::once("hwshell")
            .chain(args.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_args_defaults() {
        let options = parse_args(&argv(&[])).unwrap();
        assert!(options.config_path.is_none());
        assert!(options.script_path.is_none());
        assert!(!options.eager_discovery);
        assert!(!options.debug);
    }

    #[test]
    fn test_parse_args_all_flags() {
        let options =
            parse_args(&argv(&["-c", "cfg.json", "-e", "-f", "boot.cmd", "-n", "bmc0", "-x"]))
                .unwrap();
        assert_eq!(options.config_path.as_deref(), Some("cfg.json"));
        assert_eq!(options.script_path.as_deref(), Some("boot.cmd"));
        assert_eq!(options.host.as_deref(), Some("bmc0"));
        assert!(options.eager_discovery);
        assert!(options.debug);
    }

    #[test]
    fn test_parse_args_missing_value() {
        assert!(parse_args(&argv(&["-c"])).is_err());
        assert!(parse_args(&argv(&["-f"])).is_err());
        assert!(parse_args(&argv(&["-n"])).is_err());
    }

    #[test]
    fn test_parse_args_unknown_flag() {
        assert!(parse_args(&argv(&["-z"])).is_err());
    }

    #[test]
    fn test_missing_script_file_returns_error_code() {
        // The failure surfaces as a return value, not a process::exit, so
        // the session (and with it the terminal guard) drops normally.
        let options = StartupOptions {
            script_path: Some("/nonexistent/hwshell_boot.cmd".to_string()),
            ..StartupOptions::default()
        };
        assert_eq!(run_shell(&options, &ShellConfig::default()), 1);
    }
}
