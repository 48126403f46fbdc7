use std::io::{BufRead, IsTerminal};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use cairn_core::catalog::Catalog;
use cairn_core::config::CatalogConfig;
use cairn_core::txn::TransactionManager;
use clap::Parser;
use rustyline::DefaultEditor;
use tracing::debug;

mod commands;
mod display;
mod executor;
mod parser;

use display::OutputMode;
use executor::Session;

/// Cairn Console: interactive and scriptable CLI over an in-process catalog.
#[derive(Parser, Debug)]
#[command(name = "cairn-console", version)]
struct Cli {
    /// Catalog configuration file (default: <config dir>/cairn/catalog.json if present).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Execute a command non-interactively (can be repeated).
    #[arg(short, long = "exec")]
    exec: Vec<String>,

    /// Output results as machine-parseable JSON.
    #[arg(short, long)]
    json: bool,
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cairn")
        .join("catalog.json")
}

/// Resolve the catalog configuration.
///
/// An explicit path must load. The default path is optional; when it does not
/// exist the built-in defaults apply.
fn load_config(explicit: Option<&Path>) -> Result<CatalogConfig, cairn_core::error::ConfigError> {
    match explicit {
        Some(path) => CatalogConfig::load(path),
        None => {
            let path = default_config_path();
            if path.is_file() {
                debug!(path = %path.display(), "loading default config");
                CatalogConfig::load(&path)
            } else {
                Ok(CatalogConfig::default())
            }
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            process::exit(1);
        }
    };
    let catalog = match Catalog::with_config(Arc::new(TransactionManager::new()), config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to bootstrap catalog: {e}");
            process::exit(1);
        }
    };
    let mut session = Session::new(catalog);

    if !cli.exec.is_empty() {
        let code = run_exec_mode(&mut session, &cli.exec, cli.json);
        process::exit(code);
    } else if !std::io::stdin().is_terminal() {
        let code = run_pipe_mode(&mut session, cli.json);
        process::exit(code);
    } else {
        run_repl(&mut session);
    }
}

fn output_mode(json_mode: bool) -> OutputMode {
    if json_mode {
        OutputMode::Json
    } else {
        OutputMode::Pretty
    }
}

/// Parse and execute one line. `Ok(false)` means the line asked to exit.
fn run_line(session: &mut Session, line: &str, mode: &OutputMode) -> Result<bool, ()> {
    let cmd = match parser::parse(line) {
        Ok(cmd) => cmd,
        Err(e) => {
            display::render_error(&e, mode);
            return Err(());
        }
    };
    match executor::execute(session, cmd) {
        Ok(result) => Ok(display::render(&result, mode)),
        Err(e) => {
            display::render_error(&e, mode);
            Err(())
        }
    }
}

/// Execute one or more commands non-interactively (--exec mode).
///
/// Returns exit code: 0 = all succeeded, 1 = first error stops execution.
fn run_exec_mode(session: &mut Session, commands: &[String], json_mode: bool) -> i32 {
    let mode = output_mode(json_mode);
    for cmd in commands {
        match run_line(session, cmd, &mode) {
            Ok(true) => {}
            Ok(false) => return 0,
            Err(()) => return 1,
        }
    }
    0
}

/// Read commands from stdin (pipe mode).
///
/// Returns exit code: 0 = all succeeded, 1 = first error.
fn run_pipe_mode(session: &mut Session, json_mode: bool) -> i32 {
    let stdin = std::io::stdin();
    run_lines(session, stdin.lock(), json_mode)
}

fn run_lines(session: &mut Session, input: impl BufRead, json_mode: bool) -> i32 {
    let mode = output_mode(json_mode);
    for line in input.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                display::render_error(&e, &mode);
                return 1;
            }
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match run_line(session, trimmed, &mode) {
            Ok(true) => {}
            Ok(false) => return 0,
            Err(()) => return 1,
        }
    }
    0
}

/// Interactive REPL mode.
fn run_repl(session: &mut Session) {
    println!("Cairn Console v{}", env!("CARGO_PKG_VERSION"));
    println!("Type HELP for available commands.\n");

    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Failed to initialize line editor: {e}");
            return;
        }
    };

    loop {
        let prompt = format!("cairn:{}> ", session.database_name());
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);
                if let Ok(false) = run_line(session, trimmed, &OutputMode::Pretty) {
                    break;
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!();
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("Bye!");
                break;
            }
            Err(e) => {
                eprintln!("Readline error: {e}");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn test_session() -> Session {
        Session::new(Catalog::new(Arc::new(TransactionManager::new())).unwrap())
    }

    fn exec(session: &mut Session, cmds: &[&str], json: bool) -> i32 {
        let cmds: Vec<String> = cmds.iter().map(|c| c.to_string()).collect();
        run_exec_mode(session, &cmds, json)
    }

    // ---- Cli parsing tests ----

    #[test]
    fn test_cli_no_args() {
        let cli = Cli::try_parse_from(["bin"]).unwrap();
        assert!(cli.config.is_none());
        assert!(cli.exec.is_empty());
        assert!(!cli.json);
    }

    #[test]
    fn test_cli_config() {
        let cli = Cli::try_parse_from(["bin", "--config", "/tmp/catalog.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/catalog.json")));
    }

    #[test]
    fn test_cli_exec_multiple() {
        let cli = Cli::try_parse_from(["bin", "-e", "LIST TABLES", "--exec", "DUMP"]).unwrap();
        assert_eq!(cli.exec, vec!["LIST TABLES", "DUMP"]);
    }

    #[test]
    fn test_cli_json_short() {
        let cli = Cli::try_parse_from(["bin", "-j"]).unwrap();
        assert!(cli.json);
    }

    #[test]
    fn test_cli_exec_missing_value() {
        assert!(Cli::try_parse_from(["bin", "--exec"]).is_err());
    }

    #[test]
    fn test_cli_unknown_flag() {
        assert!(Cli::try_parse_from(["bin", "--socket", "x"]).is_err());
    }

    // ---- config loading ----

    #[test]
    fn test_load_explicit_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, r#"{"default_database_name": "main"}"#).unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.default_database_name, "main");
    }

    #[test]
    fn test_load_missing_explicit_config_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("absent.json"))).is_err());
    }

    // ---- exec mode ----

    #[test]
    fn test_exec_list_databases() {
        let mut s = test_session();
        assert_eq!(exec(&mut s, &["LIST DATABASES"], false), 0);
        assert_eq!(exec(&mut s, &["LIST DATABASES"], true), 0);
    }

    #[test]
    fn test_exec_error_stops_early() {
        let mut s = test_session();
        let code = exec(&mut s, &["USE nowhere", "CREATE DATABASE app"], false);
        assert_eq!(code, 1);
        assert_eq!(s.catalog().directory().databases().len(), 1);
    }

    #[test]
    fn test_exec_parse_error_returns_1() {
        let mut s = test_session();
        assert_eq!(exec(&mut s, &["INVALID GIBBERISH"], true), 1);
    }

    #[test]
    fn test_exec_use_persists() {
        let mut s = test_session();
        let code = exec(
            &mut s,
            &["CREATE DATABASE app", "USE app", "CREATE TABLE t (id integer)"],
            false,
        );
        assert_eq!(code, 0);
        assert_eq!(s.database_name(), "app");
        assert_eq!(s.catalog().directory().live_user_tables(s.database()), 1);
    }

    #[test]
    fn test_exec_exit_stops_cleanly() {
        let mut s = test_session();
        assert_eq!(exec(&mut s, &["EXIT", "USE nowhere"], false), 0);
    }

    // ---- pipe mode ----

    #[test]
    fn test_lines_skip_blank() {
        let mut s = test_session();
        let input = Cursor::new("\nCREATE DATABASE app\n\n   \nLIST DATABASES\n");
        assert_eq!(run_lines(&mut s, input, false), 0);
        assert_eq!(s.catalog().directory().databases().len(), 2);
    }

    #[test]
    fn test_lines_error_returns_1() {
        let mut s = test_session();
        let input = Cursor::new("DESCRIBE TABLE missing\nCREATE DATABASE never\n");
        assert_eq!(run_lines(&mut s, input, true), 1);
        assert_eq!(s.catalog().directory().databases().len(), 1);
    }
}
