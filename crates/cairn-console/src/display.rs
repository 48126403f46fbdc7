use serde_json::{Value, json};

use crate::commands::ListTarget;
use crate::executor::{CommandResult, ObjectRow, TableDescription};

/// Output mode for rendering command results.
pub enum OutputMode {
    /// Human-readable output.
    Pretty,
    /// Machine-parseable JSON (one JSON object per result on stdout).
    Json,
}

/// Render a command result to stdout in the given mode.
///
/// Returns `true` to continue execution, `false` to signal exit.
pub fn render(result: &CommandResult, mode: &OutputMode) -> bool {
    match result {
        CommandResult::Ok(msg) => match mode {
            OutputMode::Pretty => print_ok(msg),
            OutputMode::Json => println!("{}", json!({"ok": true, "message": msg})),
        },
        CommandResult::Objects { target, rows } => match mode {
            OutputMode::Pretty => print_objects(*target, rows),
            OutputMode::Json => println!("{}", objects_json(*target, rows)),
        },
        CommandResult::Table(desc) => match mode {
            OutputMode::Pretty => print_table(desc),
            OutputMode::Json => println!("{}", table_json(desc)),
        },
        CommandResult::Dump(dump) => {
            let out = match mode {
                OutputMode::Pretty => serde_json::to_string_pretty(dump),
                OutputMode::Json => serde_json::to_string(dump),
            };
            match out {
                Ok(s) => println!("{s}"),
                Err(e) => render_error(&e, mode),
            }
        }
        CommandResult::Use(name) => match mode {
            OutputMode::Pretty => println!("Using database '{name}'."),
            OutputMode::Json => println!("{}", json!({"ok": true, "database": name})),
        },
        CommandResult::Help(topic) => match mode {
            OutputMode::Pretty => render_help_pretty(topic.as_deref()),
            OutputMode::Json => render_help_json(topic.as_deref()),
        },
        CommandResult::Exit => return false,
    }
    true
}

/// Render an error in the given mode (always to stderr).
pub fn render_error(err: &dyn std::fmt::Display, mode: &OutputMode) {
    match mode {
        OutputMode::Pretty => print_error(err),
        OutputMode::Json => {
            eprintln!("{}", json!({"error": err.to_string()}));
        }
    }
}

fn objects_json(target: ListTarget, rows: &[ObjectRow]) -> Value {
    let items: Vec<Value> = rows
        .iter()
        .map(|r| json!({"oid": r.oid, "name": r.name, "detail": r.detail}))
        .collect();
    let mut out = serde_json::Map::new();
    out.insert(target.label().to_string(), Value::Array(items));
    Value::Object(out)
}

fn table_json(desc: &TableDescription) -> Value {
    json!({
        "oid": desc.oid,
        "name": desc.name,
        "namespace": desc.namespace,
        "columns": desc.columns.iter().map(|c| json!({
            "num": c.num,
            "name": c.name,
            "type": c.type_name,
            "nullable": c.nullable,
            "default": c.default,
        })).collect::<Vec<_>>(),
    })
}

// ---- Pretty-print helpers ----

/// Print a listing as `oid  name  [detail]` lines.
pub fn print_objects(target: ListTarget, rows: &[ObjectRow]) {
    if rows.is_empty() {
        println!("No {}.", target.label());
        return;
    }
    let width = rows.iter().map(|r| r.name.len()).max().unwrap_or(0);
    for row in rows {
        match &row.detail {
            Some(detail) => println!("{:>6}  {:<width$}  {detail}", row.oid, row.name),
            None => println!("{:>6}  {}", row.oid, row.name),
        }
    }
}

/// Print the columns of a relation.
pub fn print_table(desc: &TableDescription) {
    match &desc.namespace {
        Some(ns) => println!("Table: {ns}.{} (oid {})", desc.name, desc.oid),
        None => println!("Table: {} (oid {})", desc.name, desc.oid),
    }
    if desc.columns.is_empty() {
        println!("  (no columns)");
        return;
    }
    let width = desc.columns.iter().map(|c| c.name.len()).max().unwrap_or(0);
    for col in &desc.columns {
        let null = if col.nullable { "NULL" } else { "NOT NULL" };
        match &col.default {
            Some(expr) => println!(
                "  {:>3}  {:<width$}  {:<9}  {null} DEFAULT {expr}",
                col.num, col.name, col.type_name
            ),
            None => println!("  {:>3}  {:<width$}  {:<9}  {null}", col.num, col.name, col.type_name),
        }
    }
}

/// Print a success message.
pub fn print_ok(msg: &str) {
    println!("{msg}");
}

/// Print an error message to stderr.
pub fn print_error(err: &dyn std::fmt::Display) {
    eprintln!("Error: {err}");
}

// ---------------------------------------------------------------------------
// Structured per-command help
// ---------------------------------------------------------------------------

struct CommandHelp {
    name: &'static str,
    summary: &'static str,
    syntax: &'static str,
    details: &'static str,
    examples: &'static [&'static str],
}

/// Lookup keys that match this command (lowercase).
fn topic_keys(cmd: &CommandHelp) -> Vec<&'static str> {
    match cmd.name {
        "LIST" => vec!["list"],
        "CREATE DATABASE" => vec!["create database"],
        "DROP DATABASE" => vec!["drop database"],
        "USE" => vec!["use"],
        "CREATE TABLE" => vec!["create table"],
        "DESCRIBE TABLE" => vec!["describe table", "describe"],
        "DUMP" => vec!["dump"],
        "HELP" => vec!["help"],
        "EXIT / QUIT" => vec!["exit", "quit"],
        _ => vec![],
    }
}

const COMMANDS: &[CommandHelp] = &[
    CommandHelp {
        name: "LIST",
        summary: "List catalog objects of one kind",
        syntax: "LIST DATABASES | TABLESPACES | NAMESPACES | TABLES | TYPES",
        details: "\
DATABASES and TABLESPACES are shared by every database. NAMESPACES, \
TABLES and TYPES are read from the active database.

TABLES lists the relations recorded in pg_class together with their namespace.",
        examples: &["LIST DATABASES", "LIST TABLES"],
    },
    CommandHelp {
        name: "CREATE DATABASE",
        summary: "Create a database and bootstrap its system relations",
        syntax: "CREATE DATABASE <name>",
        details: "Records the database in pg_database and gives it its own pg_namespace, pg_class, pg_attribute, pg_attrdef and pg_type.",
        examples: &["CREATE DATABASE app"],
    },
    CommandHelp {
        name: "DROP DATABASE",
        summary: "Reclaim a database's relations and remove it",
        syntax: "DROP DATABASE <name>",
        details: "\
Every relation outside pg_catalog is reclaimed first, then the database row is deleted. \
The default database and the active database cannot be dropped.",
        examples: &["DROP DATABASE app"],
    },
    CommandHelp {
        name: "USE",
        summary: "Switch the active database",
        syntax: "USE <database>",
        details: "",
        examples: &["USE app", "USE terrier"],
    },
    CommandHelp {
        name: "CREATE TABLE",
        summary: "Create a relation in the active database",
        syntax: "CREATE TABLE <name> (<col> <TYPE> [NULL | NOT NULL] [DEFAULT <expr>], ...) [IN <namespace>]",
        details: "\
Types: boolean, tinyint, smallint, integer, bigint, decimal, timestamp, date, varchar.
Columns are NOT NULL unless marked NULL. The namespace defaults to public.",
        examples: &[
            "CREATE TABLE users (id integer, name varchar NULL)",
            "CREATE TABLE flags (id bigint, enabled boolean DEFAULT false) IN public",
        ],
    },
    CommandHelp {
        name: "DESCRIBE TABLE",
        summary: "Show a relation's columns",
        syntax: "DESCRIBE TABLE <name>",
        details: "Shows each column's position, type, nullability and default expression.",
        examples: &["DESCRIBE TABLE users", "DESCRIBE TABLE pg_class"],
    },
    CommandHelp {
        name: "DUMP",
        summary: "Print every catalog row as JSON",
        syntax: "DUMP",
        details: "",
        examples: &["DUMP"],
    },
    CommandHelp {
        name: "HELP",
        summary: "Show available commands or help for one command",
        syntax: "HELP [command]",
        details: "",
        examples: &["HELP", "HELP CREATE TABLE"],
    },
    CommandHelp {
        name: "EXIT / QUIT",
        summary: "Exit the console",
        syntax: "EXIT  (or QUIT)",
        details: "",
        examples: &["EXIT", "QUIT"],
    },
];

fn find_command(topic: &str) -> Option<&'static CommandHelp> {
    let lower = topic.to_lowercase();
    COMMANDS
        .iter()
        .find(|cmd| topic_keys(cmd).iter().any(|k| *k == lower))
}

fn render_help_pretty(topic: Option<&str>) {
    match topic {
        None => print_help_overview(),
        Some(t) => match find_command(t) {
            Some(cmd) => print_command_help(cmd),
            None => {
                println!("Unknown help topic '{t}'. Type HELP to see available commands.");
            }
        },
    }
}

fn print_help_overview() {
    println!("Cairn Console: command reference");
    println!();
    for cmd in COMMANDS {
        println!("  {:<16} {}", cmd.name, cmd.summary);
    }
    println!();
    println!("Type HELP <command> for detailed usage and examples.");
}

fn print_command_help(cmd: &CommandHelp) {
    println!("{}: {}", cmd.name, cmd.summary);
    println!();
    println!("Syntax:");
    println!("  {}", cmd.syntax);
    if !cmd.details.is_empty() {
        println!();
        println!("{}", cmd.details);
    }
    if !cmd.examples.is_empty() {
        println!();
        println!("Examples:");
        for ex in cmd.examples {
            println!("  {ex}");
        }
    }
}

fn render_help_json(topic: Option<&str>) {
    match topic {
        None => {
            let commands: Vec<Value> = COMMANDS
                .iter()
                .map(|cmd| json!({"name": cmd.name, "summary": cmd.summary}))
                .collect();
            println!("{}", json!({ "commands": commands }));
        }
        Some(t) => match find_command(t) {
            Some(cmd) => {
                println!(
                    "{}",
                    json!({
                        "command": cmd.name,
                        "summary": cmd.summary,
                        "syntax": cmd.syntax,
                        "details": cmd.details,
                        "examples": cmd.examples,
                    })
                );
            }
            None => {
                eprintln!("{}", json!({"error": format!("Unknown help topic '{t}'")}));
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ColumnRow;

    #[test]
    fn test_every_command_has_a_topic() {
        for cmd in COMMANDS {
            assert!(!topic_keys(cmd).is_empty(), "{} has no help topic", cmd.name);
        }
    }

    #[test]
    fn test_find_command_case_insensitive() {
        assert_eq!(find_command("CREATE TABLE").unwrap().name, "CREATE TABLE");
        assert_eq!(find_command("quit").unwrap().name, "EXIT / QUIT");
        assert!(find_command("select").is_none());
    }

    #[test]
    fn test_objects_json_keyed_by_kind() {
        let rows = vec![ObjectRow {
            oid: 1,
            name: "terrier".into(),
            detail: None,
        }];
        let v = objects_json(ListTarget::Databases, &rows);
        assert_eq!(v["databases"][0]["name"], "terrier");
        assert_eq!(v["databases"][0]["oid"], 1);
    }

    #[test]
    fn test_table_json() {
        let desc = TableDescription {
            oid: 1042,
            name: "users".into(),
            namespace: Some("public".into()),
            columns: vec![ColumnRow {
                num: 1,
                name: "id".into(),
                type_name: "integer",
                nullable: false,
                default: Some("0".into()),
            }],
        };
        let v = table_json(&desc);
        assert_eq!(v["namespace"], "public");
        assert_eq!(v["columns"][0]["type"], "integer");
        assert_eq!(v["columns"][0]["default"], "0");
    }

    #[test]
    fn test_render_exit_stops() {
        assert!(!render(&CommandResult::Exit, &OutputMode::Pretty));
        assert!(render(&CommandResult::Ok("done".into()), &OutputMode::Json));
    }
}
