use cairn_core::catalog::ColumnDef;
use cairn_core::types::TypeId;

use crate::commands::{Command, ListTarget};

/// Namespace a table lands in when `CREATE TABLE` has no `IN` clause.
pub const DEFAULT_NAMESPACE: &str = "public";

/// Tokenize an input line.
///
/// Words are split on whitespace. `(`, `)` and `,` are tokens of their own.
/// A single- or double-quoted string is one token with its quotes kept.
fn tokenize(input: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let len = chars.len();
    let mut i = 0;

    while i < len {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c == '(' || c == ')' || c == ',' {
            tokens.push(c.to_string());
            i += 1;
            continue;
        }

        if c == '\'' || c == '"' {
            let start = i;
            i += 1;
            while i < len && chars[i] != c {
                if chars[i] == '\\' {
                    i += 1;
                }
                i += 1;
            }
            if i >= len {
                return Err("Unterminated quoted string".to_string());
            }
            i += 1;
            tokens.push(chars[start..i].iter().collect());
            continue;
        }

        let start = i;
        while i < len
            && !chars[i].is_whitespace()
            && !matches!(chars[i], '(' | ')' | ',' | '\'' | '"')
        {
            i += 1;
        }
        tokens.push(chars[start..i].iter().collect());
    }

    Ok(tokens)
}

/// Strip matching quotes from an identifier token.
fn identifier(token: &str) -> String {
    let quoted = token.len() >= 2
        && ((token.starts_with('"') && token.ends_with('"'))
            || (token.starts_with('\'') && token.ends_with('\'')));
    if quoted {
        token[1..token.len() - 1].to_string()
    } else {
        token.to_string()
    }
}

fn is_keyword(token: &str, keyword: &str) -> bool {
    token.eq_ignore_ascii_case(keyword)
}

/// Parse an input line into a [`Command`].
pub fn parse(input: &str) -> Result<Command, String> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err("Empty command".to_string());
    }

    let first = tokens[0].to_uppercase();
    match first.as_str() {
        "LIST" => parse_list(&tokens),
        "CREATE" => match tokens.get(1).map(|t| t.to_uppercase()).as_deref() {
            Some("DATABASE") => Ok(Command::CreateDatabase {
                name: single_name(&tokens, "CREATE DATABASE <name>")?,
            }),
            Some("TABLE") => parse_create_table(&tokens),
            _ => Err("Expected DATABASE or TABLE after CREATE".to_string()),
        },
        "DROP" => match tokens.get(1).map(|t| t.to_uppercase()).as_deref() {
            Some("DATABASE") => Ok(Command::DropDatabase {
                name: single_name(&tokens, "DROP DATABASE <name>")?,
            }),
            _ => Err("Expected DATABASE after DROP".to_string()),
        },
        "DESCRIBE" => match tokens.get(1).map(|t| t.to_uppercase()).as_deref() {
            Some("TABLE") => Ok(Command::DescribeTable {
                name: single_name(&tokens, "DESCRIBE TABLE <name>")?,
            }),
            _ => Err("Expected TABLE after DESCRIBE".to_string()),
        },
        "USE" => match tokens.len() {
            2 => Ok(Command::Use {
                database: identifier(&tokens[1]),
            }),
            _ => Err("Usage: USE <database>".to_string()),
        },
        "DUMP" => match tokens.len() {
            1 => Ok(Command::Dump),
            _ => Err(format!("Unexpected token '{}' after DUMP", tokens[1])),
        },
        "HELP" => {
            let topic = if tokens.len() > 1 {
                Some(tokens[1..].join(" "))
            } else {
                None
            };
            Ok(Command::Help(topic))
        }
        "EXIT" | "QUIT" => Ok(Command::Exit),
        _ => Err(format!("Unknown command '{}'", tokens[0])),
    }
}

/// `<VERB> <KIND> <name>` with nothing after the name.
fn single_name(tokens: &[String], usage: &str) -> Result<String, String> {
    match tokens.len() {
        3 => Ok(identifier(&tokens[2])),
        n if n < 3 => Err(format!("Usage: {usage}")),
        _ => Err(format!("Unexpected token '{}'", tokens[3])),
    }
}

/// LIST DATABASES | TABLESPACES | NAMESPACES | TABLES | TYPES
fn parse_list(tokens: &[String]) -> Result<Command, String> {
    if tokens.len() != 2 {
        return Err(
            "Usage: LIST DATABASES | TABLESPACES | NAMESPACES | TABLES | TYPES".to_string(),
        );
    }
    let target = match tokens[1].to_uppercase().as_str() {
        "DATABASES" => ListTarget::Databases,
        "TABLESPACES" => ListTarget::Tablespaces,
        "NAMESPACES" => ListTarget::Namespaces,
        "TABLES" => ListTarget::Tables,
        "TYPES" => ListTarget::Types,
        other => return Err(format!("Cannot LIST '{other}'")),
    };
    Ok(Command::List(target))
}

/// CREATE TABLE <name> (<col> <TYPE> [NULL | NOT NULL] [DEFAULT <expr>], ...) [IN <namespace>]
fn parse_create_table(tokens: &[String]) -> Result<Command, String> {
    const USAGE: &str = "Usage: CREATE TABLE <name> (<col> <TYPE> [NULL] [DEFAULT <expr>], ...) [IN <namespace>]";
    if tokens.len() < 4 || tokens[3] != "(" {
        return Err(USAGE.to_string());
    }
    let name = identifier(&tokens[2]);

    let mut columns = Vec::new();
    let mut i = 4;
    loop {
        if i >= tokens.len() {
            return Err("Missing ')' after column list".to_string());
        }
        if tokens[i] == ")" && columns.is_empty() {
            i += 1;
            break;
        }
        let (column, next) = parse_column(tokens, i)?;
        columns.push(column);
        i = next;
        match tokens.get(i).map(String::as_str) {
            Some(",") => i += 1,
            Some(")") => {
                i += 1;
                break;
            }
            Some(other) => return Err(format!("Expected ',' or ')', got '{other}'")),
            None => return Err("Missing ')' after column list".to_string()),
        }
    }

    let namespace = match &tokens[i..] {
        [] => DEFAULT_NAMESPACE.to_string(),
        [kw, ns] if is_keyword(kw, "IN") => identifier(ns),
        [kw, ..] if is_keyword(kw, "IN") => return Err("Expected one namespace after IN".to_string()),
        [other, ..] => return Err(format!("Unexpected token '{other}' after column list")),
    };

    Ok(Command::CreateTable {
        name,
        namespace,
        columns,
    })
}

/// One column definition starting at `tokens[start]`. Returns the column and
/// the index of the first token after it.
fn parse_column(tokens: &[String], start: usize) -> Result<(ColumnDef, usize), String> {
    let name = tokens
        .get(start)
        .filter(|t| !matches!(t.as_str(), "," | ")" | "("))
        .ok_or("Expected column name")?;
    let type_token = tokens
        .get(start + 1)
        .filter(|t| !matches!(t.as_str(), "," | ")" | "("))
        .ok_or_else(|| format!("Missing type for column '{name}'"))?;
    let type_id = TypeId::from_name(type_token)
        .ok_or_else(|| format!("Unknown type '{type_token}' for column '{name}'"))?;

    let mut column = ColumnDef::new(identifier(name), type_id);
    let mut i = start + 2;
    while let Some(token) = tokens.get(i) {
        if is_keyword(token, "NULL") {
            column = column.nullable();
            i += 1;
        } else if is_keyword(token, "NOT") {
            match tokens.get(i + 1) {
                Some(next) if is_keyword(next, "NULL") => i += 2,
                _ => return Err("Expected NULL after NOT".to_string()),
            }
        } else if is_keyword(token, "DEFAULT") {
            let expr = tokens
                .get(i + 1)
                .filter(|t| !matches!(t.as_str(), "," | ")" | "("))
                .ok_or_else(|| format!("Missing expression after DEFAULT for '{name}'"))?;
            column = column.default_expr(expr.clone());
            i += 2;
        } else {
            break;
        }
    }
    Ok((column, i))
}
