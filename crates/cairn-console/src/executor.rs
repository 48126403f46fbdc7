use std::collections::HashMap;

use cairn_core::catalog::{Catalog, CatalogDump, ColumnDef};
use cairn_core::error::{CatalogError, Error};
use cairn_core::txn::Transaction;
use cairn_core::types::{DEFAULT_DATABASE_OID, DbOid};
use thiserror::Error as ThisError;

use crate::commands::{Command, ListTarget};

#[derive(Debug, ThisError)]
pub enum ExecError {
    #[error(transparent)]
    Catalog(#[from] Error),

    #[error("cannot drop database '{0}' while it is in use")]
    DatabaseInUse(String),

    #[error("cannot drop the default database '{0}'")]
    DefaultDatabase(String),
}

impl From<CatalogError> for ExecError {
    fn from(e: CatalogError) -> Self {
        ExecError::Catalog(e.into())
    }
}

/// Console session: the catalog plus the database commands run against.
pub struct Session {
    catalog: Catalog,
    database: DbOid,
    database_name: String,
}

impl Session {
    /// Start a session on the catalog's default database.
    pub fn new(catalog: Catalog) -> Self {
        let database_name = catalog.config().default_database_name.clone();
        Self {
            catalog,
            database: DEFAULT_DATABASE_OID,
            database_name,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn database(&self) -> DbOid {
        self.database
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }
}

/// One row of a `LIST` result.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRow {
    pub oid: u32,
    pub name: String,
    /// Kind-specific extra column: a table's namespace, a type's length.
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRow {
    pub num: i32,
    pub name: String,
    pub type_name: &'static str,
    pub nullable: bool,
    pub default: Option<String>,
}

/// Result of `DESCRIBE TABLE`.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDescription {
    pub oid: u32,
    pub name: String,
    pub namespace: Option<String>,
    pub columns: Vec<ColumnRow>,
}

/// Structured result from executing a command.
#[derive(Debug)]
pub enum CommandResult {
    /// DDL succeeded.
    Ok(String),
    /// Rows of a `LIST` command.
    Objects {
        target: ListTarget,
        rows: Vec<ObjectRow>,
    },
    Table(TableDescription),
    Dump(CatalogDump),
    /// Active database changed.
    Use(String),
    /// Help text (optional topic for per-command help).
    Help(Option<String>),
    /// Exit signal.
    Exit,
}

/// Execute a parsed command. Each command runs in a transaction of its own.
pub fn execute(session: &mut Session, cmd: Command) -> Result<CommandResult, ExecError> {
    match cmd {
        Command::List(target) => exec_list(session, target),
        Command::CreateDatabase { name } => exec_create_database(session, &name),
        Command::DropDatabase { name } => exec_drop_database(session, &name),
        Command::Use { database } => exec_use(session, database),
        Command::CreateTable {
            name,
            namespace,
            columns,
        } => exec_create_table(session, &name, &namespace, &columns),
        Command::DescribeTable { name } => exec_describe_table(session, &name),
        Command::Dump => {
            let catalog = &session.catalog;
            let dump = catalog.txn_manager().transact(|txn| catalog.dump(txn))?;
            Ok(CommandResult::Dump(dump))
        }
        Command::Help(topic) => Ok(CommandResult::Help(topic)),
        Command::Exit => Ok(CommandResult::Exit),
    }
}

fn exec_list(session: &Session, target: ListTarget) -> Result<CommandResult, ExecError> {
    let catalog = &session.catalog;
    let db = session.database;
    let rows = catalog.txn_manager().transact(|txn| match target {
        ListTarget::Databases => Ok(catalog
            .database_handle()
            .list(txn)?
            .iter()
            .map(|d| ObjectRow {
                oid: d.oid().raw(),
                name: d.name().to_string(),
                detail: None,
            })
            .collect()),
        ListTarget::Tablespaces => Ok(catalog
            .tablespace_handle()
            .list(txn)?
            .iter()
            .map(|t| ObjectRow {
                oid: t.oid().raw(),
                name: t.name().to_string(),
                detail: None,
            })
            .collect()),
        ListTarget::Namespaces => Ok(catalog
            .namespace_handle(txn, db)?
            .list(txn)?
            .iter()
            .map(|n| ObjectRow {
                oid: n.oid().raw(),
                name: n.name().to_string(),
                detail: None,
            })
            .collect()),
        ListTarget::Tables => list_tables(catalog, txn, db),
        ListTarget::Types => Ok(catalog
            .type_handle(txn, db)?
            .list(txn)?
            .iter()
            .map(|t| ObjectRow {
                oid: t.oid().raw(),
                name: t.name().to_string(),
                detail: Some(format!("len {}", t.len())),
            })
            .collect()),
    })?;
    Ok(CommandResult::Objects { target, rows })
}

/// Relations recorded in `pg_class`, each with its namespace name.
fn list_tables(catalog: &Catalog, txn: &Transaction, db: DbOid) -> Result<Vec<ObjectRow>, Error> {
    let namespaces: HashMap<_, _> = catalog
        .namespace_handle(txn, db)?
        .list(txn)?
        .iter()
        .map(|n| (n.oid(), n.name().to_string()))
        .collect();
    Ok(catalog
        .class_handle(txn, db)?
        .list(txn)?
        .iter()
        .map(|c| ObjectRow {
            oid: c.oid().raw(),
            name: c.name().to_string(),
            detail: namespaces.get(&c.namespace_oid()).cloned(),
        })
        .collect())
}

fn exec_create_database(session: &Session, name: &str) -> Result<CommandResult, ExecError> {
    let catalog = &session.catalog;
    let oid = catalog.txn_manager().transact(|txn| {
        let oid = catalog.create_database(txn, name)?;
        catalog.bootstrap_database(txn, oid)?;
        Ok(oid)
    })?;
    Ok(CommandResult::Ok(format!("Database '{name}' created (oid {oid}).")))
}

fn exec_drop_database(session: &Session, name: &str) -> Result<CommandResult, ExecError> {
    let catalog = &session.catalog;
    if name == catalog.config().default_database_name {
        return Err(ExecError::DefaultDatabase(name.to_string()));
    }
    if name == session.database_name {
        return Err(ExecError::DatabaseInUse(name.to_string()));
    }

    let oid = catalog
        .txn_manager()
        .transact(|txn| Ok(catalog.database_handle().name_to_oid(txn, name)?))?
        .ok_or_else(|| CatalogError::DatabaseNotFound(name.to_string()))?;
    let reclaimed = catalog.destroy_database_objects(oid)?;
    catalog
        .txn_manager()
        .transact(|txn| catalog.delete_database(txn, name))?;
    Ok(CommandResult::Ok(format!(
        "Database '{name}' dropped ({reclaimed} relation(s) reclaimed)."
    )))
}

fn exec_use(session: &mut Session, database: String) -> Result<CommandResult, ExecError> {
    let catalog = &session.catalog;
    let oid = catalog.txn_manager().transact(|txn| {
        let oid = catalog
            .database_handle()
            .name_to_oid(txn, &database)?
            .ok_or_else(|| CatalogError::DatabaseNotFound(database.clone()))?;
        if !catalog.directory().has_database(txn, oid) {
            return Err(CatalogError::DatabaseNotRegistered(oid).into());
        }
        Ok(oid)
    })?;
    session.database = oid;
    session.database_name = database.clone();
    Ok(CommandResult::Use(database))
}

fn exec_create_table(
    session: &Session,
    name: &str,
    namespace: &str,
    columns: &[ColumnDef],
) -> Result<CommandResult, ExecError> {
    let catalog = &session.catalog;
    let oid = catalog
        .txn_manager()
        .transact(|txn| catalog.create_table(txn, session.database, namespace, name, columns))?;
    Ok(CommandResult::Ok(format!(
        "Table '{namespace}.{name}' created (oid {oid})."
    )))
}

fn exec_describe_table(session: &Session, name: &str) -> Result<CommandResult, ExecError> {
    let catalog = &session.catalog;
    let db = session.database;
    let description = catalog.txn_manager().transact(|txn| {
        let table = catalog
            .table(txn, db, name)?
            .ok_or_else(|| CatalogError::TableNameNotRegistered {
                db,
                name: name.to_string(),
            })?;

        // Not every system relation has a pg_class row.
        let namespace = match catalog.class_handle(txn, db)?.entry(txn, table.oid())? {
            Some(class) => catalog
                .namespace_handle(txn, db)?
                .entry(txn, class.namespace_oid())?
                .map(|n| n.name().to_string()),
            None => None,
        };

        let attrdefs = catalog.attrdef_handle(txn, db)?;
        let mut columns = Vec::with_capacity(table.columns().len());
        for (pos, column) in table.columns().iter().enumerate() {
            let num = pos as i32 + 1;
            let default = attrdefs
                .entry_for_column(txn, table.oid(), num)?
                .map(|d| d.src().unwrap_or(d.bin()).to_string());
            columns.push(ColumnRow {
                num,
                name: column.name.clone(),
                type_name: column.type_id.name(),
                nullable: column.nullable,
                default,
            });
        }

        Ok(TableDescription {
            oid: table.oid().raw(),
            name: table.name().to_string(),
            namespace,
            columns,
        })
    })?;
    Ok(CommandResult::Table(description))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use cairn_core::txn::TransactionManager;

    use crate::parser;

    fn session() -> Session {
        Session::new(Catalog::new(Arc::new(TransactionManager::new())).unwrap())
    }

    fn run(session: &mut Session, line: &str) -> Result<CommandResult, ExecError> {
        execute(session, parser::parse(line).unwrap())
    }

    fn names(result: CommandResult) -> Vec<String> {
        match result {
            CommandResult::Objects { rows, .. } => rows.into_iter().map(|r| r.name).collect(),
            _ => panic!("expected an object listing"),
        }
    }

    #[test]
    fn test_list_seeded_objects() {
        let mut s = session();
        assert_eq!(names(run(&mut s, "LIST DATABASES").unwrap()), vec!["terrier"]);
        assert_eq!(
            names(run(&mut s, "LIST TABLESPACES").unwrap()),
            vec!["pg_global", "pg_default"]
        );
        assert_eq!(
            names(run(&mut s, "LIST NAMESPACES").unwrap()),
            vec!["pg_catalog", "public"]
        );
        assert_eq!(names(run(&mut s, "LIST TYPES").unwrap()).len(), 9);
    }

    #[test]
    fn test_list_tables_reports_namespace() {
        let mut s = session();
        run(&mut s, "CREATE TABLE items (id integer)").unwrap();
        let CommandResult::Objects { rows, .. } = run(&mut s, "LIST TABLES").unwrap() else {
            panic!("expected an object listing");
        };
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].detail.as_deref(), Some("pg_catalog"));
        let items = rows.iter().find(|r| r.name == "items").unwrap();
        assert_eq!(items.detail.as_deref(), Some("public"));
    }

    #[test]
    fn test_create_use_drop_database() {
        let mut s = session();
        run(&mut s, "CREATE DATABASE app").unwrap();
        run(&mut s, "USE app").unwrap();
        assert_eq!(s.database_name(), "app");
        assert_ne!(s.database(), DEFAULT_DATABASE_OID);
        run(&mut s, "CREATE TABLE t (x integer)").unwrap();

        let err = run(&mut s, "DROP DATABASE app").unwrap_err();
        assert!(matches!(err, ExecError::DatabaseInUse(_)));

        run(&mut s, "USE terrier").unwrap();
        let CommandResult::Ok(msg) = run(&mut s, "DROP DATABASE app").unwrap() else {
            panic!("expected Ok");
        };
        assert!(msg.contains("1 relation(s)"));
        assert_eq!(names(run(&mut s, "LIST DATABASES").unwrap()), vec!["terrier"]);
        assert!(run(&mut s, "USE app").is_err());
    }

    #[test]
    fn test_drop_default_database_refused() {
        let mut s = session();
        let err = run(&mut s, "DROP DATABASE terrier").unwrap_err();
        assert!(matches!(err, ExecError::DefaultDatabase(_)));
    }

    #[test]
    fn test_drop_missing_database() {
        let mut s = session();
        let err = run(&mut s, "DROP DATABASE ghost").unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_describe_user_table() {
        let mut s = session();
        run(
            &mut s,
            "CREATE TABLE accounts (id integer, owner varchar NULL, active boolean DEFAULT true)",
        )
        .unwrap();
        let CommandResult::Table(desc) = run(&mut s, "DESCRIBE TABLE accounts").unwrap() else {
            panic!("expected a table description");
        };
        assert_eq!(desc.namespace.as_deref(), Some("public"));
        assert_eq!(desc.columns.len(), 3);
        assert_eq!(desc.columns[1].type_name, "varchar");
        assert!(desc.columns[1].nullable);
        assert_eq!(desc.columns[2].default.as_deref(), Some("true"));
    }

    #[test]
    fn test_describe_system_relation() {
        let mut s = session();
        let CommandResult::Table(desc) = run(&mut s, "DESCRIBE TABLE pg_attribute").unwrap() else {
            panic!("expected a table description");
        };
        assert!(desc.namespace.is_none());
        assert_eq!(desc.columns[2].name, "attname");

        assert!(run(&mut s, "DESCRIBE TABLE nope").is_err());
    }

    #[test]
    fn test_dump() {
        let mut s = session();
        let CommandResult::Dump(dump) = run(&mut s, "DUMP").unwrap() else {
            panic!("expected a dump");
        };
        assert_eq!(dump.databases.len(), 1);
    }
}
