use cairn_core::catalog::ColumnDef;

/// Object kinds accepted by `LIST`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListTarget {
    Databases,
    Tablespaces,
    Namespaces,
    Tables,
    Types,
}

impl ListTarget {
    pub fn label(self) -> &'static str {
        match self {
            ListTarget::Databases => "databases",
            ListTarget::Tablespaces => "tablespaces",
            ListTarget::Namespaces => "namespaces",
            ListTarget::Tables => "tables",
            ListTarget::Types => "types",
        }
    }
}

/// A parsed console command.
#[derive(Debug, PartialEq)]
pub enum Command {
    List(ListTarget),
    CreateDatabase {
        name: String,
    },
    DropDatabase {
        name: String,
    },
    Use {
        database: String,
    },
    CreateTable {
        name: String,
        namespace: String,
        columns: Vec<ColumnDef>,
    },
    DescribeTable {
        name: String,
    },
    Dump,
    Help(Option<String>),
    Exit,
}
