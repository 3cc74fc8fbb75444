//! Data model for an introspected database and the live introspection that
//! populates it.

pub mod introspect;

use ahash::AHashMap;
use std::fmt;

/// A column's declared SQL type classification, used only to decide literal
/// formatting (integer types are emitted bare).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    Integer,
    Other(String),
}

impl DataType {
    pub fn from_information_schema(data_type: &str) -> Self {
        let lower = data_type.to_lowercase();
        if lower.contains("int") {
            DataType::Integer
        } else {
            DataType::Other(data_type.to_string())
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, DataType::Integer)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Integer => write!(f, "int"),
            DataType::Other(s) => write!(f, "{s}"),
        }
    }
}

/// One column in a table, in ordinal position.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub ordinal: usize,
    pub declared_type: String,
    pub data_type: DataType,
}

/// A foreign-key edge, borne by the *parent* table describing one of its
/// children. `referenced_column` lives on the parent; `referencing_table`/
/// `referencing_column` name the child.
#[derive(Debug, Clone)]
pub struct Constraint {
    pub referenced_column: String,
    pub referencing_table: String,
    pub referencing_column: String,
}

/// A single cell: the owning column name plus its textual value (`None` is
/// SQL `NULL`, distinguished from an empty string).
#[derive(Debug, Clone)]
pub struct Field {
    pub column: String,
    pub value: Option<String>,
}

/// One sampled row, in column order.
#[derive(Debug, Clone, Default)]
pub struct Row {
    pub fields: Vec<Field>,
}

impl Row {
    pub fn get(&self, column: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.column.eq_ignore_ascii_case(column))
    }
}

#[derive(Debug, Clone)]
pub struct Trigger {
    pub name: String,
    pub table: String,
    pub definer: String,
    pub sql_mode: String,
    pub create_ddl: String,
}

#[derive(Debug, Clone)]
pub struct Routine {
    pub name: String,
    pub kind: RoutineKind,
    pub definer: String,
    pub is_deterministic: bool,
    pub returns: Option<String>,
    pub param_list: String,
    pub create_ddl: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutineKind {
    Procedure,
    Function,
}

#[derive(Debug, Clone)]
pub struct View {
    pub name: String,
    pub definer: String,
    pub create_ddl: String,
}

/// A base table: structure plus the rows the sampling engine attaches.
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub charset: String,
    pub collation: String,
    pub create_ddl: String,
    pub columns: Vec<Column>,
    pub incoming_edges: Vec<Constraint>,
    pub triggers: Vec<Trigger>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// The full introspected database: tables plus their associated views,
/// routines, and database-level metadata.
#[derive(Debug, Clone)]
pub struct Schema {
    pub database: String,
    pub charset: String,
    pub collation: String,
    /// Raw `SHOW CREATE DATABASE` text, as returned by the server.
    pub create_ddl: String,
    pub tables: Vec<Table>,
    pub views: Vec<View>,
    pub routines: Vec<Routine>,
}

impl Schema {
    pub fn table_index(&self, name: &str) -> Option<usize> {
        self.tables.iter().position(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.table_index(name).map(|i| &self.tables[i])
    }

    pub fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.table_index(name).map(|i| &mut self.tables[i])
    }

    /// Table-name → index lookup map, built once for repeated use by the
    /// resolver and sampling engine.
    pub fn index_map(&self) -> AHashMap<String, usize> {
        self.tables
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name.to_lowercase(), i))
            .collect()
    }
}
