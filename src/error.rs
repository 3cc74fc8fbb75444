//! Tagged error type for the sampler's failure modes.
//!
//! Mirrors the ADBC-style manual `Display`/`Error` implementation rather than
//! pulling in `thiserror`: one enum, one match arm per kind, bridged into
//! `anyhow::Result` at call boundaries.

use std::fmt;

#[derive(Debug)]
pub enum DumpError {
    ConnectError(String),
    IntrospectionError { catalog: String, object: String },
    CircularDependency { nodes: Vec<String> },
    LockError { table: String, cause: String },
    QueryError { sql: String, cause: String },
    FilterError { filter: String, table: String, column: String, reason: String },
    ConstraintSpec { raw: String },
    InvalidUserLiteral { raw: String },
    UnknownFilter { name: String },
    UnknownDriver { name: String },
    UnsupportedServerVersion { version: String },
}

impl fmt::Display for DumpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DumpError::ConnectError(msg) => write!(f, "failed to connect: {msg}"),
            DumpError::IntrospectionError { catalog, object } => {
                write!(f, "introspection of {catalog} failed for {object}")
            }
            DumpError::CircularDependency { nodes } => {
                write!(
                    f,
                    "Circular dependency found -> {}",
                    nodes
                        .iter()
                        .map(|n| format!("`{n}`"))
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
            DumpError::LockError { table, cause } => {
                write!(f, "failed to lock table `{table}`: {cause}")
            }
            DumpError::QueryError { sql, cause } => {
                write!(f, "query failed: {cause} ({sql})")
            }
            DumpError::FilterError { filter, table, column, reason } => {
                write!(
                    f,
                    "filter \"{filter}\" on {table}.{column} failed: {reason}"
                )
            }
            DumpError::ConstraintSpec { raw } => {
                write!(f, "invalid --constraint \"{raw}\", expected \"table.column table.column\"")
            }
            DumpError::InvalidUserLiteral { raw } => {
                write!(f, "invalid user literal \"{raw}\", expected \"user@host\"")
            }
            DumpError::UnknownFilter { name } => write!(f, "unknown filter \"{name}\""),
            DumpError::UnknownDriver { name } => write!(f, "unknown driver \"{name}\""),
            DumpError::UnsupportedServerVersion { version } => {
                write!(f, "unsupported server version \"{version}\" (only MySQL 5.x is supported)")
            }
        }
    }
}

impl std::error::Error for DumpError {}

impl From<mysql::Error> for DumpError {
    fn from(e: mysql::Error) -> Self {
        DumpError::QueryError { sql: String::new(), cause: e.to_string() }
    }
}
