//! Connection abstraction over the live database.
//!
//! The sampling engine and introspector talk to a `Driver` trait object
//! rather than directly to `mysql::Conn`, so both can run against an
//! in-memory [`FakeDriver`] in tests with no live server required. Real
//! connections go through [`MySqlDriver`], grounded on the `mysql` crate
//! usage shown in the tpch-mysql CLI example (`OptsBuilder`, `Conn::new`,
//! `query_iter`, `query_drop`).

mod fake;
mod live;

pub use fake::FakeDriver;
pub use live::MySqlDriver;

use crate::error::DumpError;

/// Protocol used to reach the server, mirroring `--protocol`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Tcp,
    Socket,
    Pipe,
    Memory,
}

impl Protocol {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "tcp" => Some(Protocol::Tcp),
            "socket" => Some(Protocol::Socket),
            "pipe" => Some(Protocol::Pipe),
            "memory" => Some(Protocol::Memory),
            _ => None,
        }
    }
}

/// Everything needed to open a session.
#[derive(Debug, Clone)]
pub struct ConnectionSpec {
    pub host: String,
    pub port: u16,
    pub protocol: Protocol,
    pub user: String,
    pub password: Option<String>,
    pub database: String,
}

/// A single database field as returned by the wire protocol: `None` means
/// SQL `NULL`, distinguished from an empty string.
pub type FieldValue = Option<String>;

/// One row, in column order, alongside the column names returned by the
/// server for that result set.
#[derive(Debug, Clone, Default)]
pub struct QueryRow {
    pub columns: Vec<String>,
    pub values: Vec<FieldValue>,
}

impl QueryRow {
    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
            .map(|i| &self.values[i])
    }
}

/// Parsed `major.minor.rev` server version string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
    pub rev: u32,
}

impl ServerVersion {
    pub fn parse(raw: &str) -> Option<Self> {
        let core = raw.split(['-', ' ']).next().unwrap_or(raw);
        let mut parts = core.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next().unwrap_or("0").parse().ok()?;
        let rev = parts.next().unwrap_or("0").parse().ok()?;
        Some(ServerVersion { major, minor, rev })
    }
}

/// Connection + query surface consumed by the introspector and the
/// sampling engine. Implemented once for real traffic ([`MySqlDriver`]) and
/// once for tests ([`FakeDriver`]).
pub trait Driver {
    /// Runs a parameterized catalog lookup; `args` are bound through the
    /// underlying driver's real parameter substitution, never interpolated
    /// into the SQL text.
    fn query(&mut self, sql: &str, args: &[String]) -> Result<Vec<QueryRow>, DumpError>;

    /// Runs a fully-assembled statement with no result set.
    fn exec(&mut self, sql: &str) -> Result<(), DumpError>;

    /// Runs a fully-assembled `SELECT` and materializes every row.
    fn select_rows(&mut self, sql: &str) -> Result<Vec<QueryRow>, DumpError>;

    /// Reads a server variable, e.g. `version`.
    fn variable(&mut self, name: &str) -> Result<String, DumpError>;

    fn close(&mut self) -> Result<(), DumpError>;
}

pub fn open(spec: &ConnectionSpec) -> Result<Box<dyn Driver>, DumpError> {
    let driver = MySqlDriver::connect(spec)?;
    Ok(Box::new(driver))
}
