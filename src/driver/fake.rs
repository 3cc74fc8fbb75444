//! In-memory driver used by the integration test suite. Holds a fixed
//! catalog and table contents and answers `query`/`select_rows` by matching
//! against a small set of registered SQL patterns, since the real
//! introspector and sampling engine only ever emit a handful of shapes.

use super::{Driver, QueryRow};
use crate::error::DumpError;
use ahash::AHashMap;

#[derive(Debug, Clone, Default)]
pub struct FakeTable {
    pub rows: Vec<QueryRow>,
}

/// A scripted driver: callers register exact-match responses for `query`
/// calls (catalog lookups) and provide full table contents that
/// `select_rows` filters in-process to emulate `WHERE ... IN (...)` and
/// `LIMIT`.
#[derive(Default)]
pub struct FakeDriver {
    pub responses: AHashMap<String, Vec<QueryRow>>,
    pub tables: AHashMap<String, FakeTable>,
    pub variables: AHashMap<String, String>,
    pub exec_log: Vec<String>,
    pub lock_log: Vec<String>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, sql: &str, rows: Vec<QueryRow>) -> Self {
        self.responses.insert(sql.to_string(), rows);
        self
    }

    pub fn with_table(mut self, name: &str, rows: Vec<QueryRow>) -> Self {
        self.tables.insert(name.to_string(), FakeTable { rows });
        self
    }

    pub fn with_variable(mut self, name: &str, value: &str) -> Self {
        self.variables.insert(name.to_string(), value.to_string());
        self
    }
}

impl Driver for FakeDriver {
    fn query(&mut self, sql: &str, _args: &[String]) -> Result<Vec<QueryRow>, DumpError> {
        self.responses.get(sql).cloned().ok_or_else(|| DumpError::IntrospectionError {
            catalog: "fake".to_string(),
            object: sql.to_string(),
        })
    }

    fn exec(&mut self, sql: &str) -> Result<(), DumpError> {
        if sql.starts_with("LOCK TABLES") || sql.starts_with("UNLOCK TABLES") {
            self.lock_log.push(sql.to_string());
        }
        self.exec_log.push(sql.to_string());
        Ok(())
    }

    /// This fake evaluates only the subset of SELECT shapes the sampling
    /// engine generates: `SELECT * FROM `t` [WHERE c IN (v, ...) [AND ...]]
    /// [LIMIT n]`. It is intentionally not a general SQL engine.
    fn select_rows(&mut self, sql: &str) -> Result<Vec<QueryRow>, DumpError> {
        let table_name = extract_table_name(sql).ok_or_else(|| DumpError::QueryError {
            sql: sql.to_string(),
            cause: "fake driver could not parse table name".to_string(),
        })?;
        let table = self.tables.get(&table_name).cloned().unwrap_or_default();

        let mut rows = table.rows;
        if let Some(conditions) = extract_where_ins(sql) {
            rows.retain(|row| {
                conditions.iter().all(|(col, allowed)| {
                    row.get(col)
                        .map(|v| match v {
                            Some(s) => allowed.contains(s),
                            None => false,
                        })
                        .unwrap_or(false)
                })
            });
        }
        if let Some(limit) = extract_limit(sql) {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    fn variable(&mut self, name: &str) -> Result<String, DumpError> {
        self.variables.get(name).cloned().ok_or_else(|| DumpError::IntrospectionError {
            catalog: "@@".to_string(),
            object: name.to_string(),
        })
    }

    fn close(&mut self) -> Result<(), DumpError> {
        Ok(())
    }
}

fn extract_table_name(sql: &str) -> Option<String> {
    let idx = sql.find("FROM `")?;
    let rest = &sql[idx + 6..];
    let end = rest.find('`')?;
    Some(rest[..end].to_string())
}

fn extract_limit(sql: &str) -> Option<usize> {
    let idx = sql.rfind("LIMIT ")?;
    sql[idx + 6..].trim().parse().ok()
}

fn extract_where_ins(sql: &str) -> Option<Vec<(String, Vec<String>)>> {
    let idx = sql.find("WHERE ")?;
    let mut clause = &sql[idx + 6..];
    if let Some(limit_idx) = clause.find(" LIMIT") {
        clause = &clause[..limit_idx];
    }
    let mut out = Vec::new();
    for part in clause.split(" AND ") {
        let part = part.trim();
        if !part.starts_with('`') {
            continue;
        }
        let col_end = part[1..].find('`')?;
        let col = part[1..1 + col_end].to_string();
        let in_start = part.find("IN (")? + 4;
        let in_end = part.rfind(')')?;
        let values: Vec<String> = part[in_start..in_end]
            .split(',')
            .map(|v| v.trim().trim_matches('\'').to_string())
            .collect();
        out.push((col, values));
    }
    Some(out)
}
