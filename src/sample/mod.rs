//! The dependency-aware sampling engine.
//!
//! Walks tables in the order produced by [`crate::resolver::resolve`],
//! building `WHERE ... IN (...)` predicates from the key values observed in
//! already-sampled parents, bracketing each table visit with a read lock.
//!
//! Core walk-and-propagate shape grounded on the original
//! `resolveTableConditions`; lock bracketing and SQL assembly grounded on
//! `setTableGraphRows`/`lockTableRead`/`unlockTables`/`buildSelectRowsSQL`/
//! `buildWhereIn`.

use crate::codec::{backtick, join_values, quote};
use crate::driver::Driver;
use crate::error::DumpError;
use crate::filter::FilterController;
use crate::resolver::TableOrder;
use crate::schema::{Field, Row, Schema};
use ahash::{AHashMap, AHashSet};

#[derive(Debug, Clone)]
pub struct SampleConfig {
    /// Per-table row cap; `0` means unlimited.
    pub limit: u64,
    pub skip_lock_tables: bool,
    /// Whether a parent column whose every sampled value is NULL should be
    /// treated the same as an empty parent result set (dependents skipped).
    pub null_parents_skip_children: bool,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self { limit: 100, skip_lock_tables: false, null_parents_skip_children: true }
    }
}

#[derive(Debug, Default)]
pub struct SampleStats {
    pub tables: Vec<TableSampleStats>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TableSampleStats {
    pub table: String,
    pub rows_sampled: usize,
    pub skipped: bool,
}

/// RAII guard bracketing one table visit with `LOCK TABLES ... READ LOCAL`
/// / `UNLOCK TABLES`. Releases the lock on every exit path, including an
/// error unwind, mirroring the original's `defer func() { unlockTables() }`.
struct TableLock<'a> {
    driver: &'a mut dyn Driver,
    active: bool,
}

impl<'a> TableLock<'a> {
    fn acquire(driver: &'a mut dyn Driver, table: &str, enabled: bool) -> Result<Self, DumpError> {
        if enabled {
            let sql = format!("LOCK TABLES {} READ LOCAL", backtick(table));
            driver.exec(&sql).map_err(|_| DumpError::LockError {
                table: table.to_string(),
                cause: "LOCK TABLES failed".to_string(),
            })?;
        }
        Ok(Self { driver, active: enabled })
    }
}

impl Drop for TableLock<'_> {
    fn drop(&mut self) {
        if self.active {
            let _ = self.driver.exec("UNLOCK TABLES");
        }
    }
}

pub fn sample(
    driver: &mut dyn Driver,
    schema: &mut Schema,
    order: &TableOrder,
    config: &SampleConfig,
    filters: &FilterController,
) -> Result<SampleStats, DumpError> {
    let lock_enabled = !config.skip_lock_tables;
    let mut collected_keys: AHashMap<usize, AHashMap<String, AHashSet<String>>> = AHashMap::new();
    let mut skipped: AHashSet<usize> = AHashSet::new();
    let mut stats = SampleStats::default();

    for &idx in &order.order {
        let table_name = schema.tables[idx].name.clone();

        if skipped.contains(&idx) {
            stats.tables.push(TableSampleStats { table: table_name, rows_sampled: 0, skipped: true });
            continue;
        }
        if let Some(&parent_idx) = order.parents[idx].iter().find(|p| skipped.contains(p)) {
            skipped.insert(idx);
            let parent_name = &schema.tables[parent_idx].name;
            stats.warnings.push(format!("Skipping {table_name}, references empty table {parent_name}"));
            stats.tables.push(TableSampleStats { table: table_name, rows_sampled: 0, skipped: true });
            continue;
        }

        let conditions = collected_keys.get(&idx).cloned().unwrap_or_default();
        let sql = build_select_sql(&table_name, &conditions, config.limit);

        let rows = {
            let _lock = TableLock::acquire(driver, &table_name, lock_enabled)?;
            let query_rows = driver.select_rows(&sql)?;
            rows_from_query(&query_rows, filters, &table_name, &schema.tables[idx])
        };

        propagate_keys(&schema.tables[idx], &rows, schema, &mut collected_keys, &mut skipped, config, &mut stats.warnings);

        stats.tables.push(TableSampleStats {
            table: table_name.clone(),
            rows_sampled: rows.len(),
            skipped: false,
        });
        schema.tables[idx].rows = rows;
    }

    Ok(stats)
}

fn build_select_sql(table: &str, conditions: &AHashMap<String, AHashSet<String>>, limit: u64) -> String {
    let mut predicates: Vec<String> = conditions
        .iter()
        .map(|(col, values)| {
            let quoted: Vec<String> = values.iter().map(|v| quote(v)).collect();
            format!("{} IN ({})", backtick(col), join_values(quoted))
        })
        .collect();
    predicates.sort();

    let mut sql = format!("SELECT * FROM {}", backtick(table));
    if !predicates.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&predicates.join(" AND "));
    }
    if limit != 0 {
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    sql
}

fn rows_from_query(
    query_rows: &[crate::driver::QueryRow],
    filters: &FilterController,
    table_name: &str,
    table: &crate::schema::Table,
) -> Vec<Row> {
    query_rows
        .iter()
        .map(|qr| {
            let fields = qr
                .columns
                .iter()
                .zip(qr.values.iter())
                .map(|(col, val)| {
                    let mut value = val.clone();
                    if let Some(v) = value.as_mut() {
                        let (data_type, max_length) = table
                            .get_column(col)
                            .map(|c| (c.data_type.to_string(), v.len() as i64))
                            .unwrap_or_default();
                        filters.apply(v, table_name, col, &data_type, max_length);
                    }
                    Field { column: col.clone(), value }
                })
                .collect();
            Row { fields }
        })
        .collect()
}

/// For every constraint this table bears (it is the parent), collect the
/// non-NULL values of the referenced column from `rows` into the child's
/// pending IN-list. If the child's set stays empty — either because `rows`
/// itself is empty, or every observed value was NULL and
/// `null_parents_skip_children` is set — the child is marked skipped and a
/// warning naming both tables is recorded.
fn propagate_keys(
    table: &crate::schema::Table,
    rows: &[Row],
    schema: &Schema,
    collected_keys: &mut AHashMap<usize, AHashMap<String, AHashSet<String>>>,
    skipped: &mut AHashSet<usize>,
    config: &SampleConfig,
    warnings: &mut Vec<String>,
) {
    for edge in &table.incoming_edges {
        let Some(child_idx) = schema.table_index(&edge.referencing_table) else {
            continue;
        };

        let values: AHashSet<String> = rows
            .iter()
            .filter_map(|r| r.get(&edge.referenced_column))
            .filter_map(|f| f.value.clone())
            .collect();

        if values.is_empty() && config.null_parents_skip_children {
            skipped.insert(child_idx);
            let child_name = &schema.tables[child_idx].name;
            warnings.push(format!("Skipping {child_name}, references empty table {}", table.name));
            continue;
        }

        collected_keys
            .entry(child_idx)
            .or_default()
            .entry(edge.referencing_column.clone())
            .or_default()
            .extend(values);
    }
}
