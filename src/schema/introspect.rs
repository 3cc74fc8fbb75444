//! Live `INFORMATION_SCHEMA` introspection.
//!
//! Query shapes are grounded directly on the original `MySQL5Database`
//! methods (`Tables`, `Views`, `Routines`, `setTableDependencies`,
//! `tableColumns`, `setTableCreateSQL`, `setViewCreateSQL`,
//! `setRoutineCreateSQL`, `setTableTriggers`/`setTriggerCreateSQL`), adapted
//! to a trait-object `Driver` and to this crate's parent-owns-the-edge
//! constraint model.

use super::{Column, Constraint, DataType, Routine, RoutineKind, Schema, Table, Trigger, View};
use crate::codec::{backtick, backtick_user};
use crate::driver::Driver;
use crate::error::DumpError;
use once_cell::sync::Lazy;
use regex::Regex;

static AUTO_INCREMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"AUTO_INCREMENT=\d+ ").expect("valid regex"));

pub struct IntrospectOptions {
    pub routines: bool,
    pub triggers: bool,
}

pub fn introspect(
    driver: &mut dyn Driver,
    database: &str,
    opts: &IntrospectOptions,
) -> Result<Schema, DumpError> {
    let (charset, collation) = database_charset(driver, database)?;
    let create_ddl = database_create_ddl(driver, database)?;

    let mut tables = base_tables(driver, database)?;
    for table in &mut tables {
        table.incoming_edges = table_dependencies(driver, database, &table.name)?;
        table.create_ddl = table_create_ddl(driver, &table.name)?;
        table.columns = table_columns(driver, database, &table.name)?;
        table.charset = charset.clone();
        if opts.triggers {
            table.triggers = table_triggers(driver, database, &table.name)?;
        }
    }

    let views = views(driver, database, &charset, &collation)?;
    let routines = if opts.routines { routines(driver, database)? } else { Vec::new() };

    Ok(Schema {
        database: database.to_string(),
        charset,
        collation,
        create_ddl,
        tables,
        views,
        routines,
    })
}

/// Grounded on `MySQL5Database::CreateSQL` (`SHOW CREATE DATABASE`).
fn database_create_ddl(driver: &mut dyn Driver, database: &str) -> Result<String, DumpError> {
    let sql = format!("SHOW CREATE DATABASE {}", backtick(database));
    let rows = driver.select_rows(&sql)?;
    let row = rows.first().ok_or_else(|| DumpError::IntrospectionError {
        catalog: "SHOW CREATE DATABASE".to_string(),
        object: database.to_string(),
    })?;
    Ok(row.values.get(1).cloned().flatten().unwrap_or_default())
}

fn database_charset(driver: &mut dyn Driver, database: &str) -> Result<(String, String), DumpError> {
    let sql = "SELECT `DEFAULT_CHARACTER_SET_NAME`, `DEFAULT_COLLATION_NAME` \
               FROM `INFORMATION_SCHEMA`.`SCHEMATA` WHERE `SCHEMA_NAME` = ?";
    let rows = driver.query(sql, &[database.to_string()])?;
    let row = rows.first().ok_or_else(|| DumpError::IntrospectionError {
        catalog: "SCHEMATA".to_string(),
        object: database.to_string(),
    })?;
    let charset = row.values.first().cloned().flatten().unwrap_or_default();
    let collation = row.values.get(1).cloned().flatten().unwrap_or_default();
    Ok((charset, collation))
}

fn base_tables(driver: &mut dyn Driver, database: &str) -> Result<Vec<Table>, DumpError> {
    let sql = "SELECT `TABLE_NAME`, `TABLE_COLLATION` \
               FROM `INFORMATION_SCHEMA`.`TABLES` \
               WHERE `TABLE_SCHEMA` = ? AND `TABLE_TYPE` = 'BASE TABLE'";
    let rows = driver.query(sql, &[database.to_string()])?;
    Ok(rows
        .into_iter()
        .map(|row| Table {
            name: row.values.first().cloned().flatten().unwrap_or_default(),
            charset: String::new(),
            collation: row.values.get(1).cloned().flatten().unwrap_or_default(),
            create_ddl: String::new(),
            columns: Vec::new(),
            incoming_edges: Vec::new(),
            triggers: Vec::new(),
            rows: Vec::new(),
        })
        .collect())
}

/// Foreign keys whose parent is `table`, i.e. children that reference it.
/// `KEY_COLUMN_USAGE` is queried with `REFERENCED_TABLE_SCHEMA`/`TABLE_NAME`
/// fixed to the *child* side, matching the original `setTableDependencies`
/// (confirmed by its WHERE clause: `REFERENCED_TABLE_SCHEMA = ? AND
/// TABLE_NAME = ?` finds rows whose *child* is `table`).
fn table_dependencies(
    driver: &mut dyn Driver,
    database: &str,
    table: &str,
) -> Result<Vec<Constraint>, DumpError> {
    let sql = "SELECT `TABLE_NAME`, `COLUMN_NAME`, `REFERENCED_COLUMN_NAME` \
               FROM `INFORMATION_SCHEMA`.`KEY_COLUMN_USAGE` \
               WHERE `REFERENCED_TABLE_SCHEMA` = ? AND `REFERENCED_TABLE_NAME` = ?";
    let rows = driver.query(sql, &[database.to_string(), table.to_string()])?;
    Ok(rows
        .into_iter()
        .map(|row| Constraint {
            referencing_table: row.values.first().cloned().flatten().unwrap_or_default(),
            referencing_column: row.values.get(1).cloned().flatten().unwrap_or_default(),
            referenced_column: row.values.get(2).cloned().flatten().unwrap_or_default(),
        })
        .collect())
}

fn table_create_ddl(driver: &mut dyn Driver, table: &str) -> Result<String, DumpError> {
    let sql = format!("SHOW CREATE TABLE {}", backtick(table));
    let rows = driver.select_rows(&sql)?;
    let row = rows.first().ok_or_else(|| DumpError::IntrospectionError {
        catalog: "SHOW CREATE TABLE".to_string(),
        object: table.to_string(),
    })?;
    let ddl = row.values.get(1).cloned().flatten().unwrap_or_default();
    Ok(AUTO_INCREMENT.replace_all(&ddl, "").to_string())
}

fn table_columns(driver: &mut dyn Driver, database: &str, table: &str) -> Result<Vec<Column>, DumpError> {
    let sql = "SELECT `COLUMN_NAME`, `ORDINAL_POSITION`, `COLUMN_TYPE`, `DATA_TYPE` \
               FROM `INFORMATION_SCHEMA`.`COLUMNS` \
               WHERE `TABLE_SCHEMA` = ? AND `TABLE_NAME` = ?";
    let rows = driver.query(sql, &[database.to_string(), table.to_string()])?;
    Ok(rows
        .into_iter()
        .map(|row| {
            let declared_type = row.values.get(2).cloned().flatten().unwrap_or_default();
            let data_type = row.values.get(3).cloned().flatten().unwrap_or_default();
            let ordinal: usize = row
                .values
                .get(1)
                .cloned()
                .flatten()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0);
            Column {
                name: row.values.first().cloned().flatten().unwrap_or_default(),
                ordinal,
                data_type: DataType::from_information_schema(&data_type),
                declared_type,
            }
        })
        .collect())
}

fn table_triggers(driver: &mut dyn Driver, database: &str, table: &str) -> Result<Vec<Trigger>, DumpError> {
    let sql = "SELECT `TRIGGER_NAME` FROM `INFORMATION_SCHEMA`.`TRIGGERS` \
               WHERE `TRIGGER_SCHEMA` = ? AND `EVENT_OBJECT_TABLE` = ?";
    let rows = driver.query(sql, &[database.to_string(), table.to_string()])?;
    let mut out = Vec::new();
    for row in rows {
        let name = row.values.first().cloned().flatten().unwrap_or_default();
        out.push(trigger_create_ddl(driver, database, table, &name)?);
    }
    Ok(out)
}

fn trigger_create_ddl(
    driver: &mut dyn Driver,
    database: &str,
    table: &str,
    name: &str,
) -> Result<Trigger, DumpError> {
    let sql = "SELECT `ACTION_STATEMENT`, `DEFINER`, `SQL_MODE` \
               FROM `INFORMATION_SCHEMA`.`TRIGGERS` \
               WHERE `TRIGGER_SCHEMA` = ? AND `TRIGGER_NAME` = ? LIMIT 1";
    let rows = driver.query(sql, &[database.to_string(), name.to_string()])?;
    let row = rows.first().ok_or_else(|| DumpError::IntrospectionError {
        catalog: "TRIGGERS".to_string(),
        object: name.to_string(),
    })?;
    let action = row.values.first().cloned().flatten().unwrap_or_default();
    let definer = row.values.get(1).cloned().flatten().unwrap_or_default();
    let sql_mode = row.values.get(2).cloned().flatten().unwrap_or_default();
    Ok(Trigger {
        name: name.to_string(),
        table: table.to_string(),
        definer: backtick_user(&definer).unwrap_or(definer),
        sql_mode,
        create_ddl: action,
    })
}

fn views(
    driver: &mut dyn Driver,
    database: &str,
    charset: &str,
    collation: &str,
) -> Result<Vec<View>, DumpError> {
    let sql = "SELECT `TABLE_NAME` FROM `INFORMATION_SCHEMA`.`TABLES` \
               WHERE `TABLE_SCHEMA` = ? AND `TABLE_TYPE` = 'VIEW'";
    let rows = driver.query(sql, &[database.to_string()])?;
    let mut out = Vec::new();
    for row in rows {
        let name = row.values.first().cloned().flatten().unwrap_or_default();
        out.push(view_create_ddl(driver, database, &name, charset, collation)?);
    }
    Ok(out)
}

fn view_create_ddl(
    driver: &mut dyn Driver,
    database: &str,
    name: &str,
    _charset: &str,
    _collation: &str,
) -> Result<View, DumpError> {
    let sql = "SELECT `VIEW_DEFINITION`, `DEFINER` FROM `INFORMATION_SCHEMA`.`VIEWS` \
               WHERE `TABLE_SCHEMA` = ? AND `TABLE_NAME` = ? LIMIT 1";
    let rows = driver.query(sql, &[database.to_string(), name.to_string()])?;
    let row = rows.first().ok_or_else(|| DumpError::IntrospectionError {
        catalog: "VIEWS".to_string(),
        object: name.to_string(),
    })?;
    let definition = row.values.first().cloned().flatten().unwrap_or_default();
    let definer = row.values.get(1).cloned().flatten().unwrap_or_default();
    Ok(View {
        name: name.to_string(),
        definer: backtick_user(&definer).unwrap_or(definer),
        create_ddl: format!("VIEW {} AS {}", backtick(name), definition),
    })
}

fn routines(driver: &mut dyn Driver, database: &str) -> Result<Vec<Routine>, DumpError> {
    let sql = "SELECT `name`, `type` FROM `mysql`.`proc` WHERE `db` = ?";
    let rows = driver.query(sql, &[database.to_string()])?;
    let mut out = Vec::new();
    for row in rows {
        let name = row.values.first().cloned().flatten().unwrap_or_default();
        let kind = row.values.get(1).cloned().flatten().unwrap_or_default();
        out.push(routine_create_ddl(driver, database, &name, &kind)?);
    }
    Ok(out)
}

fn routine_create_ddl(
    driver: &mut dyn Driver,
    database: &str,
    name: &str,
    kind: &str,
) -> Result<Routine, DumpError> {
    let sql = "SELECT `body_utf8`, `definer`, `param_list`, `returns`, `is_deterministic`, `sql_mode` \
               FROM `mysql`.`proc` WHERE `name` = ? AND `db` = ? LIMIT 1";
    let rows = driver.query(sql, &[name.to_string(), database.to_string()])?;
    let row = rows.first().ok_or_else(|| DumpError::IntrospectionError {
        catalog: "mysql.proc".to_string(),
        object: name.to_string(),
    })?;
    let body = row.values.first().cloned().flatten().unwrap_or_default();
    let definer = row.values.get(1).cloned().flatten().unwrap_or_default();
    let param_list = row.values.get(2).cloned().flatten().unwrap_or_default();
    let returns = row.values.get(3).cloned().flatten().filter(|s| !s.is_empty());
    let is_deterministic = row
        .values
        .get(4)
        .cloned()
        .flatten()
        .map(|s| s.eq_ignore_ascii_case("yes"))
        .unwrap_or(false);

    Ok(Routine {
        name: name.to_string(),
        kind: if kind.eq_ignore_ascii_case("function") {
            RoutineKind::Function
        } else {
            RoutineKind::Procedure
        },
        definer: backtick_user(&definer).unwrap_or(definer),
        is_deterministic,
        returns,
        param_list,
        create_ddl: body,
    })
}
