//! Real `mysql` crate connection.

use super::{ConnectionSpec, Driver, Protocol, QueryRow};
use crate::error::DumpError;
use mysql::prelude::Queryable;
use mysql::{Conn, OptsBuilder, Value};

pub struct MySqlDriver {
    conn: Conn,
}

impl MySqlDriver {
    pub fn connect(spec: &ConnectionSpec) -> Result<Self, DumpError> {
        if spec.protocol != Protocol::Tcp {
            // Socket/pipe/memory protocols are accepted on the CLI surface but
            // the bundled client library only speaks TCP in this build.
            return Err(DumpError::ConnectError(format!(
                "protocol {:?} is not supported by this build",
                spec.protocol
            )));
        }

        let opts = OptsBuilder::new()
            .ip_or_hostname(Some(spec.host.as_str()))
            .tcp_port(spec.port)
            .user(Some(spec.user.as_str()))
            .pass(spec.password.as_deref())
            .db_name(Some(spec.database.as_str()));

        let conn = Conn::new(opts)
            .map_err(|e| DumpError::ConnectError(e.to_string()))?;
        Ok(Self { conn })
    }

    fn row_to_query_row(columns: &[String], row: mysql::Row) -> QueryRow {
        let values = (0..columns.len())
            .map(|i| match row.as_ref(i) {
                Some(Value::NULL) | None => None,
                Some(v) => Some(mysql::from_value::<String>(v.clone())),
            })
            .collect();
        QueryRow { columns: columns.to_vec(), values }
    }
}

impl Driver for MySqlDriver {
    fn query(&mut self, sql: &str, args: &[String]) -> Result<Vec<QueryRow>, DumpError> {
        let params: Vec<Value> = args.iter().map(|a| Value::from(a.as_str())).collect();
        let result = self
            .conn
            .exec_iter(sql, mysql::Params::Positional(params))
            .map_err(|e| DumpError::QueryError { sql: sql.to_string(), cause: e.to_string() })?;

        let columns: Vec<String> = result
            .columns()
            .map(|cols| cols.iter().map(|c| c.name_str().to_string()).collect())
            .unwrap_or_default();

        let mut out = Vec::new();
        for row in result {
            let row = row.map_err(|e| DumpError::QueryError { sql: sql.to_string(), cause: e.to_string() })?;
            out.push(Self::row_to_query_row(&columns, row));
        }
        Ok(out)
    }

    fn exec(&mut self, sql: &str) -> Result<(), DumpError> {
        self.conn
            .query_drop(sql)
            .map_err(|e| DumpError::QueryError { sql: sql.to_string(), cause: e.to_string() })
    }

    fn select_rows(&mut self, sql: &str) -> Result<Vec<QueryRow>, DumpError> {
        let result = self
            .conn
            .query_iter(sql)
            .map_err(|e| DumpError::QueryError { sql: sql.to_string(), cause: e.to_string() })?;

        let columns: Vec<String> = result
            .columns()
            .map(|cols| cols.iter().map(|c| c.name_str().to_string()).collect())
            .unwrap_or_default();

        let mut out = Vec::new();
        for row in result {
            let row = row.map_err(|e| DumpError::QueryError { sql: sql.to_string(), cause: e.to_string() })?;
            out.push(Self::row_to_query_row(&columns, row));
        }
        Ok(out)
    }

    fn variable(&mut self, name: &str) -> Result<String, DumpError> {
        let sql = format!("SELECT @@{name}");
        let value: Option<String> = self
            .conn
            .query_first(&sql)
            .map_err(|e| DumpError::QueryError { sql, cause: e.to_string() })?;
        value.ok_or_else(|| DumpError::IntrospectionError {
            catalog: "@@".to_string(),
            object: name.to_string(),
        })
    }

    fn close(&mut self) -> Result<(), DumpError> {
        Ok(())
    }
}
