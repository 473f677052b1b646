//! MySQL/MariaDB target writer implementation.
//!
//! Implements the `TargetWriter` trait over a single mysql_async connection.
//! One connection is held for the whole run so session settings such as
//! `FOREIGN_KEY_CHECKS` apply to every INSERT.

use async_trait::async_trait;
use chrono::{Datelike, Timelike};
use mysql_async::prelude::*;
use mysql_async::{Conn, Opts, OptsBuilder, Params, Value};
use tracing::{debug, info};

use crate::config::TargetConfig;
use crate::core::identifier::quote_mysql;
use crate::core::schema::{Column, SchemaSet, Table};
use crate::core::traits::TargetWriter;
use crate::error::{MigrateError, Result};
use crate::transcode::TypedValue;

const SIDE: &str = "destination";

const TABLES_QUERY: &str = r#"
    SELECT TABLE_SCHEMA, TABLE_NAME, TABLE_TYPE
    FROM information_schema.TABLES
    WHERE TABLE_SCHEMA = DATABASE() AND TABLE_TYPE = 'BASE TABLE'
"#;

const COLUMNS_QUERY: &str = r#"
    SELECT COLUMN_NAME, DATA_TYPE
    FROM information_schema.COLUMNS
    WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
    ORDER BY ORDINAL_POSITION
"#;

/// MySQL target writer using one mysql_async connection.
pub struct MysqlWriter {
    conn: Conn,
}

impl MysqlWriter {
    /// Connect using a `mysql://` URL.
    pub async fn connect(config: &TargetConfig) -> Result<Self> {
        let opts = build_opts(&config.connection_string)?;
        let host = opts.ip_or_hostname().to_string();
        let port = opts.tcp_port();

        let conn = Conn::new(opts)
            .await
            .map_err(|e| MigrateError::connection(SIDE, e))?;

        info!("Connected to MySQL target: {}:{}", host, port);
        Ok(Self { conn })
    }

    /// Close the connection gracefully.
    pub async fn disconnect(self) -> Result<()> {
        self.conn.disconnect().await?;
        Ok(())
    }

    async fn load_columns(&mut self, table: &mut Table) -> Result<()> {
        let rows: Vec<(String, String)> = self
            .conn
            .exec(COLUMNS_QUERY, (table.schema.as_str(), table.name.as_str()))
            .await
            .map_err(|e| MigrateError::introspection(SIDE, e))?;

        table.columns = rows
            .into_iter()
            .map(|(name, data_type)| Column::new(name, data_type))
            .collect();

        debug!(
            "Loaded {} columns for {}",
            table.columns.len(),
            table.full_name()
        );
        Ok(())
    }
}

#[async_trait]
impl TargetWriter for MysqlWriter {
    async fn extract_schema(&mut self) -> Result<SchemaSet> {
        let rows: Vec<(String, String, String)> = self
            .conn
            .query(TABLES_QUERY)
            .await
            .map_err(|e| MigrateError::introspection(SIDE, e))?;

        let mut tables: Vec<Table> = rows
            .into_iter()
            .map(|(schema, name, kind)| {
                let mut table = Table::new(schema, name);
                table.kind = kind;
                table
            })
            .collect();

        for table in &mut tables {
            self.load_columns(table).await?;
        }

        let set = SchemaSet::new(tables);
        info!("Extracted {} tables from destination", set.len());
        Ok(set)
    }

    async fn set_foreign_key_checks(&mut self, enabled: bool) -> Result<()> {
        let sql = format!("SET SESSION FOREIGN_KEY_CHECKS={}", u8::from(enabled));
        self.conn.query_drop(sql.as_str()).await?;
        debug!("{}", sql);
        Ok(())
    }

    async fn execute(&mut self, sql: &str) -> Result<()> {
        self.conn.query_drop(sql).await?;
        Ok(())
    }

    async fn execute_with_params(&mut self, sql: &str, params: &[TypedValue<'_>]) -> Result<()> {
        let params: Vec<Value> = params.iter().map(typed_value_to_mysql).collect();
        self.conn.exec_drop(sql, Params::Positional(params)).await?;
        Ok(())
    }

    async fn get_row_count(&mut self, table: &Table) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_mysql(&table.name)?);
        let count: Option<i64> = self.conn.query_first(sql).await?;
        Ok(count.unwrap_or(0))
    }

    fn db_type(&self) -> &str {
        "mysql"
    }
}

fn build_opts(url: &str) -> Result<Opts> {
    let opts = Opts::from_url(url).map_err(|e| MigrateError::connection(SIDE, e))?;
    // Use utf8mb4 for full Unicode support
    Ok(OptsBuilder::from_opts(opts)
        .init(vec!["SET NAMES utf8mb4"])
        .into())
}

/// Convert a transcoded value to a bound MySQL parameter.
fn typed_value_to_mysql(value: &TypedValue<'_>) -> Value {
    match value {
        TypedValue::Null => Value::NULL,
        TypedValue::Integer(v) => Value::Int(*v),
        TypedValue::Real(v) => Value::Float(*v),
        TypedValue::Float(v) => Value::Double(*v),
        TypedValue::Temporal(dt) => Value::Date(
            dt.year() as u16,
            dt.month() as u8,
            dt.day() as u8,
            dt.hour() as u8,
            dt.minute() as u8,
            dt.second() as u8,
            (dt.nanosecond() % 1_000_000_000) / 1_000,
        ),
        TypedValue::Text(s) => Value::Bytes(s.as_bytes().to_vec()),
        TypedValue::Guid(u) => Value::Bytes(u.hyphenated().to_string().into_bytes()),
        // Same zero-byte marker as the literal form
        TypedValue::VarBinary(b) if b.is_empty() => Value::Bytes(vec![0]),
        TypedValue::VarBinary(b) => Value::Bytes(b.to_vec()),
        TypedValue::Decimal(d) => Value::Bytes(d.as_bytes().to_vec()),
    }
}
