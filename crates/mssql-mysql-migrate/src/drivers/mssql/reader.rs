//! MSSQL source reader implementation.
//!
//! Implements the `SourceReader` trait over a single Tiberius connection.
//! Rows are streamed from `SELECT *` and converted column by column into
//! [`SqlValue`]s. GUIDs and exact numerics are handed over as byte payloads
//! so the transcoder can decode them against the declared column type.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use futures::{StreamExt, TryStreamExt};
use tiberius::{Client, ColumnData, Config, FromSql, Query, Row};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, info};

use crate::config::SourceConfig;
use crate::core::identifier::{qualify_mssql, quote_mssql};
use crate::core::schema::{Column, SchemaSet, Table};
use crate::core::traits::{RowStream, SourceReader};
use crate::core::value::{self, SqlValue};
use crate::error::{MigrateError, Result};

const SIDE: &str = "source";

const TABLES_QUERY: &str = r#"
    SELECT TABLE_SCHEMA, TABLE_NAME, TABLE_TYPE
    FROM INFORMATION_SCHEMA.TABLES
    WHERE TABLE_TYPE = 'BASE TABLE'
"#;

const COLUMNS_QUERY: &str = r#"
    SELECT COLUMN_NAME, DATA_TYPE
    FROM INFORMATION_SCHEMA.COLUMNS
    WHERE TABLE_SCHEMA = @P1 AND TABLE_NAME = @P2
    ORDER BY ORDINAL_POSITION
"#;

/// MSSQL source reader using one Tiberius client for the whole run.
pub struct MssqlReader {
    client: Client<Compat<TcpStream>>,
    schema: Option<String>,
}

impl MssqlReader {
    /// Connect using an ADO.NET or `jdbc:sqlserver://` connection string.
    pub async fn connect(config: &SourceConfig) -> Result<Self> {
        let tds_config = parse_connection_string(&config.connection_string)?;
        let addr = tds_config.get_addr();

        let tcp = TcpStream::connect(&addr)
            .await
            .map_err(|e| MigrateError::connection(SIDE, e))?;
        tcp.set_nodelay(true)
            .map_err(|e| MigrateError::connection(SIDE, e))?;

        let client = Client::connect(tds_config, tcp.compat_write())
            .await
            .map_err(|e| MigrateError::connection(SIDE, e))?;

        info!("Connected to MSSQL source: {}", addr);

        Ok(Self {
            client,
            schema: config.schema.clone(),
        })
    }

    /// Load columns for a table in ordinal order.
    async fn load_columns(&mut self, table: &mut Table) -> Result<()> {
        let mut query = Query::new(COLUMNS_QUERY);
        query.bind(table.schema.as_str());
        query.bind(table.name.as_str());

        let rows = query
            .query(&mut self.client)
            .await
            .map_err(|e| MigrateError::introspection(SIDE, e))?
            .into_first_result()
            .await
            .map_err(|e| MigrateError::introspection(SIDE, e))?;

        for row in rows {
            table.columns.push(Column::new(
                row.get::<&str, _>(0).unwrap_or_default(),
                row.get::<&str, _>(1).unwrap_or_default(),
            ));
        }

        debug!(
            "Loaded {} columns for {}",
            table.columns.len(),
            table.full_name()
        );
        Ok(())
    }
}

#[async_trait]
impl SourceReader for MssqlReader {
    async fn extract_schema(&mut self) -> Result<SchemaSet> {
        let mut sql = TABLES_QUERY.to_string();
        let query = match &self.schema {
            Some(schema) => {
                sql.push_str("  AND TABLE_SCHEMA = @P1\n");
                let mut q = Query::new(sql);
                q.bind(schema.clone());
                q
            }
            None => Query::new(sql),
        };

        let rows = query
            .query(&mut self.client)
            .await
            .map_err(|e| MigrateError::introspection(SIDE, e))?
            .into_first_result()
            .await
            .map_err(|e| MigrateError::introspection(SIDE, e))?;

        let mut tables = Vec::with_capacity(rows.len());
        for row in rows {
            let mut table = Table::new(
                row.get::<&str, _>(0).unwrap_or_default(),
                row.get::<&str, _>(1).unwrap_or_default(),
            );
            table.kind = row.get::<&str, _>(2).unwrap_or_default().to_string();
            tables.push(table);
        }

        for table in &mut tables {
            self.load_columns(table).await?;
        }

        let set = SchemaSet::new(tables);
        match &self.schema {
            Some(schema) => info!("Extracted {} tables from schema '{}'", set.len(), schema),
            None => info!("Extracted {} tables from source", set.len()),
        }
        Ok(set)
    }

    async fn read_rows<'a>(&'a mut self, table: &Table) -> Result<RowStream<'a>> {
        let sql = format!(
            "SELECT {} FROM {}",
            select_list(table)?,
            qualify_mssql(&table.schema, &table.name)?
        );
        debug!("Reading {}", table.full_name());

        let stream = self.client.simple_query(sql).await?;
        Ok(stream
            .into_row_stream()
            .map_err(MigrateError::from)
            .and_then(|row| async move { convert_row(row) })
            .boxed())
    }

    async fn get_row_count(&mut self, table: &Table) -> Result<i64> {
        let query = format!(
            "SELECT COUNT_BIG(*) FROM {}",
            qualify_mssql(&table.schema, &table.name)?
        );

        let row = self.client.simple_query(query).await?.into_row().await?;
        Ok(row.and_then(|r| r.get::<i64, _>(0)).unwrap_or(0))
    }

    fn db_type(&self) -> &str {
        "mssql"
    }
}

fn parse_connection_string(conn: &str) -> Result<Config> {
    let parsed = if conn.trim_start().to_lowercase().starts_with("jdbc:") {
        Config::from_jdbc_string(conn)
    } else {
        Config::from_ado_string(conn)
    };
    parsed.map_err(|e| MigrateError::connection(SIDE, e))
}

/// Column list for the source SELECT.
///
/// Tiberius decodes `money`/`smallmoney` as `f64`, so those columns are cast
/// to `decimal(19,4)` and arrive as exact numerics instead.
fn select_list(table: &Table) -> Result<String> {
    if table.columns.is_empty() {
        return Ok("*".to_string());
    }

    let columns = table
        .columns
        .iter()
        .map(|col| -> Result<String> {
            let quoted = quote_mssql(&col.name)?;
            Ok(match col.data_type.trim().to_lowercase().as_str() {
                "money" | "smallmoney" => format!("CAST({0} AS decimal(19,4)) AS {0}", quoted),
                _ => quoted,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(columns.join(", "))
}

fn convert_row(row: Row) -> Result<value::Row> {
    row.into_iter().map(convert_column).collect()
}

/// Convert one column of a Tiberius row into a raw value.
fn convert_column(data: ColumnData<'static>) -> Result<SqlValue<'static>> {
    let value: SqlValue<'static> = match data {
        ColumnData::U8(v) => v.map(i64::from).into(),
        ColumnData::I16(v) => v.map(i64::from).into(),
        ColumnData::I32(v) => v.map(i64::from).into(),
        ColumnData::I64(v) => v.into(),
        ColumnData::Bit(v) => v.map(i64::from).into(),
        ColumnData::F32(v) => v.into(),
        ColumnData::F64(v) => v.into(),
        ColumnData::String(v) => v.map_or(SqlValue::Null, SqlValue::Text),
        ColumnData::Binary(v) => v.map_or(SqlValue::Null, SqlValue::Bytes),
        ColumnData::Guid(v) => v.map(|u| u.to_bytes_le().to_vec()).into(),
        ColumnData::Numeric(v) => v
            .map(|n| numeric_text(n.value(), n.scale()).into_bytes())
            .into(),
        ColumnData::Xml(v) => v.map_or(SqlValue::Null, |_| SqlValue::Unsupported("xml")),
        data @ (ColumnData::DateTime(_)
        | ColumnData::SmallDateTime(_)
        | ColumnData::DateTime2(_)) => NaiveDateTime::from_sql(&data)?.into(),
        data @ ColumnData::Date(_) => NaiveDate::from_sql(&data)?
            .map(|d| d.and_time(NaiveTime::default()))
            .into(),
        data @ ColumnData::Time(_) => NaiveTime::from_sql(&data)?
            .map(|t| NaiveDate::default().and_time(t))
            .into(),
        // Wall clock in the value's own offset
        data @ ColumnData::DateTimeOffset(_) => DateTime::<FixedOffset>::from_sql(&data)?
            .map(|dt| dt.naive_local())
            .into(),
        #[allow(unreachable_patterns)]
        _ => SqlValue::Unsupported("unknown"),
    };
    Ok(value)
}

/// Render an unscaled numeric as exact digit text (`value` = 100356, `scale` = 3 gives "100.356").
fn numeric_text(value: i128, scale: u8) -> String {
    let sign = if value < 0 { "-" } else { "" };
    let digits = value.unsigned_abs().to_string();
    let scale = usize::from(scale);
    if scale == 0 {
        return format!("{}{}", sign, digits);
    }

    let padded = format!("{:0>width$}", digits, width = scale + 1);
    let (int, frac) = padded.split_at(padded.len() - scale);
    format!("{}{}.{}", sign, int, frac)
}
