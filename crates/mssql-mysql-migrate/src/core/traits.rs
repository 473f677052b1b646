//! Core traits for the two database connections of a migration run.
//!
//! - [`SourceReader`]: introspects the source catalog and streams table rows
//! - [`TargetWriter`]: introspects the destination catalog and executes inserts
//!
//! Both sides hold a single live connection for the whole run; the
//! orchestrator drives them strictly one row at a time.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;
use crate::transcode::TypedValue;

use super::schema::{SchemaSet, Table};
use super::value::Row;

/// Forward-only cursor over the rows of one table.
///
/// Each item is one row in column ordinal order. The stream borrows the
/// reader's connection until it is dropped.
pub type RowStream<'a> = BoxStream<'a, Result<Row>>;

/// Read schema and data from the source database.
#[async_trait]
pub trait SourceReader: Send {
    /// List base tables with their ordered columns, sorted by lowercased name.
    ///
    /// Catalog failures surface as `MigrateError::Introspection`.
    async fn extract_schema(&mut self) -> Result<SchemaSet>;

    /// Open a cursor over `SELECT * FROM <table>`.
    async fn read_rows<'a>(&'a mut self, table: &Table) -> Result<RowStream<'a>>;

    /// Count the rows of a table.
    async fn get_row_count(&mut self, table: &Table) -> Result<i64>;

    /// Get the database type identifier (e.g., "mssql").
    fn db_type(&self) -> &str;
}

/// Write data to the destination database.
#[async_trait]
pub trait TargetWriter: Send {
    /// List base tables with their ordered columns, sorted by lowercased name.
    async fn extract_schema(&mut self) -> Result<SchemaSet>;

    /// Toggle referential-integrity enforcement for this session.
    async fn set_foreign_key_checks(&mut self, enabled: bool) -> Result<()>;

    /// Execute a fully literal statement.
    async fn execute(&mut self, sql: &str) -> Result<()>;

    /// Execute a statement with positional `?` placeholders bound to `params`.
    async fn execute_with_params(&mut self, sql: &str, params: &[TypedValue<'_>]) -> Result<()>;

    /// Count the rows of a table.
    async fn get_row_count(&mut self, table: &Table) -> Result<i64>;

    /// Get the database type identifier (e.g., "mysql").
    fn db_type(&self) -> &str;
}
