//! # mssql-mysql-migrate
//!
//! One-shot SQL Server to MySQL/MariaDB data migration library.
//!
//! Copies every row of every base table from a SQL Server database into a
//! MySQL database whose tables already exist with the same shape:
//!
//! - **Schema gate**: table counts, table names and column counts must
//!   correspond before any row moves
//! - **Row transcoding**: GUID byte order, binary data, exact decimals,
//!   temporal formatting and string escaping for MySQL
//! - **Bound or literal inserts**, one row at a time
//! - **Foreign key checks** disabled for the run and always re-enabled
//!
//! ## Example
//!
//! ```rust,no_run
//! use mssql_mysql_migrate::{Config, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> mssql_mysql_migrate::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let mut orchestrator = Orchestrator::connect(config).await?;
//!     let result = orchestrator.run().await?;
//!     println!("Migrated {} rows", result.rows_transferred);
//!     Ok(())
//! }
//! ```

pub mod compat;
pub mod config;
pub mod core;
pub mod drivers;
pub mod error;
pub mod orchestrator;
pub mod statement;
pub mod transcode;

// Re-exports for convenient access
pub use compat::{CheckedSchemas, SchemaMismatch};
pub use config::{Config, InsertMode, MigrationConfig, SourceConfig, TargetConfig};
pub use crate::core::{Column, SchemaSet, SourceReader, SqlValue, Table, TargetWriter};
pub use drivers::{MssqlReader, MysqlWriter};
pub use error::{MigrateError, Result};
pub use orchestrator::{MigrationResult, Orchestrator, RowCountCheck, TableResult};
pub use statement::InsertStatement;
pub use transcode::{encode, Literal, TypedValue};
