//! Database driver implementations.
//!
//! This module provides database-specific implementations of the core traits:
//!
//! - [`mssql`]: Microsoft SQL Server source ([`SourceReader`])
//! - [`mysql`]: MySQL/MariaDB destination ([`TargetWriter`])
//!
//! Each driver owns exactly one connection. Connection-string parsing is
//! delegated to the driver crates (Tiberius ADO.NET/JDBC parsing, mysql_async
//! URL parsing).
//!
//! [`SourceReader`]: crate::core::SourceReader
//! [`TargetWriter`]: crate::core::TargetWriter

pub mod mssql;
pub mod mysql;

pub use mssql::MssqlReader;
pub use mysql::MysqlWriter;
