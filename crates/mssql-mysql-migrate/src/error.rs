//! Error types for the migration library.

use thiserror::Error;

use crate::compat::SchemaMismatch;

/// Boxed cause carried by errors that wrap a driver or collaborator failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Exit code for configuration errors (bad arguments, invalid YAML).
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code when either database cannot be reached.
pub const EXIT_CONNECTION_ERROR: u8 = 2;
/// Exit code when a catalog query fails.
pub const EXIT_INTROSPECTION_ERROR: u8 = 3;
/// Exit code when the schemas do not correspond.
pub const EXIT_SCHEMA_MISMATCH: u8 = 4;
/// Exit code when a row value cannot be transcoded (strict mode).
pub const EXIT_TRANSCODE_ERROR: u8 = 5;
/// Exit code when the destination rejects an INSERT.
pub const EXIT_STATEMENT_ERROR: u8 = 6;
/// Exit code for file I/O errors.
pub const EXIT_IO_ERROR: u8 = 7;
/// Exit code when the run was interrupted.
pub const EXIT_CANCELLED: u8 = 8;
/// Exit code for any other driver error.
pub const EXIT_DRIVER_ERROR: u8 = 9;

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (missing connection string, invalid YAML, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Either database could not be opened.
    #[error("Cannot connect to {side} database")]
    Connection {
        side: &'static str,
        #[source]
        source: BoxError,
    },

    /// A metadata catalog query failed.
    #[error("Schema introspection failed on {side} database")]
    Introspection {
        side: &'static str,
        #[source]
        source: BoxError,
    },

    /// A catalog identifier cannot be quoted safely.
    #[error("Invalid identifier: {0}")]
    Identifier(String),

    /// The two schemas do not correspond.
    #[error(transparent)]
    SchemaMismatch(#[from] SchemaMismatch),

    /// A row value could not be converted to a destination literal.
    #[error("Cannot transcode column {column} of table {table}: {message}")]
    RowTranscode {
        table: String,
        column: String,
        message: String,
    },

    /// The destination rejected a statement.
    #[error("Destination rejected INSERT into {table}")]
    StatementExecution {
        table: String,
        #[source]
        source: BoxError,
    },

    /// Source database query error
    #[error("Source database error: {0}")]
    Source(#[from] tiberius::error::Error),

    /// Target database query error
    #[error("Target database error: {0}")]
    Target(#[from] mysql_async::Error),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Migration was cancelled (SIGINT, etc.)
    #[error("Migration cancelled")]
    Cancelled,
}

impl MigrateError {
    /// Create a Connection error for the given side ("source" or "destination").
    pub fn connection(side: &'static str, source: impl Into<BoxError>) -> Self {
        MigrateError::Connection {
            side,
            source: source.into(),
        }
    }

    /// Create an Introspection error for the given side.
    pub fn introspection(side: &'static str, source: impl Into<BoxError>) -> Self {
        MigrateError::Introspection {
            side,
            source: source.into(),
        }
    }

    /// Create a RowTranscode error.
    pub fn transcode(
        table: impl Into<String>,
        column: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        MigrateError::RowTranscode {
            table: table.into(),
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a StatementExecution error.
    pub fn statement(table: impl Into<String>, source: impl Into<BoxError>) -> Self {
        MigrateError::StatementExecution {
            table: table.into(),
            source: source.into(),
        }
    }

    /// Process exit code for this error class.
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Config(_) | MigrateError::Yaml(_) => EXIT_CONFIG_ERROR,
            MigrateError::Connection { .. } => EXIT_CONNECTION_ERROR,
            MigrateError::Introspection { .. } | MigrateError::Identifier(_) => {
                EXIT_INTROSPECTION_ERROR
            }
            MigrateError::SchemaMismatch(_) => EXIT_SCHEMA_MISMATCH,
            MigrateError::RowTranscode { .. } => EXIT_TRANSCODE_ERROR,
            MigrateError::StatementExecution { .. } => EXIT_STATEMENT_ERROR,
            MigrateError::Io(_) => EXIT_IO_ERROR,
            MigrateError::Cancelled => EXIT_CANCELLED,
            MigrateError::Source(_) | MigrateError::Target(_) | MigrateError::Json(_) => {
                EXIT_DRIVER_ERROR
            }
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(MigrateError::Config("x".into()).exit_code(), EXIT_CONFIG_ERROR);
        assert_eq!(
            MigrateError::connection("source", "refused").exit_code(),
            EXIT_CONNECTION_ERROR
        );
        assert_eq!(
            MigrateError::from(SchemaMismatch::TableCount {
                source_count: 2,
                destination_count: 1
            })
            .exit_code(),
            EXIT_SCHEMA_MISMATCH
        );
        assert_eq!(
            MigrateError::statement("Documents", "duplicate key").exit_code(),
            EXIT_STATEMENT_ERROR
        );
        assert_eq!(MigrateError::Cancelled.exit_code(), EXIT_CANCELLED);
    }

    #[test]
    fn test_format_detailed_includes_cause() {
        let err = MigrateError::introspection("destination", "table 'x' doesn't exist");
        let detailed = err.format_detailed();
        assert!(detailed.starts_with("Error: Schema introspection failed on destination database"));
        assert!(detailed.contains("Caused by:\n  1: table 'x' doesn't exist"));
    }

    #[test]
    fn test_statement_error_names_table() {
        let err = MigrateError::statement("Documents", "Duplicate entry '1-0'");
        assert_eq!(err.to_string(), "Destination rejected INSERT into Documents");
    }
}
