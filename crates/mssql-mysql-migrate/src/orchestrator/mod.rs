//! Migration orchestrator - main workflow coordinator.
//!
//! A run proceeds strictly in order:
//!
//! 1. Disable foreign key checks on the destination session
//! 2. Introspect both schemas and check that they correspond
//! 3. Copy every table pair in canonical order, one row at a time
//! 4. Re-enable foreign key checks, whether or not step 2 or 3 failed
//!
//! The first error aborts the run. Tables already copied stay copied; there
//! is no transaction around the inserts.

use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::compat::{self, CheckedSchemas};
use crate::config::{Config, InsertMode};
use crate::core::schema::Table;
use crate::core::traits::{SourceReader, TargetWriter};
use crate::drivers::{MssqlReader, MysqlWriter};
use crate::error::{MigrateError, Result};
use crate::statement::InsertStatement;
use crate::transcode::RowTranscoder;

/// Migration orchestrator.
pub struct Orchestrator<S, T> {
    config: Config,
    source: S,
    target: T,
    progress: bool,
    cancel: Option<CancellationToken>,
}

/// Result of a migration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationResult {
    /// Unique run identifier.
    pub run_id: String,

    /// Final status.
    pub status: String,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// When the migration started.
    pub started_at: DateTime<Utc>,

    /// When the migration completed.
    pub completed_at: DateTime<Utc>,

    /// Total tables copied.
    pub tables_total: usize,

    /// Total rows transferred.
    pub rows_transferred: i64,

    /// Average throughput (rows/second).
    pub rows_per_second: i64,

    /// Per-table results in copy order.
    pub tables: Vec<TableResult>,
}

/// Outcome of copying one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableResult {
    /// Destination table name.
    pub name: String,

    /// Rows inserted.
    pub rows: i64,

    /// Values written as NULL because they had no destination representation.
    pub null_downgrades: u64,
}

/// Progress line emitted after each table when progress reporting is on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub table: String,
    pub tables_completed: usize,
    pub tables_total: usize,
    pub rows: i64,
    pub rows_transferred: i64,
}

/// Row counts of one table pair after a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowCountCheck {
    pub table: String,
    pub source_rows: i64,
    pub destination_rows: i64,
}

impl RowCountCheck {
    pub fn matches(&self) -> bool {
        self.source_rows == self.destination_rows
    }
}

impl Orchestrator<MssqlReader, MysqlWriter> {
    /// Open both connections described by the configuration.
    pub async fn connect(config: Config) -> Result<Self> {
        config.validate()?;
        let source = MssqlReader::connect(&config.source).await?;
        let target = MysqlWriter::connect(&config.target).await?;
        Ok(Self::new(config, source, target))
    }
}

impl<S: SourceReader, T: TargetWriter> Orchestrator<S, T> {
    /// Create an orchestrator over already opened connections.
    pub fn new(config: Config, source: S, target: T) -> Self {
        Self {
            config,
            source,
            target,
            progress: false,
            cancel: None,
        }
    }

    /// Print a JSON progress line to stderr after each table.
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.progress = enabled;
        self
    }

    /// Abort between rows once the token is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Hand back both connections.
    pub fn into_parts(self) -> (S, T) {
        (self.source, self.target)
    }

    /// Introspect both databases and check that their schemas correspond.
    pub async fn check_schemas(&mut self) -> Result<CheckedSchemas> {
        info!("Extracting schema from {} source", self.source.db_type());
        let source = self.source.extract_schema().await?;

        info!("Extracting schema from {} target", self.target.db_type());
        let destination = self.target.extract_schema().await?;

        let checked = compat::check(source, destination)?;
        info!("Schemas match: {} tables", checked.len());
        Ok(checked)
    }

    /// Run the migration.
    pub async fn run(&mut self) -> Result<MigrationResult> {
        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        info!(
            "Starting migration run: {} (insert mode: {})",
            run_id, self.config.migration.insert_mode
        );

        self.target.set_foreign_key_checks(false).await?;
        let outcome = self.copy_all().await;
        let restored = self.target.set_foreign_key_checks(true).await;

        let tables = match (outcome, restored) {
            (Ok(tables), Ok(())) => tables,
            (Ok(_), Err(e)) => {
                error!("Failed to re-enable foreign key checks: {}", e);
                return Err(e);
            }
            (Err(e), Ok(())) => return Err(e),
            (Err(e), Err(restore_err)) => {
                error!(
                    "Failed to re-enable foreign key checks after error: {}",
                    restore_err
                );
                return Err(e);
            }
        };

        let completed_at = Utc::now();
        let duration = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;
        let rows_transferred: i64 = tables.iter().map(|t| t.rows).sum();
        let rows_per_second = if duration > 0.0 {
            (rows_transferred as f64 / duration) as i64
        } else {
            0
        };

        let result = MigrationResult {
            run_id,
            status: "completed".to_string(),
            duration_seconds: duration,
            started_at,
            completed_at,
            tables_total: tables.len(),
            rows_transferred,
            rows_per_second,
            tables,
        };

        info!(
            "Migration {}: {} tables, {} rows in {:.1}s ({} rows/s)",
            result.status,
            result.tables_total,
            result.rows_transferred,
            result.duration_seconds,
            result.rows_per_second
        );

        Ok(result)
    }

    /// Check schemas, then copy every table pair in order.
    async fn copy_all(&mut self) -> Result<Vec<TableResult>> {
        let checked = self.check_schemas().await?;
        let total = checked.len();
        let mut results = Vec::with_capacity(total);
        let mut rows_transferred = 0;

        for (index, (source_table, target_table)) in checked.pairs().enumerate() {
            let result = self.copy_table(source_table, target_table).await?;
            rows_transferred += result.rows;

            info!(
                "Table {} migrated ({}/{}); Rows: {};",
                result.name,
                index + 1,
                total,
                result.rows
            );

            if self.progress {
                let update = ProgressUpdate {
                    table: result.name.clone(),
                    tables_completed: index + 1,
                    tables_total: total,
                    rows: result.rows,
                    rows_transferred,
                };
                eprintln!("{}", serde_json::to_string(&update)?);
            }

            results.push(result);
        }

        Ok(results)
    }

    /// Stream one source table into its destination counterpart.
    async fn copy_table(&mut self, source_table: &Table, target_table: &Table) -> Result<TableResult> {
        let statement = InsertStatement::new(target_table)?;
        let mut transcoder = RowTranscoder::new(source_table, self.config.migration.strict_values);
        let insert_mode = self.config.migration.insert_mode;

        debug!(
            "Copying {} -> {}",
            source_table.full_name(),
            target_table.name
        );

        let mut rows = self.source.read_rows(source_table).await?;
        let mut count: i64 = 0;

        loop {
            if self.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
                warn!("Migration cancelled while copying {}", target_table.name);
                return Err(MigrateError::Cancelled);
            }

            let Some(row) = rows.try_next().await? else {
                break;
            };

            let values = transcoder.encode_row(&row)?;
            let executed = match insert_mode {
                InsertMode::Literal => {
                    let sql = statement.literal(&values)?;
                    self.target.execute(&sql).await
                }
                InsertMode::Bound => {
                    statement.check_width(values.len())?;
                    self.target
                        .execute_with_params(statement.parameterized(), &values)
                        .await
                }
            };
            executed.map_err(|e| MigrateError::statement(&target_table.name, e))?;

            count += 1;
        }

        if transcoder.null_downgrades() > 0 {
            warn!(
                "Table {}: {} values written as NULL",
                target_table.name,
                transcoder.null_downgrades()
            );
        }

        Ok(TableResult {
            name: target_table.name.clone(),
            rows: count,
            null_downgrades: transcoder.null_downgrades(),
        })
    }

    /// Validate row counts between source and target.
    pub async fn validate(&mut self) -> Result<Vec<RowCountCheck>> {
        let checked = self.check_schemas().await?;
        let mut results = Vec::with_capacity(checked.len());

        for (source_table, target_table) in checked.pairs() {
            let source_rows = self.source.get_row_count(source_table).await?;
            let destination_rows = self.target.get_row_count(target_table).await?;

            let check = RowCountCheck {
                table: target_table.name.clone(),
                source_rows,
                destination_rows,
            };

            if check.matches() {
                info!("{}: {} rows (match)", check.table, source_rows);
            } else {
                warn!(
                    "{}: source={} target={} (MISMATCH)",
                    check.table, source_rows, destination_rows
                );
            }
            results.push(check);
        }

        Ok(results)
    }
}

impl MigrationResult {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
