//! Schema compatibility gate.
//!
//! Decides GO/NO-GO for a migration by comparing the source and destination
//! schema sets positionally: equal table counts, equal (case-insensitive)
//! table names at every position, equal column counts for every pair. The
//! first violation is reported; nothing is aggregated.
//!
//! Columns are matched by position only. Name divergences at the same
//! position are logged but do not fail the check.

use thiserror::Error;
use tracing::{debug, warn};

use crate::core::schema::{SchemaSet, Table};

/// Why two schemas do not correspond.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaMismatch {
    /// The databases hold a different number of base tables.
    #[error("databases' count of tables are different (source: {source_count}, destination: {destination_count})")]
    TableCount {
        source_count: usize,
        destination_count: usize,
    },

    /// The sorted table lists diverge at `position`.
    #[error("database's tables are different at position {position} (source: {source_table}, destination: {destination_table})")]
    TableName {
        position: usize,
        source_table: String,
        destination_table: String,
    },

    /// A matched table pair has a different number of columns.
    #[error("databases' count of columns are different for table {table} (source: {source_count}, destination: {destination_count})")]
    ColumnCount {
        table: String,
        source_count: usize,
        destination_count: usize,
    },
}

/// A column whose name differs between the two sides at the same position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDivergence {
    pub table: String,
    pub position: usize,
    pub source_column: String,
    pub destination_column: String,
}

/// Both schema sets after a successful check, unchanged.
#[derive(Debug, Clone)]
pub struct CheckedSchemas {
    source: SchemaSet,
    destination: SchemaSet,
}

impl CheckedSchemas {
    pub fn source(&self) -> &SchemaSet {
        &self.source
    }

    pub fn destination(&self) -> &SchemaSet {
        &self.destination
    }

    /// Matched `(source, destination)` table pairs in canonical order.
    pub fn pairs(&self) -> impl ExactSizeIterator<Item = (&Table, &Table)> {
        self.source.iter().zip(self.destination.iter())
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Hand back both schema sets.
    pub fn into_inner(self) -> (SchemaSet, SchemaSet) {
        (self.source, self.destination)
    }
}

/// Check that `destination` can receive the rows of `source`.
pub fn check(
    source: SchemaSet,
    destination: SchemaSet,
) -> std::result::Result<CheckedSchemas, SchemaMismatch> {
    if source.len() != destination.len() {
        return Err(SchemaMismatch::TableCount {
            source_count: source.len(),
            destination_count: destination.len(),
        });
    }

    for (position, (src, dst)) in source.iter().zip(destination.iter()).enumerate() {
        if src.name.to_lowercase() != dst.name.to_lowercase() {
            return Err(SchemaMismatch::TableName {
                position,
                source_table: src.name.clone(),
                destination_table: dst.name.clone(),
            });
        }
    }

    for (src, dst) in source.iter().zip(destination.iter()) {
        if src.columns.len() != dst.columns.len() {
            return Err(SchemaMismatch::ColumnCount {
                table: src.name.clone(),
                source_count: src.columns.len(),
                destination_count: dst.columns.len(),
            });
        }
    }

    let checked = CheckedSchemas {
        source,
        destination,
    };

    for d in column_divergences(&checked) {
        warn!(
            "Table {}: column {} is '{}' on source but '{}' on destination; values are copied by position",
            d.table, d.position, d.source_column, d.destination_column
        );
    }

    debug!("Schema check passed for {} table pairs", checked.len());
    Ok(checked)
}

/// Positional column name differences (case-insensitive) across matched pairs.
pub fn column_divergences(schemas: &CheckedSchemas) -> Vec<ColumnDivergence> {
    schemas
        .pairs()
        .flat_map(|(src, dst)| {
            src.columns
                .iter()
                .zip(dst.columns.iter())
                .enumerate()
                .filter(|(_, (s, d))| !s.name.eq_ignore_ascii_case(&d.name))
                .map(|(position, (s, d))| ColumnDivergence {
                    table: src.name.clone(),
                    position,
                    source_column: s.name.clone(),
                    destination_column: d.name.clone(),
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn documents(schema: &str, name: &str) -> Table {
        Table::new(schema, name)
            .with_column("CompanyID", "int")
            .with_column("DocumentID", "int")
            .with_column("DocDate", "date")
            .with_column("Description", "nchar")
    }

    #[test]
    fn test_matching_schemas_pass() {
        let source = SchemaSet::new(vec![documents("dbo", "Documents"), Table::new("dbo", "Empty")]);
        let destination =
            SchemaSet::new(vec![Table::new("app", "empty"), documents("app", "documents")]);

        let checked = check(source.clone(), destination.clone()).unwrap();
        assert_eq!(checked.len(), 2);

        let pairs: Vec<(&str, &str)> = checked
            .pairs()
            .map(|(s, d)| (s.name.as_str(), d.name.as_str()))
            .collect();
        assert_eq!(pairs, vec![("Documents", "documents"), ("Empty", "empty")]);

        let (s, d) = checked.into_inner();
        assert_eq!(s, source);
        assert_eq!(d, destination);
    }

    #[test]
    fn test_empty_schemas_pass() {
        let checked = check(SchemaSet::default(), SchemaSet::default()).unwrap();
        assert!(checked.is_empty());
    }

    #[test]
    fn test_table_count_mismatch() {
        let source = SchemaSet::new(vec![
            documents("dbo", "Documents"),
            documents("dbo", "Documents1"),
        ]);
        let destination = SchemaSet::new(vec![documents("app", "Documents")]);

        let err = check(source, destination).unwrap_err();
        assert_eq!(
            err,
            SchemaMismatch::TableCount {
                source_count: 2,
                destination_count: 1
            }
        );
    }

    #[test]
    fn test_table_name_mismatch_reports_first_divergence() {
        let source = SchemaSet::new(vec![
            documents("dbo", "Alpha"),
            documents("dbo", "Documents"),
            documents("dbo", "Zeta"),
        ]);
        let destination = SchemaSet::new(vec![
            documents("app", "alpha"),
            documents("app", "Documents1"),
            documents("app", "Omega"),
        ]);

        let err = check(source, destination).unwrap_err();
        assert_eq!(
            err,
            SchemaMismatch::TableName {
                position: 1,
                source_table: "Documents".to_string(),
                destination_table: "Documents1".to_string(),
            }
        );
    }

    #[test]
    fn test_column_count_mismatch() {
        let source = SchemaSet::new(vec![documents("dbo", "Documents")]);
        let narrow = Table::new("app", "Documents")
            .with_column("CompanyID", "int")
            .with_column("DocumentID", "int")
            .with_column("DocDate", "date");
        let destination = SchemaSet::new(vec![narrow]);

        let err = check(source, destination).unwrap_err();
        assert_eq!(
            err,
            SchemaMismatch::ColumnCount {
                table: "Documents".to_string(),
                source_count: 4,
                destination_count: 3,
            }
        );
        assert!(err.to_string().starts_with("databases' count of columns are different"));
    }

    #[test]
    fn test_name_check_runs_before_column_check() {
        // Pair 0 has a column mismatch, pair 1 a name mismatch: names win.
        let source = SchemaSet::new(vec![
            documents("dbo", "A"),
            documents("dbo", "B"),
        ]);
        let destination = SchemaSet::new(vec![
            Table::new("app", "A").with_column("x", "int"),
            documents("app", "C"),
        ]);

        let err = check(source, destination).unwrap_err();
        assert!(matches!(err, SchemaMismatch::TableName { position: 1, .. }));
    }

    #[test]
    fn test_column_divergences_are_reported_not_failed() {
        let source = SchemaSet::new(vec![documents("dbo", "Documents")]);
        let swapped = Table::new("app", "Documents")
            .with_column("companyid", "int")
            .with_column("DocDate", "date")
            .with_column("DocumentID", "int")
            .with_column("Description", "nchar");
        let destination = SchemaSet::new(vec![swapped]);

        let checked = check(source, destination).unwrap();
        let divergences = column_divergences(&checked);
        assert_eq!(divergences.len(), 2);
        assert_eq!(divergences[0].position, 1);
        assert_eq!(divergences[0].source_column, "DocumentID");
        assert_eq!(divergences[0].destination_column, "DocDate");
    }
}
