//! Schema metadata types for base tables and their columns.
//!
//! These are read-only snapshots built from live catalog queries at the start
//! of a run. Nothing here is persisted or mutated after construction.

use serde::{Deserialize, Serialize};

/// Catalog table type reported for tables of stored rows.
pub const BASE_TABLE: &str = "BASE TABLE";

/// Table metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Owning schema (SQL Server schema, or the MySQL database name).
    pub schema: String,

    /// Table name.
    pub name: String,

    /// Catalog table type (e.g. "BASE TABLE").
    pub kind: String,

    /// Column definitions in catalog ordinal order.
    pub columns: Vec<Column>,
}

impl Table {
    /// Create a base table with no columns.
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            kind: BASE_TABLE.to_string(),
            columns: Vec::new(),
        }
    }

    /// Add a column (builder style).
    pub fn with_column(mut self, name: impl Into<String>, data_type: impl Into<String>) -> Self {
        self.columns.push(Column::new(name, data_type));
        self
    }

    /// Get the fully qualified table name.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    /// Column names in ordinal order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Column metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Declared data type as reported by the catalog (e.g. "uniqueidentifier").
    pub data_type: String,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }

    /// Resolve the declared type into the class that drives binary decoding.
    pub fn source_type(&self) -> SourceType {
        SourceType::from_declared(&self.data_type)
    }
}

/// How an opaque byte payload from a column must be interpreted.
///
/// The SQL Server driver hands back GUIDs, binary data and exact decimals as
/// byte sequences; only the declared column type tells them apart. Resolved
/// once per column instead of once per value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceType {
    /// `uniqueidentifier`: 16 bytes in SQL Server's mixed-endian order.
    Guid,
    /// `varbinary`, `binary`, `image`, `timestamp`/`rowversion`.
    VarBinary,
    /// `decimal`, `numeric`, and `money`/`smallmoney` (selected as decimal): textual digits.
    Decimal,
    /// Any other declared type. Byte payloads are not expected here.
    Other,
}

impl SourceType {
    /// Classify a declared SQL Server type name (case-insensitive).
    pub fn from_declared(data_type: &str) -> Self {
        match data_type.trim().to_lowercase().as_str() {
            "uniqueidentifier" => SourceType::Guid,
            "varbinary" | "binary" | "image" | "timestamp" | "rowversion" => SourceType::VarBinary,
            "decimal" | "numeric" | "money" | "smallmoney" => SourceType::Decimal,
            _ => SourceType::Other,
        }
    }
}

/// Base tables of one database, sorted case-insensitively by name.
///
/// The canonical order lets two catalogs whose names differ only in case line
/// up positionally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSet {
    tables: Vec<Table>,
}

impl SchemaSet {
    /// Build a schema set, sorting tables by lowercased name.
    pub fn new(mut tables: Vec<Table>) -> Self {
        tables.sort_by_cached_key(|t| t.name.to_lowercase());
        Self { tables }
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Table> {
        self.tables.iter()
    }

    pub fn into_tables(self) -> Vec<Table> {
        self.tables
    }
}

impl FromIterator<Table> for SchemaSet {
    fn from_iter<I: IntoIterator<Item = Table>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a SchemaSet {
    type Item = &'a Table;
    type IntoIter = std::slice::Iter<'a, Table>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.iter()
    }
}
