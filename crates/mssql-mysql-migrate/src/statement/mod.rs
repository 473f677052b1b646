//! INSERT statement assembly for the destination table.
//!
//! The quoted column prefix is built once per table; each row then only
//! appends its value tuple.

use crate::core::identifier::quote_mysql;
use crate::core::schema::Table;
use crate::error::{MigrateError, Result};
use crate::transcode::TypedValue;

/// Single-row INSERT builder for one destination table.
#[derive(Debug, Clone)]
pub struct InsertStatement {
    table: String,
    prefix: String,
    placeholders: String,
    column_count: usize,
}

impl InsertStatement {
    /// Build the `INSERT INTO ... VALUES ` prefix for a destination table.
    pub fn new(table: &Table) -> Result<Self> {
        let columns = table
            .columns
            .iter()
            .map(|c| quote_mysql(&c.name))
            .collect::<Result<Vec<_>>>()?;

        let prefix = format!(
            "INSERT INTO {} ({}) VALUES ",
            quote_mysql(&table.name)?,
            columns.join(", ")
        );
        let placeholders = format!("{}({})", prefix, vec!["?"; columns.len()].join(", "));

        Ok(Self {
            table: table.name.clone(),
            prefix,
            placeholders,
            column_count: columns.len(),
        })
    }

    /// Fully literal statement for one row.
    pub fn literal(&self, values: &[TypedValue<'_>]) -> Result<String> {
        self.check_width(values.len())?;

        let mut sql = String::with_capacity(self.prefix.len() + 2 + values.len() * 8);
        sql.push_str(&self.prefix);
        sql.push('(');
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str(value.to_literal().as_sql());
        }
        sql.push(')');
        Ok(sql)
    }

    /// Statement with one `?` placeholder per column.
    pub fn parameterized(&self) -> &str {
        &self.placeholders
    }

    /// Validate a row's width against the column list.
    pub fn check_width(&self, value_count: usize) -> Result<()> {
        if value_count != self.column_count {
            return Err(MigrateError::transcode(
                &self.table,
                "*",
                format!(
                    "{} values supplied for {} columns",
                    value_count, self.column_count
                ),
            ));
        }
        Ok(())
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }
}
