//! Core abstractions shared by the drivers and the migration engine.
//!
//! - [`schema`]: table and column metadata, canonical schema ordering
//! - [`value`]: raw column values as read from the source cursor
//! - [`identifier`]: identifier validation and dialect quoting
//! - [`traits`]: the source and destination connection seams

pub mod identifier;
pub mod schema;
pub mod traits;
pub mod value;

pub use schema::{Column, SchemaSet, SourceType, Table, BASE_TABLE};
pub use traits::{RowStream, SourceReader, TargetWriter};
pub use value::{Row, SqlValue};
