//! Microsoft SQL Server driver.
//!
//! - [`MssqlReader`]: source reader for SQL Server databases

mod reader;

pub use reader::MssqlReader;
