//! Row value transcoding from SQL Server runtime values to MySQL.
//!
//! Each raw [`SqlValue`] is resolved against the declared source column type
//! into a [`TypedValue`], which then renders either as literal SQL text or
//! as a bound parameter. Rendering rules:
//!
//! | Value | Literal |
//! |---|---|
//! | NULL | `NULL` |
//! | integer | decimal text |
//! | float | shortest round-trip text |
//! | temporal | `'YYYY-MM-DD HH:MM:SS.ffffff'` |
//! | text | trailing spaces stripped, `\` and `'` backslash-escaped, quoted |
//! | GUID bytes | mixed-endian wire order decoded, quoted lowercase |
//! | binary bytes | `0x` + lowercase hex, `0x00` when empty |
//! | decimal bytes | the digit text, unquoted |
//!
//! Values that fit none of these downgrade to NULL. The first downgrade of a
//! column is logged and every downgrade is counted; strict mode turns them
//! into errors.

use std::borrow::Cow;
use std::fmt::{self, Write as _};

use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::core::schema::{SourceType, Table};
use crate::core::value::SqlValue;
use crate::error::{MigrateError, Result};

const TEMPORAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Marker written for an empty binary value.
pub const EMPTY_BINARY_LITERAL: &str = "0x00";

/// A destination literal, or the NULL marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Null,
    Value(String),
}

impl Literal {
    pub fn is_null(&self) -> bool {
        matches!(self, Literal::Null)
    }

    /// SQL text for this literal.
    pub fn as_sql(&self) -> &str {
        match self {
            Literal::Null => "NULL",
            Literal::Value(s) => s,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Why a raw value has no destination representation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct Unrecognized(String);

/// A column value resolved against its declared source type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue<'a> {
    Null,
    Integer(i64),
    Real(f32),
    Float(f64),
    Temporal(NaiveDateTime),
    /// Character data with trailing spaces already removed.
    Text(Cow<'a, str>),
    Guid(Uuid),
    VarBinary(Cow<'a, [u8]>),
    /// Exact decimal digits, `-?d+(.d+)?`.
    Decimal(Cow<'a, str>),
}

impl<'a> TypedValue<'a> {
    /// Resolve a raw value using the declared type class of its column.
    pub fn resolve(
        value: &'a SqlValue<'_>,
        source_type: SourceType,
    ) -> std::result::Result<Self, Unrecognized> {
        match value {
            SqlValue::Null => Ok(TypedValue::Null),
            SqlValue::Int(v) => Ok(TypedValue::Integer(*v)),
            SqlValue::F32(v) if v.is_finite() => Ok(TypedValue::Real(*v)),
            SqlValue::F64(v) if v.is_finite() => Ok(TypedValue::Float(*v)),
            SqlValue::F32(v) => Err(Unrecognized(format!("non-finite float {}", v))),
            SqlValue::F64(v) => Err(Unrecognized(format!("non-finite float {}", v))),
            SqlValue::DateTime(v) => Ok(TypedValue::Temporal(*v)),
            SqlValue::Text(s) => Ok(TypedValue::Text(Cow::Borrowed(s.trim_end_matches(' ')))),
            SqlValue::Bytes(b) => resolve_bytes(b, source_type),
            SqlValue::Unsupported(kind) => {
                Err(Unrecognized(format!("unsupported value kind '{}'", kind)))
            }
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, TypedValue::Null)
    }

    /// Render as MySQL literal text.
    pub fn to_literal(&self) -> Literal {
        let text = match self {
            TypedValue::Null => return Literal::Null,
            TypedValue::Integer(v) => v.to_string(),
            TypedValue::Real(v) => v.to_string(),
            TypedValue::Float(v) => v.to_string(),
            TypedValue::Temporal(v) => format!("'{}'", v.format(TEMPORAL_FORMAT)),
            TypedValue::Text(s) => format!("'{}'", escape_text(s)),
            TypedValue::Guid(u) => format!("'{}'", u.hyphenated()),
            TypedValue::VarBinary(b) => hex_literal(b),
            TypedValue::Decimal(d) => d.to_string(),
        };
        Literal::Value(text)
    }
}

fn resolve_bytes<'a>(
    bytes: &'a [u8],
    source_type: SourceType,
) -> std::result::Result<TypedValue<'a>, Unrecognized> {
    match source_type {
        SourceType::Guid => {
            let wire: [u8; 16] = bytes.try_into().map_err(|_| {
                Unrecognized(format!("GUID payload has {} bytes, expected 16", bytes.len()))
            })?;
            // First three groups arrive little-endian.
            Ok(TypedValue::Guid(Uuid::from_bytes_le(wire)))
        }
        SourceType::VarBinary => Ok(TypedValue::VarBinary(Cow::Borrowed(bytes))),
        SourceType::Decimal => match std::str::from_utf8(bytes) {
            Ok(digits) if is_decimal_literal(digits) => {
                Ok(TypedValue::Decimal(Cow::Borrowed(digits)))
            }
            _ => Err(Unrecognized(
                "decimal payload is not a numeric literal".to_string(),
            )),
        },
        SourceType::Other => Err(Unrecognized(
            "byte payload for a column with no binary decoding".to_string(),
        )),
    }
}

/// Escape backslashes first, then single quotes.
fn escape_text(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}

fn hex_literal(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return EMPTY_BINARY_LITERAL.to_string();
    }
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("0x");
    for b in bytes {
        let _ = write!(out, "{:02x}", b);
    }
    out
}

fn is_decimal_literal(s: &str) -> bool {
    let unsigned = s.strip_prefix('-').unwrap_or(s);
    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    match unsigned.split_once('.') {
        Some((int, frac)) => all_digits(int) && all_digits(frac),
        None => all_digits(unsigned),
    }
}

/// Encode one raw value for a column of the given declared type.
///
/// Unrecognized values come back as [`Literal::Null`] with a warning.
pub fn encode(value: &SqlValue<'_>, declared_type: &str) -> Literal {
    match TypedValue::resolve(value, SourceType::from_declared(declared_type)) {
        Ok(typed) => typed.to_literal(),
        Err(reason) => {
            warn!(
                "Value of declared type '{}' written as NULL: {}",
                declared_type, reason
            );
            Literal::Null
        }
    }
}

#[derive(Debug)]
struct ColumnSlot {
    name: String,
    source_type: SourceType,
    warned: bool,
}

/// Per-table transcoding state: resolved column classes and downgrade counts.
#[derive(Debug)]
pub struct RowTranscoder {
    table: String,
    slots: Vec<ColumnSlot>,
    strict: bool,
    null_downgrades: u64,
}

impl RowTranscoder {
    /// Prepare a transcoder from the source table's declared column types.
    pub fn new(table: &Table, strict: bool) -> Self {
        let slots = table
            .columns
            .iter()
            .map(|c| ColumnSlot {
                name: c.name.clone(),
                source_type: c.source_type(),
                warned: false,
            })
            .collect();

        Self {
            table: table.name.clone(),
            slots,
            strict,
            null_downgrades: 0,
        }
    }

    /// Resolve every value of one row, in column order.
    pub fn encode_row<'a>(&mut self, row: &'a [SqlValue<'_>]) -> Result<Vec<TypedValue<'a>>> {
        if row.len() != self.slots.len() {
            return Err(MigrateError::transcode(
                &self.table,
                "*",
                format!(
                    "row has {} values but the table has {} columns",
                    row.len(),
                    self.slots.len()
                ),
            ));
        }

        let mut values = Vec::with_capacity(row.len());
        for (value, slot) in row.iter().zip(self.slots.iter_mut()) {
            match TypedValue::resolve(value, slot.source_type) {
                Ok(typed) => values.push(typed),
                Err(reason) if self.strict => {
                    return Err(MigrateError::transcode(
                        &self.table,
                        &slot.name,
                        reason.to_string(),
                    ));
                }
                Err(reason) => {
                    if !slot.warned {
                        warn!(
                            "Table {}: column {} value written as NULL ({}); further occurrences are counted only",
                            self.table, slot.name, reason
                        );
                        slot.warned = true;
                    }
                    self.null_downgrades += 1;
                    values.push(TypedValue::Null);
                }
            }
        }
        Ok(values)
    }

    /// Values written as NULL because they had no representation.
    pub fn null_downgrades(&self) -> u64 {
        self.null_downgrades
    }

    pub fn column_count(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn lit(value: SqlValue<'_>, declared: &str) -> String {
        encode(&value, declared).to_string()
    }

    #[test]
    fn test_null_and_integers() {
        assert_eq!(lit(SqlValue::Null, "int"), "NULL");
        assert_eq!(lit(SqlValue::Int(42), "int"), "42");
        assert_eq!(lit(SqlValue::Int(-7), "bigint"), "-7");
        assert_eq!(lit(SqlValue::Int(1), "bit"), "1");
    }

    #[test]
    fn test_floats_use_native_text() {
        assert_eq!(lit(SqlValue::F64(100.356), "float"), "100.356");
        assert_eq!(lit(SqlValue::F64(-100.356), "float"), "-100.356");
        assert_eq!(lit(SqlValue::F32(1.5), "real"), "1.5");
        assert_eq!(lit(SqlValue::F64(3.0), "float"), "3");
    }

    #[test]
    fn test_non_finite_float_is_null() {
        assert_eq!(lit(SqlValue::F64(f64::NAN), "float"), "NULL");
        assert_eq!(lit(SqlValue::F32(f32::INFINITY), "real"), "NULL");
    }

    #[test]
    fn test_temporal_has_six_fraction_digits() {
        let dt = NaiveDate::from_ymd_opt(2017, 6, 4)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(lit(SqlValue::DateTime(dt), "date"), "'2017-06-04 00:00:00.000000'");

        let dt = NaiveDate::from_ymd_opt(2023, 12, 31)
            .unwrap()
            .and_hms_micro_opt(23, 59, 58, 120)
            .unwrap();
        assert_eq!(
            lit(SqlValue::DateTime(dt), "datetime2"),
            "'2023-12-31 23:59:58.000120'"
        );
    }

    #[test]
    fn test_text_escaping() {
        assert_eq!(
            lit(SqlValue::from("Description with 'quotes' \\ end"), "nvarchar"),
            "'Description with \\'quotes\\' \\\\ end'"
        );
    }

    #[test]
    fn test_text_backslash_before_quote() {
        // \' in the source must become \\\' (escaped backslash, escaped quote).
        assert_eq!(lit(SqlValue::from("a\\'b"), "varchar"), "'a\\\\\\'b'");
    }

    #[test]
    fn test_text_trailing_spaces_trimmed() {
        assert_eq!(lit(SqlValue::from("Invoice   "), "nchar"), "'Invoice'");
        assert_eq!(lit(SqlValue::from("  lead"), "nchar"), "'  lead'");
        assert_eq!(lit(SqlValue::from("    "), "nchar"), "''");
        assert_eq!(lit(SqlValue::from("tab\t"), "nchar"), "'tab\t'");
    }

    #[test]
    fn test_guid_wire_order() {
        let wire = vec![
            0xFF, 0x19, 0x96, 0x6F, 0x86, 0x8B, 0x11, 0xD0, 0xB4, 0x2D, 0x00, 0xC0, 0x4F, 0xC9,
            0x64, 0xFF,
        ];
        assert_eq!(
            lit(SqlValue::from(wire), "uniqueidentifier"),
            "'6f9619ff-8b86-d011-b42d-00c04fc964ff'"
        );
    }

    #[test]
    fn test_guid_wrong_length_is_null() {
        assert_eq!(lit(SqlValue::from(vec![1u8, 2, 3]), "uniqueidentifier"), "NULL");
    }

    #[test]
    fn test_varbinary_hex() {
        assert_eq!(lit(SqlValue::from(vec![0xDEu8, 0xAD, 0x01]), "varbinary"), "0xdead01");
        assert_eq!(lit(SqlValue::from(Vec::<u8>::new()), "varbinary"), "0x00");
        assert_eq!(lit(SqlValue::from(vec![0u8; 2]), "binary"), "0x0000");
    }

    #[test]
    fn test_decimal_is_digit_exact() {
        assert_eq!(lit(SqlValue::from(b"100.356".to_vec()), "decimal"), "100.356");
        assert_eq!(lit(SqlValue::from(b"-100.356".to_vec()), "numeric"), "-100.356");
        assert_eq!(
            lit(SqlValue::from(b"12345678901234567890.123456789".to_vec()), "decimal"),
            "12345678901234567890.123456789"
        );
    }

    #[test]
    fn test_money_digits_stay_exact() {
        assert_eq!(
            lit(SqlValue::from(b"922337203685477.5807".to_vec()), "money"),
            "922337203685477.5807"
        );
        assert_eq!(lit(SqlValue::from(b"-0.0100".to_vec()), "smallmoney"), "-0.0100");
    }

    #[test]
    fn test_decimal_rejects_malformed_digits() {
        assert_eq!(lit(SqlValue::from(b"1.2.3".to_vec()), "decimal"), "NULL");
        assert_eq!(lit(SqlValue::from(b"1e5".to_vec()), "decimal"), "NULL");
        assert_eq!(lit(SqlValue::from(b"-".to_vec()), "decimal"), "NULL");
        assert_eq!(lit(SqlValue::from(b"5.".to_vec()), "decimal"), "NULL");
        assert_eq!(lit(SqlValue::from(b"1; DROP".to_vec()), "decimal"), "NULL");
    }

    #[test]
    fn test_bytes_under_other_type_is_null() {
        assert_eq!(lit(SqlValue::from(vec![1u8]), "nvarchar"), "NULL");
    }

    #[test]
    fn test_unsupported_kind_is_null() {
        assert_eq!(lit(SqlValue::Unsupported("xml"), "xml"), "NULL");
    }

    fn mixed_table() -> Table {
        Table::new("dbo", "Mixed")
            .with_column("Id", "int")
            .with_column("Payload", "xml")
            .with_column("Amount", "decimal")
    }

    #[test]
    fn test_row_transcoder_counts_downgrades() {
        let table = mixed_table();
        let mut transcoder = RowTranscoder::new(&table, false);

        for i in 0..3 {
            let row = vec![
                SqlValue::Int(i),
                SqlValue::Unsupported("xml"),
                SqlValue::from(b"9.50".to_vec()),
            ];
            let values = transcoder.encode_row(&row).unwrap();
            assert_eq!(values[0], TypedValue::Integer(i));
            assert!(values[1].is_null());
            assert_eq!(values[2], TypedValue::Decimal(Cow::Borrowed("9.50")));
        }

        assert_eq!(transcoder.null_downgrades(), 3);
        assert_eq!(transcoder.column_count(), 3);
    }

    #[test]
    fn test_row_transcoder_strict_mode_errors() {
        let table = mixed_table();
        let mut transcoder = RowTranscoder::new(&table, true);
        let row = vec![
            SqlValue::Int(1),
            SqlValue::Unsupported("xml"),
            SqlValue::Null,
        ];

        let err = transcoder.encode_row(&row).unwrap_err();
        match err {
            MigrateError::RowTranscode { table, column, .. } => {
                assert_eq!(table, "Mixed");
                assert_eq!(column, "Payload");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(transcoder.null_downgrades(), 0);
    }

    #[test]
    fn test_row_transcoder_rejects_width_mismatch() {
        let table = mixed_table();
        let mut transcoder = RowTranscoder::new(&table, false);
        let row = vec![SqlValue::Int(1)];
        assert!(matches!(
            transcoder.encode_row(&row),
            Err(MigrateError::RowTranscode { .. })
        ));
    }

    #[test]
    fn test_literal_display() {
        assert_eq!(Literal::Null.to_string(), "NULL");
        assert!(Literal::Null.is_null());
        assert_eq!(Literal::Value("'x'".into()).as_sql(), "'x'");
    }
}
