//! Raw column values as produced by a source row cursor.
//!
//! A [`SqlValue`] carries the driver's runtime representation of one column,
//! before the declared column type is consulted. Byte payloads stay opaque
//! here; the transcoder decides whether they are GUIDs, binary data or exact
//! decimal digits.

use std::borrow::Cow;

use chrono::NaiveDateTime;

/// One raw column value.
///
/// Uses `Cow` for string and byte data so a cursor can lend buffers without
/// copying. Use [`SqlValue::into_owned`] to detach from the source buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue<'a> {
    /// SQL NULL.
    Null,

    /// Any integer type, widened to 64 bits (bit, tinyint, smallint, int, bigint).
    Int(i64),

    /// 32-bit floating point (real).
    F32(f32),

    /// 64-bit floating point (float, money).
    F64(f64),

    /// Date and/or time, normalized to a timestamp without zone.
    DateTime(NaiveDateTime),

    /// Character data.
    Text(Cow<'a, str>),

    /// Opaque byte sequence (GUID wire bytes, binary data, decimal digits).
    Bytes(Cow<'a, [u8]>),

    /// A runtime kind the cursor has no representation for.
    Unsupported(&'static str),
}

impl<'a> SqlValue<'a> {
    /// Convert to a fully owned value with `'static` lifetime.
    #[must_use]
    pub fn into_owned(self) -> SqlValue<'static> {
        match self {
            SqlValue::Null => SqlValue::Null,
            SqlValue::Int(v) => SqlValue::Int(v),
            SqlValue::F32(v) => SqlValue::F32(v),
            SqlValue::F64(v) => SqlValue::F64(v),
            SqlValue::DateTime(v) => SqlValue::DateTime(v),
            SqlValue::Text(v) => SqlValue::Text(Cow::Owned(v.into_owned())),
            SqlValue::Bytes(v) => SqlValue::Bytes(Cow::Owned(v.into_owned())),
            SqlValue::Unsupported(kind) => SqlValue::Unsupported(kind),
        }
    }

    /// Check if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Short name of the runtime kind, for diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Int(_) => "integer",
            SqlValue::F32(_) | SqlValue::F64(_) => "float",
            SqlValue::DateTime(_) => "temporal",
            SqlValue::Text(_) => "text",
            SqlValue::Bytes(_) => "bytes",
            SqlValue::Unsupported(kind) => kind,
        }
    }
}

impl From<i64> for SqlValue<'static> {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<i32> for SqlValue<'static> {
    fn from(v: i32) -> Self {
        SqlValue::Int(i64::from(v))
    }
}

impl From<f32> for SqlValue<'static> {
    fn from(v: f32) -> Self {
        SqlValue::F32(v)
    }
}

impl From<f64> for SqlValue<'static> {
    fn from(v: f64) -> Self {
        SqlValue::F64(v)
    }
}

impl From<String> for SqlValue<'static> {
    fn from(v: String) -> Self {
        SqlValue::Text(Cow::Owned(v))
    }
}

impl<'a> From<&'a str> for SqlValue<'a> {
    fn from(v: &'a str) -> Self {
        SqlValue::Text(Cow::Borrowed(v))
    }
}

impl From<Vec<u8>> for SqlValue<'static> {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Bytes(Cow::Owned(v))
    }
}

impl<'a> From<&'a [u8]> for SqlValue<'a> {
    fn from(v: &'a [u8]) -> Self {
        SqlValue::Bytes(Cow::Borrowed(v))
    }
}

impl From<NaiveDateTime> for SqlValue<'static> {
    fn from(v: NaiveDateTime) -> Self {
        SqlValue::DateTime(v)
    }
}

impl<'a, T> From<Option<T>> for SqlValue<'a>
where
    T: Into<SqlValue<'a>>,
{
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}

/// One row as read from the source, in column ordinal order.
pub type Row = Vec<SqlValue<'static>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_value_into_owned() {
        let borrowed: SqlValue<'_> = SqlValue::Text(Cow::Borrowed("hello"));
        let owned: SqlValue<'static> = borrowed.into_owned();
        assert_eq!(owned, SqlValue::Text(Cow::Owned("hello".to_string())));
    }

    #[test]
    fn test_sql_value_is_null() {
        assert!(SqlValue::Null.is_null());
        assert!(!SqlValue::Int(42).is_null());
    }

    #[test]
    fn test_from_option() {
        let v: SqlValue<'static> = Option::<i32>::None.into();
        assert!(v.is_null());

        let v: SqlValue<'static> = Some(7i32).into();
        assert_eq!(v, SqlValue::Int(7));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(SqlValue::from(vec![1u8]).kind(), "bytes");
        assert_eq!(SqlValue::F32(1.5).kind(), "float");
        assert_eq!(SqlValue::Unsupported("xml").kind(), "xml");
    }
}
