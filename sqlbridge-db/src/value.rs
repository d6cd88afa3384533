// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Scalar values exchanged with SQLite.

use rusqlite::ToSql;
use rusqlite::types::{ToSqlOutput, ValueRef};

/// One SQL scalar, used both for bound parameters and result cells.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Integer(i64),
    Text(String),
    Real(f64),
    Blob(Vec<u8>),
    Null,
}

impl ScalarValue {
    /// Convert a column value as SQLite reports it.
    ///
    /// SQLite does not validate the encoding of TEXT values, so invalid
    /// UTF-8 is replaced rather than rejected.
    pub fn from_column(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => ScalarValue::Null,
            ValueRef::Integer(i) => ScalarValue::Integer(i),
            ValueRef::Real(f) => ScalarValue::Real(f),
            ValueRef::Text(bytes) => ScalarValue::Text(String::from_utf8_lossy(bytes).into_owned()),
            ValueRef::Blob(bytes) => ScalarValue::Blob(bytes.to_vec()),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ScalarValue::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl ToSql for ScalarValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = match self {
            ScalarValue::Integer(i) => ValueRef::Integer(*i),
            ScalarValue::Text(s) => ValueRef::Text(s.as_bytes()),
            ScalarValue::Real(f) => ValueRef::Real(*f),
            ScalarValue::Blob(b) => ValueRef::Blob(b),
            ScalarValue::Null => ValueRef::Null,
        };
        Ok(ToSqlOutput::Borrowed(value))
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Integer(value)
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Real(value)
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::Text(value)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Text(value.to_owned())
    }
}

impl From<Vec<u8>> for ScalarValue {
    fn from(value: Vec<u8>) -> Self {
        ScalarValue::Blob(value)
    }
}

impl<T: Into<ScalarValue>> From<Option<T>> for ScalarValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(ScalarValue::Null, Into::into)
    }
}

/// One result row, aligned positionally with [`ResultSet::columns`].
pub type Row = Vec<ScalarValue>;

/// Column names and rows returned by a query.
///
/// Column names are only captured when at least one row was produced, so an
/// empty result has no columns either.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl ResultSet {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First cell of the first row, if any.
    pub fn first_value(&self) -> Option<&ScalarValue> {
        self.rows.first().and_then(|row| row.first())
    }

    /// Iterate rows as `(column, value)` pairs.
    pub fn named_rows(&self) -> impl Iterator<Item = Vec<(&str, &ScalarValue)>> + '_ {
        self.rows.iter().map(|row| {
            self.columns
                .iter()
                .map(String::as_str)
                .zip(row.iter())
                .collect()
        })
    }
}
