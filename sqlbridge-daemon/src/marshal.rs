// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Conversion between database scalars and wire values.

use sqlbridge_db::{ResultSet, ScalarValue};
use sqlbridge_protocol::names::param;
use sqlbridge_protocol::{Map, ProtocolError, Value};

/// How query results are encoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResultShape {
    /// `{columns: [...], rows: [[...]]}`
    #[default]
    ColumnsAndRows,
    /// `[{column: value, ...}, ...]`
    MapList,
}

impl ResultShape {
    pub fn from_map_list(map_list: bool) -> Self {
        if map_list {
            ResultShape::MapList
        } else {
            ResultShape::ColumnsAndRows
        }
    }
}

pub fn scalar_to_wire(value: ScalarValue) -> Value {
    match value {
        ScalarValue::Integer(i) => Value::Int(i),
        ScalarValue::Text(s) => Value::Text(s),
        ScalarValue::Real(f) => Value::Real(f),
        ScalarValue::Blob(b) => Value::Bytes(b),
        ScalarValue::Null => Value::Null,
    }
}

/// Convert one SQL argument. Booleans bind as 0/1; lists and maps have no
/// SQL counterpart and are rejected.
pub fn wire_to_scalar(key: &str, value: &Value) -> Result<ScalarValue, ProtocolError> {
    Ok(match value {
        Value::Null => ScalarValue::Null,
        Value::Bool(b) => ScalarValue::Integer(i64::from(*b)),
        Value::Int(i) => ScalarValue::Integer(*i),
        Value::Real(f) => ScalarValue::Real(*f),
        Value::Text(s) => ScalarValue::Text(s.clone()),
        Value::Bytes(b) => ScalarValue::Blob(b.clone()),
        Value::List(_) | Value::Map(_) => {
            return Err(ProtocolError::InvalidArgument {
                key: key.to_owned(),
                expected: "a SQL scalar",
                actual: value.type_name(),
            });
        }
    })
}

/// Convert a positional SQL argument list.
pub fn parameters(arguments: &[Value]) -> Result<Vec<ScalarValue>, ProtocolError> {
    arguments
        .iter()
        .enumerate()
        .map(|(index, value)| wire_to_scalar(&format!("{}[{index}]", param::SQL_ARGUMENTS), value))
        .collect()
}

/// Encode a result set. An empty result encodes as an empty map or list.
pub fn encode_result_set(result: ResultSet, shape: ResultShape) -> Value {
    match shape {
        ResultShape::MapList => Value::List(
            result
                .named_rows()
                .map(|row| {
                    let map: Map = row
                        .into_iter()
                        .map(|(column, value)| (column.to_owned(), scalar_to_wire(value.clone())))
                        .collect();
                    Value::Map(map)
                })
                .collect(),
        ),
        ResultShape::ColumnsAndRows => {
            let ResultSet { columns, rows } = result;
            if rows.is_empty() {
                return Value::Map(Map::new());
            }
            let rows = rows
                .into_iter()
                .map(|row| Value::List(row.into_iter().map(scalar_to_wire).collect()))
                .collect();
            let columns = columns.into_iter().map(Value::Text).collect();
            [
                (param::COLUMNS, Value::List(columns)),
                (param::ROWS, Value::List(rows)),
            ]
            .into_iter()
            .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResultSet {
        ResultSet {
            columns: vec!["a".into(), "b".into()],
            rows: vec![
                vec![ScalarValue::Integer(1), ScalarValue::Text("x".into())],
                vec![ScalarValue::Integer(2), ScalarValue::Null],
            ],
        }
    }

    #[test]
    fn test_columns_and_rows() {
        let value = encode_result_set(sample(), ResultShape::ColumnsAndRows);
        assert_eq!(
            value.get("columns"),
            Some(&Value::List(vec!["a".into(), "b".into()]))
        );
        assert_eq!(
            value.get("rows"),
            Some(&Value::List(vec![
                Value::List(vec![Value::Int(1), "x".into()]),
                Value::List(vec![Value::Int(2), Value::Null]),
            ]))
        );
    }

    #[test]
    fn test_map_list() {
        let value = encode_result_set(sample(), ResultShape::MapList);
        let rows = value.as_list().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("b"), Some(&Value::from("x")));
        assert_eq!(rows[1].get("b"), Some(&Value::Null));
    }

    #[test]
    fn test_empty_results() {
        assert_eq!(
            encode_result_set(ResultSet::default(), ResultShape::ColumnsAndRows),
            Value::Map(Map::new())
        );
        assert_eq!(
            encode_result_set(ResultSet::default(), ResultShape::MapList),
            Value::List(Vec::new())
        );
    }

    #[test]
    fn test_parameters() {
        let params = parameters(&[
            Value::Bool(true),
            Value::Int(5),
            Value::Real(0.5),
            Value::from("s"),
            Value::Bytes(vec![9]),
            Value::Null,
        ])
        .unwrap();
        assert_eq!(
            params,
            vec![
                ScalarValue::Integer(1),
                ScalarValue::Integer(5),
                ScalarValue::Real(0.5),
                ScalarValue::Text("s".into()),
                ScalarValue::Blob(vec![9]),
                ScalarValue::Null,
            ]
        );

        let err = parameters(&[Value::Int(1), Value::List(vec![])]).unwrap_err();
        assert!(err.to_string().contains("arguments[1]"), "got {err}");
    }
}
