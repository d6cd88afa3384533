// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Typed access to a method call's argument map.
//!
//! Hosts are not always careful about argument types. By default a missing
//! or mistyped argument falls back to its zero value (`0`, `""`, `false`,
//! empty list) and a warning is logged. In strict mode the same situations
//! are reported as [`ProtocolError`]s instead.

use tracing::warn;

use crate::error::{ProtocolError, Result};
use crate::value::{Map, Value};

static EMPTY: Map = Map::new();

/// Borrowed view over the arguments of one call.
#[derive(Debug, Clone, Copy)]
pub struct Arguments<'a> {
    map: &'a Map,
    strict: bool,
}

impl<'a> Arguments<'a> {
    pub fn new(map: &'a Map, strict: bool) -> Self {
        Self { map, strict }
    }

    /// View `value` as arguments. `Null` is treated as an empty map.
    pub fn from_value(value: &'a Value, strict: bool) -> Result<Self> {
        match value {
            Value::Map(map) => Ok(Self::new(map, strict)),
            Value::Null => Ok(Self::new(&EMPTY, strict)),
            other if strict => Err(ProtocolError::InvalidArguments {
                actual: other.type_name(),
            }),
            other => {
                warn!("ignoring arguments of type {}", other.type_name());
                Ok(Self::new(&EMPTY, strict))
            }
        }
    }

    /// Raw access, without any type checking.
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    /// Required integer; defaults to 0.
    pub fn int(&self, key: &str) -> Result<i64> {
        Ok(self
            .extract(key, true, "int", Value::as_i64)?
            .unwrap_or_default())
    }

    pub fn optional_int(&self, key: &str) -> Result<Option<i64>> {
        self.extract(key, false, "int", Value::as_i64)
    }

    /// Required string; defaults to the empty string.
    pub fn text(&self, key: &str) -> Result<String> {
        Ok(self
            .extract(key, true, "text", |v| v.as_str().map(str::to_owned))?
            .unwrap_or_default())
    }

    pub fn optional_text(&self, key: &str) -> Result<Option<String>> {
        self.extract(key, false, "text", |v| v.as_str().map(str::to_owned))
    }

    /// Optional flag; defaults to `false`.
    pub fn flag(&self, key: &str) -> Result<bool> {
        Ok(self.optional_flag(key)?.unwrap_or(false))
    }

    pub fn optional_flag(&self, key: &str) -> Result<Option<bool>> {
        self.extract(key, false, "bool", Value::as_bool)
    }

    /// Optional list; defaults to the empty list.
    pub fn list(&self, key: &str) -> Result<&'a [Value]> {
        Ok(self
            .extract(key, false, "list", Value::as_list)?
            .unwrap_or_default())
    }

    /// Required list; defaults to the empty list.
    pub fn required_list(&self, key: &str) -> Result<&'a [Value]> {
        Ok(self
            .extract(key, true, "list", Value::as_list)?
            .unwrap_or_default())
    }

    fn extract<T>(
        &self,
        key: &str,
        required: bool,
        expected: &'static str,
        pick: impl FnOnce(&'a Value) -> Option<T>,
    ) -> Result<Option<T>> {
        let Some(value) = self.get(key) else {
            if required {
                self.missing(key)?;
            }
            return Ok(None);
        };
        match pick(value) {
            Some(v) => Ok(Some(v)),
            None if self.strict => Err(ProtocolError::InvalidArgument {
                key: key.to_owned(),
                expected,
                actual: value.type_name(),
            }),
            None => {
                warn!(
                    "argument '{key}' should be {expected} but is {}, using default",
                    value.type_name()
                );
                Ok(None)
            }
        }
    }

    fn missing(&self, key: &str) -> Result<()> {
        if self.strict {
            return Err(ProtocolError::MissingArgument {
                key: key.to_owned(),
            });
        }
        warn!("argument '{key}' is missing, using default");
        Ok(())
    }
}
