// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! The four SQL operations shared by direct calls and batch items.
//!
//! Everything here runs synchronously against a locked [`Database`]; the
//! handler moves it onto a blocking thread.

use sqlbridge_db::{Database, ScalarValue};
use sqlbridge_protocol::names::param;
use sqlbridge_protocol::{Arguments, Value};
use tracing::debug;

use crate::error::{OperationError, SqlDetails};
use crate::marshal::{self, ResultShape};

/// A statement with its positional arguments, as sent by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlCommand {
    pub sql: String,
    /// Arguments as received, echoed back in error details.
    pub arguments: Vec<Value>,
    params: Vec<ScalarValue>,
}

impl SqlCommand {
    pub fn new(sql: impl Into<String>, arguments: Vec<Value>) -> Result<Self, OperationError> {
        let params = marshal::parameters(&arguments)?;
        Ok(Self {
            sql: sql.into(),
            arguments,
            params,
        })
    }

    /// Read `sql` and `arguments` from a call or batch item.
    pub fn from_arguments(args: &Arguments<'_>) -> Result<Self, OperationError> {
        let sql = args.text(param::SQL)?;
        let arguments = args.list(param::SQL_ARGUMENTS)?.to_vec();
        Self::new(sql, arguments)
    }

    pub fn details(&self) -> SqlDetails {
        SqlDetails {
            sql: self.sql.clone(),
            arguments: self.arguments.clone(),
        }
    }

    fn with_details(&self, source: sqlbridge_db::Error) -> OperationError {
        OperationError::sql(source, self.details())
    }

    /// Run the statement, discarding any rows. Errors carry no details.
    pub fn execute(&self, db: &Database) -> Result<Value, OperationError> {
        db.execute(&self.sql, &self.params)?;
        Ok(Value::Null)
    }

    /// Run an INSERT and report the new row id, or null when nothing was
    /// inserted.
    pub fn insert(&self, db: &Database, no_result: bool) -> Result<Value, OperationError> {
        db.execute(&self.sql, &self.params)
            .map_err(|e| self.with_details(e))?;
        if no_result {
            debug!("ignoring insert result, 'noResult' is turned on");
            return Ok(Value::Null);
        }
        let (changes, last_id) = db.insert_changes().map_err(|e| self.with_details(e))?;
        if changes == 0 {
            debug!("no changes (id was {last_id})");
            return Ok(Value::Null);
        }
        Ok(Value::Int(last_id))
    }

    /// Run an UPDATE or DELETE and report the number of affected rows.
    pub fn update(&self, db: &Database, no_result: bool) -> Result<Value, OperationError> {
        db.execute(&self.sql, &self.params)
            .map_err(|e| self.with_details(e))?;
        if no_result {
            debug!("ignoring update result, 'noResult' is turned on");
            return Ok(Value::Null);
        }
        let changes = db.changes().map_err(|e| self.with_details(e))?;
        Ok(Value::Int(changes))
    }

    pub fn query(&self, db: &Database, shape: ResultShape) -> Result<Value, OperationError> {
        let result = db
            .query(&self.sql, &self.params)
            .map_err(|e| self.with_details(e))?;
        Ok(marshal::encode_result_set(result, shape))
    }
}
