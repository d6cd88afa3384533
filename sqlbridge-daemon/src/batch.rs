// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Batch execution.
//!
//! Items run in order on one connection with no implicit transaction. Each
//! item produces either `{result: <value>}` or
//! `{error: {code, message, data: {sql, arguments}}}`.

use sqlbridge_db::Database;
use sqlbridge_protocol::names::{method, param};
use sqlbridge_protocol::{Arguments, MethodResponse, Value};
use tracing::debug;

use crate::error::{OperationError, SqlDetails};
use crate::marshal::ResultShape;
use crate::operations::SqlCommand;

/// Batch-wide flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    /// Record failures per item instead of aborting on the first one.
    pub continue_on_error: bool,
    /// Drop per-item results; the batch answers with an empty success.
    pub no_result: bool,
    pub shape: ResultShape,
    pub strict_arguments: bool,
}

#[derive(Debug)]
pub enum BatchOutcome {
    /// Every item ran. `None` when results were suppressed.
    Completed(Option<Vec<Value>>),
    /// An item failed and `continue_on_error` was off. Earlier results are
    /// discarded but their effects on the database remain.
    Aborted(OperationError),
    /// An item named an unknown method; later items did not run.
    NotImplemented(String),
}

impl From<BatchOutcome> for MethodResponse {
    fn from(outcome: BatchOutcome) -> Self {
        match outcome {
            BatchOutcome::Completed(Some(results)) => MethodResponse::success(results),
            BatchOutcome::Completed(None) => MethodResponse::empty(),
            BatchOutcome::Aborted(err) => err.into(),
            BatchOutcome::NotImplemented(_) => MethodResponse::NotImplemented,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemKind {
    Execute,
    Insert,
    Query,
    Update,
}

impl ItemKind {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            method::EXECUTE => Some(ItemKind::Execute),
            method::INSERT => Some(ItemKind::Insert),
            method::QUERY => Some(ItemKind::Query),
            method::UPDATE => Some(ItemKind::Update),
            _ => None,
        }
    }
}

pub fn run_batch(db: &Database, operations: &[Value], options: BatchOptions) -> BatchOutcome {
    let mut results = Vec::with_capacity(if options.no_result { 0 } else { operations.len() });

    for (index, item) in operations.iter().enumerate() {
        let outcome = Arguments::from_value(item, options.strict_arguments)
            .map_err(|e| (OperationError::from(e), SqlDetails::from_item(item)))
            .and_then(|args| {
                let name = args
                    .text(param::METHOD)
                    .map_err(|e| (OperationError::from(e), SqlDetails::from_item(item)))?;
                let Some(kind) = ItemKind::from_name(&name) else {
                    return Err((OperationError::Unsupported(name), SqlDetails::from_item(item)));
                };
                let command = SqlCommand::from_arguments(&args)
                    .map_err(|e| (e, SqlDetails::from_item(item)))?;
                run_item(db, kind, &command, options).map_err(|e| (e, command.details()))
            });

        match outcome {
            Ok(result) => {
                if !options.no_result {
                    results.push(success_entry(result));
                }
            }
            Err((OperationError::Unsupported(name), _)) => {
                debug!("batch item {index} has unknown method '{name}'");
                return BatchOutcome::NotImplemented(name);
            }
            Err((err, details)) if !options.continue_on_error => {
                debug!("batch aborted at item {index}: {err}");
                return BatchOutcome::Aborted(err.with_sql_details(details));
            }
            Err((err, details)) => {
                debug!("batch item {index} failed: {err}");
                if !options.no_result {
                    results.push(error_entry(&err, &details));
                }
            }
        }
    }

    if options.no_result {
        BatchOutcome::Completed(None)
    } else {
        BatchOutcome::Completed(Some(results))
    }
}

fn run_item(
    db: &Database,
    kind: ItemKind,
    command: &SqlCommand,
    options: BatchOptions,
) -> Result<Value, OperationError> {
    match kind {
        ItemKind::Execute => command.execute(db),
        ItemKind::Insert => command.insert(db, options.no_result),
        ItemKind::Query => command.query(db, options.shape),
        ItemKind::Update => command.update(db, options.no_result),
    }
}

fn success_entry(result: Value) -> Value {
    [(param::RESULT, result)].into_iter().collect()
}

fn error_entry(err: &OperationError, details: &SqlDetails) -> Value {
    let error: Value = [
        (param::ERROR_CODE, Value::from(err.code())),
        (param::ERROR_MESSAGE, Value::from(err.to_string())),
        (param::ERROR_DATA, details.to_value()),
    ]
    .into_iter()
    .collect();
    [(param::ERROR, error)].into_iter().collect()
}

impl SqlDetails {
    /// Best-effort details for an item whose arguments could not be read.
    fn from_item(item: &Value) -> Self {
        SqlDetails {
            sql: item
                .get(param::SQL)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned(),
            arguments: item
                .get(param::SQL_ARGUMENTS)
                .and_then(Value::as_list)
                .map(<[Value]>::to_vec)
                .unwrap_or_default(),
        }
    }
}
