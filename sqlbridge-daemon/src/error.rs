// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

use sqlbridge_protocol::names::{error_code, error_message, param};
use sqlbridge_protocol::{MethodError, MethodResponse, ProtocolError, Value};
use thiserror::Error;

/// Errors that stop the daemon or one of its connections.
#[derive(Error, Debug)]
pub enum DaemonError {
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Framing error: {0}")]
    Codec(#[from] tokio_util::codec::LinesCodecError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Connection closed by peer")]
    ConnectionClosed,
}

impl DaemonError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }
}

/// Helper trait for adding context to IO errors
pub trait IoContext<T> {
    fn io_context<F>(self, f: F) -> Result<T, DaemonError>
    where
        F: FnOnce() -> String;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn io_context<F>(self, f: F) -> Result<T, DaemonError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| DaemonError::io(f(), e))
    }
}

/// SQL text and arguments attached to a failed statement.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlDetails {
    pub sql: String,
    pub arguments: Vec<Value>,
}

impl SqlDetails {
    pub fn to_value(&self) -> Value {
        [
            (param::SQL, Value::from(self.sql.as_str())),
            (param::SQL_ARGUMENTS, Value::List(self.arguments.clone())),
        ]
        .into_iter()
        .collect()
    }
}

/// Why a single dispatched operation failed.
///
/// None of these are fatal; each one becomes an error response and leaves
/// the registry and other handles untouched.
#[derive(Error, Debug)]
pub enum OperationError {
    #[error("{message}")]
    PermissionDenied { message: String },

    #[error("{} {id}", error_message::DATABASE_CLOSED)]
    UnknownHandle { id: i64 },

    #[error("{} {path}", error_message::OPEN_FAILED)]
    OpenFailure {
        path: String,
        #[source]
        source: sqlbridge_db::Error,
    },

    #[error("{source}")]
    Sql {
        #[source]
        source: sqlbridge_db::Error,
        details: Option<SqlDetails>,
    },

    #[error("operation '{0}' is not implemented")]
    Unsupported(String),

    #[error(transparent)]
    Argument(#[from] ProtocolError),

    #[error("{0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl OperationError {
    /// A SQL failure that reports the offending statement.
    pub fn sql(source: sqlbridge_db::Error, details: SqlDetails) -> Self {
        Self::Sql {
            source,
            details: Some(details),
        }
    }

    /// Attach `details` to a SQL failure that has none yet.
    pub fn with_sql_details(self, details: SqlDetails) -> Self {
        match self {
            Self::Sql {
                source,
                details: None,
            } => Self::sql(source, details),
            other => other,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::PermissionDenied { .. } => error_code::PERMISSION_NOT_ALLOWED,
            Self::Argument(_) => error_code::INVALID_ARGUMENT,
            Self::Storage(_) => error_code::STORAGE,
            Self::UnknownHandle { .. }
            | Self::OpenFailure { .. }
            | Self::Sql { .. }
            | Self::Unsupported(_)
            | Self::Internal(_) => error_code::DATABASE,
        }
    }

    pub fn into_method_error(self) -> MethodError {
        let err = MethodError::new(self.code(), self.to_string());
        match self {
            Self::Sql {
                details: Some(details),
                ..
            } => err.with_details(details.to_value()),
            _ => err,
        }
    }
}

impl From<sqlbridge_db::Error> for OperationError {
    fn from(source: sqlbridge_db::Error) -> Self {
        Self::Sql {
            source,
            details: None,
        }
    }
}

impl From<OperationError> for MethodResponse {
    fn from(err: OperationError) -> Self {
        match err {
            OperationError::Unsupported(_) => MethodResponse::NotImplemented,
            other => MethodResponse::Error(other.into_method_error()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_handle_message() {
        let err = OperationError::UnknownHandle { id: 7 }.into_method_error();
        assert_eq!(err.code, "database_error");
        assert_eq!(err.message, "database_closed 7");
        assert_eq!(err.details, None);
    }

    #[test]
    fn test_open_failure_hides_engine_text() {
        let source = sqlbridge_db::Error::Open {
            path: "/nope/db".into(),
            code: 14,
            message: "unable to open database file".into(),
        };
        let err = OperationError::OpenFailure {
            path: "/nope/db".into(),
            source,
        }
        .into_method_error();
        assert_eq!(err.message, "open_failed /nope/db");
    }

    #[test]
    fn test_sql_error_details() {
        let err = OperationError::sql(
            sqlbridge_db::Error::Sql {
                code: 1,
                message: "no such table: t".into(),
            },
            SqlDetails {
                sql: "SELECT * FROM t".into(),
                arguments: vec![Value::Int(1)],
            },
        )
        .into_method_error();
        assert_eq!(err.code, "database_error");
        assert_eq!(err.message, "no such table: t (code 1)");
        let details = err.details.unwrap();
        assert_eq!(
            details.get("sql").and_then(Value::as_str),
            Some("SELECT * FROM t")
        );
        assert_eq!(
            details.get("arguments").and_then(Value::as_list),
            Some(&[Value::Int(1)][..])
        );
    }

    #[test]
    fn test_unsupported_is_not_implemented() {
        let response: MethodResponse = OperationError::Unsupported("vacuum".into()).into();
        assert_eq!(response, MethodResponse::NotImplemented);
    }
}
