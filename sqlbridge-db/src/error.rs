// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Error types for database operations.

use rusqlite::ffi;
use thiserror::Error;

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during database operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Prepare, bind or step failure reported by SQLite
    #[error("{message} (code {code})")]
    Sql { code: i32, message: String },

    /// Failed to open database with context
    #[error("Failed to open database at '{path}': {message} (code {code})")]
    Open {
        path: String,
        code: i32,
        message: String,
    },

    /// More parameters than the statement has placeholders
    #[error("bind index {index} out of range (statement has {count} placeholders)")]
    Bind { index: usize, count: usize },

    /// Operation on a connection that was already closed
    #[error("database is closed")]
    Closed,
}

impl Error {
    /// SQLite (extended) result code carried by this error.
    pub fn code(&self) -> i32 {
        match self {
            Error::Sql { code, .. } | Error::Open { code, .. } => *code,
            Error::Bind { .. } => ffi::SQLITE_RANGE,
            Error::Closed => ffi::SQLITE_MISUSE,
        }
    }

    pub(crate) fn open(path: &str, source: rusqlite::Error) -> Self {
        let (code, message) = engine_parts(&source);
        Error::Open {
            path: path.to_owned(),
            code,
            message,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(source: rusqlite::Error) -> Self {
        let (code, message) = engine_parts(&source);
        Error::Sql { code, message }
    }
}

/// Split a rusqlite error into SQLite's code and message text.
///
/// Errors raised by rusqlite itself rather than the engine map to
/// `SQLITE_ERROR`.
fn engine_parts(source: &rusqlite::Error) -> (i32, String) {
    match source {
        rusqlite::Error::SqliteFailure(err, Some(message)) => (err.extended_code, message.clone()),
        rusqlite::Error::SqliteFailure(err, None) => (err.extended_code, err.to_string()),
        other => (ffi::SQLITE_ERROR, other.to_string()),
    }
}
