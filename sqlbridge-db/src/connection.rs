// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Database connection management.

use std::path::Path;

use rusqlite::{Connection, OpenFlags};
use tracing::debug;

use crate::error::{Error, Result};

/// Path sentinel selecting an anonymous in-memory database.
pub const MEMORY_PATH: &str = ":memory:";

/// Statements kept per connection unless configured otherwise.
const DEFAULT_STATEMENT_CACHE_CAPACITY: usize = 64;

/// Whether `path` denotes an in-memory database.
pub fn is_memory_path(path: &str) -> bool {
    path.is_empty() || path == MEMORY_PATH
}

/// Database open mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Read-only access; the file must already exist
    ReadOnly,
    /// Read-write access, creating the file if needed
    ReadWrite,
}

/// How much SQL activity a connection reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    #[default]
    None,
    /// Log every statement
    Sql,
    /// Log every statement with its parameters
    Verbose,
}

impl LogLevel {
    pub fn from_i64(level: i64) -> Self {
        match level {
            i64::MIN..=0 => LogLevel::None,
            1 => LogLevel::Sql,
            _ => LogLevel::Verbose,
        }
    }

    pub fn as_i64(self) -> i64 {
        match self {
            LogLevel::None => 0,
            LogLevel::Sql => 1,
            LogLevel::Verbose => 2,
        }
    }
}

/// One SQLite connection and the statements compiled on it.
///
/// Prepared statements are cached by their exact SQL text and owned by the
/// connection; [`Database::close`] finalizes them before closing.
pub struct Database {
    conn: Option<Connection>,
    path: String,
    mode: OpenMode,
    pub(crate) log_level: LogLevel,
}

impl Database {
    /// Open (or create) the database at `path`.
    ///
    /// An empty path or [`MEMORY_PATH`] opens a fresh in-memory database.
    /// [`OpenMode::ReadOnly`] never creates a missing file.
    pub fn open(path: &str, mode: OpenMode) -> Result<Self> {
        let access = match mode {
            OpenMode::ReadOnly => OpenFlags::SQLITE_OPEN_READ_ONLY,
            OpenMode::ReadWrite => OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        };
        let flags = access | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = if is_memory_path(path) {
            Connection::open_in_memory_with_flags(flags)
        } else {
            Connection::open_with_flags(Path::new(path), flags)
        }
        .map_err(|e| Error::open(path, e))?;
        conn.set_prepared_statement_cache_capacity(DEFAULT_STATEMENT_CACHE_CAPACITY);

        debug!("Opened database at '{}' ({:?})", path, mode);
        Ok(Self {
            conn: Some(conn),
            path: path.to_owned(),
            mode,
            log_level: LogLevel::None,
        })
    }

    /// Path the database was opened with.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    pub fn set_log_level(&mut self, level: LogLevel) {
        self.log_level = level;
    }

    /// Change how many compiled statements are kept around.
    pub fn set_statement_cache_capacity(&self, capacity: usize) -> Result<()> {
        self.connection()?
            .set_prepared_statement_cache_capacity(capacity);
        Ok(())
    }

    /// Finalize every cached statement, then close the connection.
    ///
    /// Closing an already closed database is a no-op.
    pub fn close(&mut self) -> Result<()> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };
        conn.flush_prepared_statement_cache();
        conn.close().map_err(|(_, e)| Error::from(e))?;
        debug!("Closed database at '{}'", self.path);
        Ok(())
    }

    pub(crate) fn connection(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or(Error::Closed)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("open", &self.is_open())
            .finish()
    }
}
