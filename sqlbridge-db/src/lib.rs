// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! SQLite connection wrapper for the sqlbridge daemon.
//!
//! This crate owns a single native SQLite connection together with its
//! prepared statement cache and exposes the two primitives everything else
//! is built from: [`Database::execute`] and [`Database::query`].
//!
//! **Architecture**: This is the Database Layer. The daemon keeps one
//! [`Database`] per open handle and never shares a connection between
//! handles.
//!
//! # Key Features
//!
//! - File-backed and anonymous in-memory databases
//! - Read-only and read-write open modes
//! - Statements cached by exact SQL text
//! - Positional parameter binding from [`ScalarValue`]
//! - Change tracking through `changes()` / `last_insert_rowid()`
//!
//! # Example
//!
//! ```ignore
//! use sqlbridge_db::{Database, OpenMode, ScalarValue};
//!
//! let db = Database::open(":memory:", OpenMode::ReadWrite)?;
//! db.execute("CREATE TABLE t(a INTEGER, b TEXT)", &[])?;
//! db.execute("INSERT INTO t VALUES (?, ?)", &[1.into(), "x".into()])?;
//! let result = db.query("SELECT * FROM t", &[])?;
//! assert_eq!(result.columns, ["a", "b"]);
//! ```

mod connection;
mod error;
mod query;
mod value;

pub use connection::{Database, LogLevel, MEMORY_PATH, OpenMode, is_memory_path};
pub use error::{Error, Result};
pub use value::{ResultSet, Row, ScalarValue};
