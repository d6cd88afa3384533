// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Method, argument and error-code names used on the wire.

/// Method names.
pub mod method {
    pub const OPEN_DATABASE: &str = "openDatabase";
    pub const CLOSE_DATABASE: &str = "closeDatabase";
    pub const DELETE_DATABASE: &str = "deleteDatabase";
    pub const GET_DATABASES_PATH: &str = "getDatabasesPath";
    pub const EXECUTE: &str = "execute";
    pub const QUERY: &str = "query";
    pub const INSERT: &str = "insert";
    pub const UPDATE: &str = "update";
    pub const BATCH: &str = "batch";
    pub const OPTIONS: &str = "options";
    pub const DEBUG: &str = "debug";
}

/// Argument and result map keys.
pub mod param {
    pub const ID: &str = "id";
    pub const PATH: &str = "path";
    pub const READ_ONLY: &str = "readOnly";
    pub const SINGLE_INSTANCE: &str = "singleInstance";
    pub const RECOVERED: &str = "recovered";
    pub const SQL: &str = "sql";
    pub const SQL_ARGUMENTS: &str = "arguments";
    pub const NO_RESULT: &str = "noResult";
    pub const CONTINUE_ON_ERROR: &str = "continueOnError";
    pub const OPERATIONS: &str = "operations";
    pub const METHOD: &str = "method";
    pub const RESULT: &str = "result";
    pub const ERROR: &str = "error";
    pub const ERROR_CODE: &str = "code";
    pub const ERROR_MESSAGE: &str = "message";
    pub const ERROR_DATA: &str = "data";
    pub const COLUMNS: &str = "columns";
    pub const ROWS: &str = "rows";
    pub const QUERY_AS_MAP_LIST: &str = "queryAsMapList";
    pub const LOG_LEVEL: &str = "logLevel";
    pub const CMD: &str = "cmd";
    pub const DATABASES: &str = "databases";
}

/// `debug` sub-commands.
pub mod cmd {
    pub const GET: &str = "get";
}

/// Error codes reported in [`crate::MethodError::code`].
pub mod error_code {
    pub const DATABASE: &str = "database_error";
    pub const PERMISSION_NOT_ALLOWED: &str = "permission_not_allowed";
    pub const STORAGE: &str = "storage_error";
    pub const INVALID_ARGUMENT: &str = "invalid_argument";
    pub const INVALID_REQUEST: &str = "invalid_request";
}

/// Message prefixes for database errors.
pub mod error_message {
    pub const DATABASE_CLOSED: &str = "database_closed";
    pub const OPEN_FAILED: &str = "open_failed";
}
