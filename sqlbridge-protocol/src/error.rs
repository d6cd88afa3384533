// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProtocolError>;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("missing argument '{key}'")]
    MissingArgument { key: String },

    #[error("argument '{key}' must be {expected}, got {actual}")]
    InvalidArgument {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("arguments must be a map, got {actual}")]
    InvalidArguments { actual: &'static str },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
