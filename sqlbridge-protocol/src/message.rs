// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

use crate::names::method;
use crate::value::Value;

/// Operations the daemon understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    OpenDatabase,
    CloseDatabase,
    DeleteDatabase,
    GetDatabasesPath,
    Execute,
    Query,
    Insert,
    Update,
    Batch,
    Options,
    Debug,
}

impl Method {
    pub const ALL: [Method; 11] = [
        Method::OpenDatabase,
        Method::CloseDatabase,
        Method::DeleteDatabase,
        Method::GetDatabasesPath,
        Method::Execute,
        Method::Query,
        Method::Insert,
        Method::Update,
        Method::Batch,
        Method::Options,
        Method::Debug,
    ];

    /// Resolve a wire method name; unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Method> {
        Method::ALL.into_iter().find(|m| m.as_str() == name)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Method::OpenDatabase => method::OPEN_DATABASE,
            Method::CloseDatabase => method::CLOSE_DATABASE,
            Method::DeleteDatabase => method::DELETE_DATABASE,
            Method::GetDatabasesPath => method::GET_DATABASES_PATH,
            Method::Execute => method::EXECUTE,
            Method::Query => method::QUERY,
            Method::Insert => method::INSERT,
            Method::Update => method::UPDATE,
            Method::Batch => method::BATCH,
            Method::Options => method::OPTIONS,
            Method::Debug => method::DEBUG,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An inbound request: method name plus arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: impl Into<Value>) -> Self {
        Self {
            method: method.into(),
            arguments: arguments.into(),
        }
    }
}

/// A structured error answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodError {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl MethodError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl std::fmt::Display for MethodError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// The answer to a [`MethodCall`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MethodResponse {
    Success {
        #[serde(default)]
        result: Value,
    },
    Error(MethodError),
    NotImplemented,
}

impl MethodResponse {
    /// Success without a payload.
    pub fn empty() -> Self {
        MethodResponse::Success { result: Value::Null }
    }

    pub fn success(result: impl Into<Value>) -> Self {
        MethodResponse::Success {
            result: result.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, MethodResponse::Success { .. })
    }

    /// The success payload, if any.
    pub fn result(&self) -> Option<&Value> {
        match self {
            MethodResponse::Success { result } => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&MethodError> {
        match self {
            MethodResponse::Error(err) => Some(err),
            _ => None,
        }
    }
}

impl From<MethodError> for MethodResponse {
    fn from(err: MethodError) -> Self {
        MethodResponse::Error(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("openDatabase", Some(Method::OpenDatabase))]
    #[case("getDatabasesPath", Some(Method::GetDatabasesPath))]
    #[case("batch", Some(Method::Batch))]
    #[case("debug", Some(Method::Debug))]
    #[case("vacuum", None)]
    #[case("OpenDatabase", None)]
    fn test_method_from_name(#[case] name: &str, #[case] expected: Option<Method>) {
        assert_eq!(Method::from_name(name), expected);
    }

    #[test]
    fn test_method_names_roundtrip() {
        for method in Method::ALL {
            assert_eq!(Method::from_name(method.as_str()), Some(method));
        }
    }

    #[test]
    fn test_response_json_shape() {
        let response = MethodResponse::Error(
            MethodError::new("database_error", "boom").with_details(Value::Int(1)),
        );
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": "error",
                "code": "database_error",
                "message": "boom",
                "details": {"type": "int", "value": 1},
            })
        );

        let json = serde_json::to_string(&MethodResponse::NotImplemented).unwrap();
        assert_eq!(json, r#"{"status":"not_implemented"}"#);
    }

    #[test]
    fn test_call_without_arguments() {
        let call: MethodCall = serde_json::from_str(r#"{"method":"getDatabasesPath"}"#).unwrap();
        assert_eq!(call.arguments, Value::Null);
    }
}
