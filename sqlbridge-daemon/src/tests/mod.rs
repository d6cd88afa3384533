// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

mod server_roundtrip;

use sqlbridge_protocol::{MethodCall, MethodResponse, Value};
use tempfile::TempDir;

use crate::config::Config;
use crate::handler::DatabaseHandler;
use crate::permission::{PermissionService, StaticPermissions};

/// Handler with a temp databases directory and every permission granted.
pub(crate) fn test_handler() -> (DatabaseHandler<StaticPermissions>, TempDir) {
    test_handler_with(StaticPermissions::granted(), |_| {})
}

pub(crate) fn test_handler_with<P: PermissionService + 'static>(
    permissions: P,
    configure: impl FnOnce(&mut Config),
) -> (DatabaseHandler<P>, TempDir) {
    let dir = TempDir::new().unwrap();
    let mut config = Config {
        databases_path: dir.path().join("databases"),
        socket_path: dir.path().join("daemon.sock"),
        ..Config::default()
    };
    configure(&mut config);
    (DatabaseHandler::new(permissions, &config), dir)
}

pub(crate) fn args<const N: usize>(pairs: [(&str, Value); N]) -> Value {
    pairs.into_iter().collect()
}

pub(crate) async fn call<P: PermissionService + 'static>(
    handler: &DatabaseHandler<P>,
    method: &str,
    arguments: Value,
) -> MethodResponse {
    handler.handle(MethodCall::new(method, arguments)).await
}

/// Call and unwrap the success payload.
pub(crate) async fn call_ok<P: PermissionService + 'static>(
    handler: &DatabaseHandler<P>,
    method: &str,
    arguments: Value,
) -> Value {
    match call(handler, method, arguments).await {
        MethodResponse::Success { result } => result,
        other => panic!("{method} failed: {other:?}"),
    }
}

pub(crate) async fn open<P: PermissionService + 'static>(
    handler: &DatabaseHandler<P>,
    path: &str,
    single_instance: bool,
) -> Value {
    call_ok(
        handler,
        "openDatabase",
        args([
            ("path", Value::from(path)),
            ("singleInstance", Value::Bool(single_instance)),
        ]),
    )
    .await
}

pub(crate) fn db_path(dir: &TempDir, name: &str) -> String {
    dir.path().join(name).to_str().unwrap().to_owned()
}
