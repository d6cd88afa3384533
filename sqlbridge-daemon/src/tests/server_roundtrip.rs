// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

use std::path::Path;
use std::time::Duration;

use sqlbridge_protocol::{MethodResponse, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

use super::{args, db_path, test_handler};
use crate::client::DaemonClient;
use crate::server::DaemonServer;

async fn wait_for_socket(path: &Path) {
    for _ in 0..100 {
        if UnixStream::connect(path).await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("daemon did not start listening on {}", path.display());
}

#[tokio::test]
async fn test_client_roundtrip() {
    let (handler, dir) = test_handler();
    let socket = dir.path().join("daemon.sock");
    let server = std::sync::Arc::new(DaemonServer::new(handler, socket.clone()));
    let serving = {
        let server = server.clone();
        tokio::spawn(async move { server.serve().await })
    };
    wait_for_socket(&socket).await;

    let mut client = DaemonClient::connect(&socket).await.unwrap();
    let path = db_path(&dir, "remote.db");
    let opened = client
        .call("openDatabase", args([("path", path.as_str().into())]))
        .await
        .unwrap();
    let id = opened.result().and_then(|r| r.get("id")).cloned().unwrap();

    let response = client
        .call(
            "execute",
            args([
                ("id", id.clone()),
                ("sql", "CREATE TABLE t(a REAL, b BLOB)".into()),
            ]),
        )
        .await
        .unwrap();
    assert_eq!(response, MethodResponse::empty());

    client
        .call(
            "insert",
            args([
                ("id", id.clone()),
                ("sql", "INSERT INTO t VALUES (?, ?)".into()),
                (
                    "arguments",
                    Value::List(vec![Value::Real(1.5), Value::Bytes(vec![0, 255])]),
                ),
            ]),
        )
        .await
        .unwrap();

    let rows = client
        .call(
            "query",
            args([("id", id.clone()), ("sql", "SELECT a, b FROM t".into())]),
        )
        .await
        .unwrap();
    assert_eq!(
        rows.result().and_then(|r| r.get("rows")),
        Some(&Value::List(vec![Value::List(vec![
            Value::Real(1.5),
            Value::Bytes(vec![0, 255]),
        ])]))
    );

    let response = client.call("vacuum", Value::Null).await.unwrap();
    assert_eq!(response, MethodResponse::NotImplemented);

    server.shutdown().await;
    serving.abort();
}

#[tokio::test]
async fn test_non_finite_reals_roundtrip() {
    let (handler, dir) = test_handler();
    let socket = dir.path().join("daemon.sock");
    let server = std::sync::Arc::new(DaemonServer::new(handler, socket.clone()));
    let serving = {
        let server = server.clone();
        tokio::spawn(async move { server.serve().await })
    };
    wait_for_socket(&socket).await;

    let mut client = DaemonClient::connect(&socket).await.unwrap();
    let opened = client
        .call("openDatabase", args([("path", ":memory:".into())]))
        .await
        .unwrap();
    let id = opened.result().and_then(|r| r.get("id")).cloned().unwrap();

    let rows = client
        .call(
            "query",
            args([
                ("id", id.clone()),
                ("sql", "SELECT 9e999 AS pos, -9e999 AS neg".into()),
            ]),
        )
        .await
        .unwrap();
    assert_eq!(
        rows.result().and_then(|r| r.get("rows")),
        Some(&Value::List(vec![Value::List(vec![
            Value::Real(f64::INFINITY),
            Value::Real(f64::NEG_INFINITY),
        ])]))
    );

    // Bound back as arguments, they reach SQLite unchanged.
    let rows = client
        .call(
            "query",
            args([
                ("id", id.clone()),
                ("sql", "SELECT ? > 1e308, ? < -1e308".into()),
                (
                    "arguments",
                    Value::List(vec![
                        Value::Real(f64::INFINITY),
                        Value::Real(f64::NEG_INFINITY),
                    ]),
                ),
            ]),
        )
        .await
        .unwrap();
    assert_eq!(
        rows.result().and_then(|r| r.get("rows")),
        Some(&Value::List(vec![Value::List(vec![Value::Int(1), Value::Int(1)])]))
    );

    // The connection survived both exchanges.
    let response = client.call("vacuum", Value::Null).await.unwrap();
    assert_eq!(response, MethodResponse::NotImplemented);

    server.shutdown().await;
    serving.abort();
}

#[tokio::test]
async fn test_malformed_request_keeps_connection() {
    let (handler, dir) = test_handler();
    let socket = dir.path().join("daemon.sock");
    let server = std::sync::Arc::new(DaemonServer::new(handler, socket.clone()));
    let serving = {
        let server = server.clone();
        tokio::spawn(async move { server.serve().await })
    };
    wait_for_socket(&socket).await;

    let stream = UnixStream::connect(&socket).await.unwrap();
    let (read, mut write) = stream.into_split();
    let mut lines = BufReader::new(read).lines();

    write.write_all(b"{not json\n").await.unwrap();
    let reply: MethodResponse =
        serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
    assert_eq!(reply.error().unwrap().code, "invalid_request");

    write
        .write_all(b"{\"method\":\"debug\",\"arguments\":{\"type\":\"map\",\"value\":{\"cmd\":{\"type\":\"text\",\"value\":\"get\"}}}}\n")
        .await
        .unwrap();
    let reply: MethodResponse =
        serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
    assert_eq!(reply, MethodResponse::success(Value::Map(Default::default())));

    server.shutdown().await;
    serving.abort();
}
