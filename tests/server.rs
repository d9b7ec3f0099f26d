//! Serving over a real socket, including shutdown.

use std::time::Duration;

use request_observability::health::ReadinessState;
use request_observability::observability::Severity;
use request_observability::HttpServer;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

mod common;

use common::{test_config, MemorySink};

#[tokio::test]
async fn test_serve_and_shut_down() {
    let sink = std::sync::Arc::new(MemorySink::default());
    let server = HttpServer::with_sink(test_config(), sink.clone()).unwrap();
    let events = server.events().clone();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let running = tokio::spawn(server.run(listener, async move {
        let _ = stop_rx.await;
    }));

    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    let response = client
        .get(format!("http://{addr}/?from=socket"))
        .header("x-request-id", "socket-test-1")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["x-request-id"], "socket-test-1");

    let ready = client.get(format!("http://{addr}/ready")).send().await.unwrap();
    assert_eq!(ready.status(), 200);

    let records = sink.records();
    assert_eq!(records.len(), 1, "/ready is not logged");
    let (severity, record) = &records[0];
    assert_eq!(*severity, Severity::Info);
    assert_eq!(record.request_id, "socket-test-1");
    assert_eq!(record.query, "from=socket");
    // No forwarding headers, so the peer address is used.
    assert_eq!(record.ip, "127.0.0.1");
    drop(client);

    stop_tx.send(()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(10), running)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok(), "{result:?}");

    assert_eq!(events.readiness().current(), ReadinessState::RefusingTraffic);
}

#[tokio::test]
async fn test_bind_address_from_config() {
    let mut config = test_config();
    config.listener.host = "::1".into();
    config.listener.port = 9000;
    assert_eq!(config.listener.bind_address(), "[::1]:9000");
}
