//! End-to-end scenario: two WebSocket clients watch questions being
//! created, answered and re-statused over the REST API.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use askdesk::api;
use askdesk::app_state::AppState;
use askdesk::config::ServiceConfig;
use askdesk::persistence::QuestionStore;
use askdesk::ws::{BroadcastHub, Payload};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const TOKEN: &str = "e2e-operator";

async fn spawn_server() -> (SocketAddr, Arc<BroadcastHub>) {
    spawn_server_with(ServiceConfig::default()).await
}

async fn spawn_server_with(config: ServiceConfig) -> (SocketAddr, Arc<BroadcastHub>) {
    let config = ServiceConfig {
        operator_token: Some(TOKEN.to_string()),
        ..config
    };
    let state = AppState::new(&config, QuestionStore::in_memory());
    let hub = Arc::clone(&state.hub);
    let app = api::build_app(state, &config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, hub)
}

async fn wait_for_connections(hub: &BroadcastHub, expected: usize) {
    for _ in 0..200 {
        if hub.connection_count() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "expected {expected} connections, found {}",
        hub.connection_count()
    );
}

/// Polls `check` until it holds or `within` elapses.
async fn eventually(within: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + within;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}

/// Next text frame as JSON, or `None` if nothing arrives within `wait`.
async fn next_event(client: &mut Client, wait: Duration) -> Option<Value> {
    let deadline = tokio::time::Instant::now() + wait;
    loop {
        let frame = tokio::time::timeout_at(deadline, client.next()).await.ok()??;
        match frame.unwrap() {
            Message::Text(text) => return Some(serde_json::from_str(text.as_str()).unwrap()),
            Message::Close(_) => return None,
            _ => {}
        }
    }
}

async fn expect_event(client: &mut Client) -> Value {
    next_event(client, Duration::from_secs(2))
        .await
        .expect("event within two seconds")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn clients_see_every_mutation_until_they_leave() {
    let (addr, hub) = spawn_server().await;
    let ws_url = format!("ws://{addr}/ws");
    let base = format!("http://{addr}/api/v1");
    let http = reqwest::Client::new();

    let (mut a, _) = connect_async(&ws_url).await.unwrap();
    let (mut b, _) = connect_async(&ws_url).await.unwrap();
    wait_for_connections(&hub, 2).await;

    // Create
    let created: Value = http
        .post(format!("{base}/questions"))
        .json(&json!({ "message": "hi" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["id"].as_i64().unwrap();
    for client in [&mut a, &mut b] {
        let event = expect_event(client).await;
        assert_eq!(event["type"], "new_question");
        assert_eq!(event["data"]["id"], id);
        assert_eq!(event["data"]["message"], "hi");
        assert_eq!(event["data"]["status"], "pending");
    }

    // Answer
    let response = http
        .post(format!("{base}/questions/{id}/answer"))
        .json(&json!({ "answer": "hello" }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    for client in [&mut a, &mut b] {
        let event = expect_event(client).await;
        assert_eq!(event["type"], "question_answered");
        assert_eq!(event["data"], json!({ "id": id, "answer": "hello" }));
    }

    // Escalate
    let response = http
        .patch(format!("{base}/questions/{id}/status"))
        .bearer_auth(TOKEN)
        .json(&json!({ "status": "escalated" }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    for client in [&mut a, &mut b] {
        let event = expect_event(client).await;
        assert_eq!(event["type"], "status_updated");
        assert_eq!(event["data"], json!({ "id": id, "status": "escalated" }));
    }

    // A leaves
    a.close(None).await.unwrap();
    wait_for_connections(&hub, 1).await;

    let response = http
        .patch(format!("{base}/questions/{id}/status"))
        .bearer_auth(TOKEN)
        .json(&json!({ "status": "answered" }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let event = expect_event(&mut b).await;
    assert_eq!(event["data"], json!({ "id": id, "status": "answered" }));
    assert_eq!(hub.connection_count(), 1);

    // Rejected mutations broadcast nothing
    let response = http
        .patch(format!("{base}/questions/{id}/status"))
        .bearer_auth(TOKEN)
        .json(&json!({ "status": "closed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    assert!(next_event(&mut b, Duration::from_millis(200)).await.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_closes_open_sockets() {
    let (addr, hub) = spawn_server().await;
    let (mut client, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    wait_for_connections(&hub, 1).await;

    assert_eq!(hub.close_all(), 1);

    let ended = tokio::time::timeout(Duration::from_secs(2), async {
        while let Some(frame) = client.next().await {
            if matches!(frame, Ok(Message::Close(_)) | Err(_)) {
                break;
            }
        }
    })
    .await;
    assert!(ended.is_ok());
    assert_eq!(hub.connection_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn plain_http_on_ws_route_is_rejected() {
    let (addr, hub) = spawn_server().await;
    let response = reqwest::get(format!("http://{addr}/ws")).await.unwrap();
    assert!(response.status().is_client_error());
    assert_eq!(hub.connection_count(), 0);
}

// The upgrade handler moves one hub handle into the connection driver, so
// the hub's strong count tells whether a driver is still running.

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn silent_peer_is_closed_after_idle_timeout() {
    let (addr, hub) = spawn_server_with(ServiceConfig {
        ws_ping_interval_secs: 1,
        ws_idle_timeout_secs: 1,
        ..ServiceConfig::default()
    })
    .await;
    let base = Arc::strong_count(&hub);

    // Never polled, so it neither reads nor answers pings.
    let (_client, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    wait_for_connections(&hub, 1).await;
    assert_eq!(Arc::strong_count(&hub), base + 1);

    assert!(eventually(Duration::from_secs(5), || hub.connection_count() == 0).await);
    assert!(eventually(Duration::from_secs(2), || Arc::strong_count(&hub) == base).await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn pings_keep_a_responsive_peer_open() {
    let (addr, hub) = spawn_server_with(ServiceConfig {
        ws_ping_interval_secs: 1,
        ws_idle_timeout_secs: 2,
        ..ServiceConfig::default()
    })
    .await;
    let (mut client, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    wait_for_connections(&hub, 1).await;

    // Reading lets the client answer each Ping with a Pong.
    let mut pings = 0;
    let deadline = tokio::time::Instant::now() + Duration::from_millis(3_500);
    while let Ok(Some(frame)) = tokio::time::timeout_at(deadline, client.next()).await {
        match frame.unwrap() {
            Message::Ping(_) => pings += 1,
            Message::Close(_) => panic!("responsive peer was closed"),
            _ => {}
        }
    }

    assert!(pings >= 2, "expected at least two pings, got {pings}");
    assert_eq!(hub.connection_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stalled_reader_releases_its_socket() {
    let (addr, hub) = spawn_server_with(ServiceConfig {
        ws_push_timeout_ms: 100,
        ws_queue_capacity: 1,
        ws_ping_interval_secs: 30,
        ws_idle_timeout_secs: 60,
        ..ServiceConfig::default()
    })
    .await;
    let base = Arc::strong_count(&hub);

    // Never polled, so socket buffers fill up and writes stall.
    let (_client, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    wait_for_connections(&hub, 1).await;

    let payload: Payload = Arc::from("x".repeat(8 << 20));
    for _ in 0..20 {
        if hub.connection_count() == 0 {
            break;
        }
        hub.broadcast_payload(Arc::clone(&payload)).await;
    }
    assert_eq!(hub.connection_count(), 0);

    // Well inside the idle window, so only the bounded write can explain it.
    assert!(eventually(Duration::from_secs(3), || Arc::strong_count(&hub) == base).await);
}
