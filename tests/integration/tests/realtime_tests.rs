//! Real-time gateway integration tests
//!
//! Each test starts its own server on an ephemeral port.
//!
//! Run with: cargo test -p integration-tests --test realtime_tests

use std::collections::BTreeSet;
use std::time::Duration;

use integration_tests::{
    assert_json, assert_status, credentials, expired_token, foreign_token, unique_identity, wait_until,
    TestServer, WsClient,
};
use pos_common::AppConfig;
use pos_core::Role;
use pos_realtime::server::{OnlineResponse, PublishResponse, StatsResponse};
use reqwest::StatusCode;
use serde_json::{json, Value};

const QUIET: Duration = Duration::from_millis(300);

fn rooms(welcome: &pos_realtime::protocol::Envelope) -> BTreeSet<String> {
    welcome.data["rooms"]
        .as_array()
        .expect("rooms array")
        .iter()
        .map(|r| r.as_str().expect("room name").to_string())
        .collect()
}

// ============================================================================
// Handshake
// ============================================================================

#[tokio::test]
async fn test_waiter_welcome_lists_five_channels() {
    let server = TestServer::start().await.unwrap();
    let (identity, token) = credentials(Role::Waiter);

    let (_client, welcome) = server.connect(&token).await.unwrap();

    let expected: BTreeSet<String> = [
        "role:waiter".to_string(),
        format!("user:{}", identity.id),
        "orders".to_string(),
        "tables".to_string(),
        "all_staff".to_string(),
    ]
    .into_iter()
    .collect();
    assert_eq!(rooms(&welcome), expected);
    assert!(welcome.data["timestamp"].is_string());
}

#[tokio::test]
async fn test_header_token_is_accepted() {
    let server = TestServer::start().await.unwrap();
    let (_, token) = credentials(Role::Kitchen);

    let (_client, welcome) = server.connect_with_header(&token).await.unwrap();
    assert!(rooms(&welcome).contains("kitchen"));
}

#[tokio::test]
async fn test_expired_token_rejected_without_admission() {
    let server = TestServer::start().await.unwrap();
    let identity = unique_identity(Role::Waiter);

    let (status, body) = server
        .connect_rejected(&server.ws_url(&expired_token(&identity)))
        .await
        .unwrap();

    assert_eq!(status, 401);
    assert_eq!(body["error"], "Authentication token expired");
    assert_eq!(server.state.manager().connection_count(), 0);
}

#[tokio::test]
async fn test_missing_and_foreign_tokens_rejected() {
    let server = TestServer::start().await.unwrap();

    let (status, body) = server
        .connect_rejected(&format!("ws://{}/ws", server.addr))
        .await
        .unwrap();
    assert_eq!(status, 401);
    assert_eq!(body["error"], "Authentication token required");

    let (status, body) = server
        .connect_rejected(&format!("ws://{}/ws?token=Bearer%20", server.addr))
        .await
        .unwrap();
    assert_eq!(status, 401);
    assert_eq!(body["error"], "Authentication token required");

    let identity = unique_identity(Role::Owner);
    let (status, body) = server
        .connect_rejected(&server.ws_url(&foreign_token(&identity)))
        .await
        .unwrap();
    assert_eq!(status, 401);
    assert_eq!(body["error"], "Invalid authentication token");

    assert_eq!(server.state.manager().connection_count(), 0);
}

#[tokio::test]
async fn test_missing_secret_is_server_error() {
    let server = TestServer::start_with_config(AppConfig::for_tests(None))
        .await
        .unwrap();
    let (_, token) = credentials(Role::Waiter);

    let (status, body) = server.connect_rejected(&server.ws_url(&token)).await.unwrap();
    assert_eq!(status, 500);
    assert_eq!(body["error"], "Server configuration error");
}

// ============================================================================
// Fan-out
// ============================================================================

#[tokio::test]
async fn test_unicast_reaches_both_devices() {
    let server = TestServer::start().await.unwrap();
    let (identity, token) = credentials(Role::Customer);
    let (_, other_token) = credentials(Role::Customer);
    let (_, admin_token) = credentials(Role::Admin);

    let (mut phone, _) = server.connect(&token).await.unwrap();
    let (mut tablet, _) = server.connect(&token).await.unwrap();
    let (mut other, _) = server.connect(&other_token).await.unwrap();

    let response = server
        .post_auth(
            "/api/realtime/publish",
            &admin_token,
            &json!({"room": format!("user:{}", identity.id), "event": "x", "payload": {"n": 1}}),
        )
        .await
        .unwrap();
    let published: PublishResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(published.recipients, 2);

    for device in [&mut phone, &mut tablet] {
        let frame = device.recv_event("x").await.unwrap();
        assert_eq!(frame.data["n"], 1);
    }
    assert!(other.is_silent(QUIET).await);
}

#[tokio::test]
async fn test_admin_room_sees_presence_changes() {
    let server = TestServer::start().await.unwrap();
    let (_, admin_token) = credentials(Role::Admin);
    let (kitchen, kitchen_token) = credentials(Role::Kitchen);

    let (mut admin, _) = server.connect(&admin_token).await.unwrap();
    // The admin room also hears about the admin itself
    admin.recv_event("user:connected").await.unwrap();

    let (chef, _) = server.connect(&kitchen_token).await.unwrap();

    let connected = admin.recv_event("user:connected").await.unwrap();
    assert_eq!(connected.data["userId"], kitchen.id.as_str());
    assert_eq!(connected.data["role"], "kitchen");

    chef.close().await.unwrap();

    let disconnected = admin.recv_event("user:disconnected").await.unwrap();
    assert_eq!(disconnected.data["userId"], kitchen.id.as_str());
    assert!(admin.is_silent(QUIET).await);

    server.wait_for_connections(1).await.unwrap();
}

#[tokio::test]
async fn test_customer_never_hears_admin_room() {
    let server = TestServer::start().await.unwrap();
    let (_, owner_token) = credentials(Role::Owner);
    let (_, customer_token) = credentials(Role::Customer);

    let (mut customer, welcome) = server.connect(&customer_token).await.unwrap();
    assert!(!rooms(&welcome).contains("admin"));

    let response = server
        .post_auth(
            "/api/realtime/publish",
            &owner_token,
            &json!({"room": "admin", "event": "alert", "payload": {}}),
        )
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();
    assert!(customer.is_silent(QUIET).await);

    // Explicit join is refused too
    customer
        .send("room:join", json!({"room": "admin"}))
        .await
        .unwrap();
    let error = customer.recv_event("error").await.unwrap();
    assert_eq!(error.data["event"], "room:join");
}

#[tokio::test]
async fn test_order_flow_between_staff() {
    let server = TestServer::start().await.unwrap();
    let (_, waiter_token) = credentials(Role::Waiter);
    let (_, kitchen_token) = credentials(Role::Kitchen);
    let (customer, customer_token) = credentials(Role::Customer);

    let (mut waiter, _) = server.connect(&waiter_token).await.unwrap();
    let (mut kitchen, _) = server.connect(&kitchen_token).await.unwrap();
    let (mut diner, _) = server.connect(&customer_token).await.unwrap();

    waiter
        .send("order:created", json!({"orderId": 12, "table": 4}))
        .await
        .unwrap();
    let new_order = kitchen.recv_event("new-order").await.unwrap();
    assert_eq!(new_order.data["orderId"], 12);
    assert_eq!(new_order.data["room"], "orders");

    kitchen
        .send(
            "order:status-updated",
            json!({"orderId": 12, "status": "ready", "customerId": customer.id}),
        )
        .await
        .unwrap();

    let ready = waiter.recv_event("order-ready").await.unwrap();
    assert_eq!(ready.data["orderId"], 12);
    let update = diner.recv_event("order-updated").await.unwrap();
    assert_eq!(update.data["status"], "ready");
}

#[tokio::test]
async fn test_announce_reaches_everyone() {
    let server = TestServer::start().await.unwrap();
    let (_, admin_token) = credentials(Role::Admin);
    let (_, customer_token) = credentials(Role::Customer);
    let (_, kitchen_token) = credentials(Role::Kitchen);

    let (mut customer, _) = server.connect(&customer_token).await.unwrap();
    let (mut kitchen, _) = server.connect(&kitchen_token).await.unwrap();

    let response = server
        .post_auth(
            "/api/realtime/announce",
            &admin_token,
            &json!({"message": "Kitchen closes in 15 minutes", "level": "warning"}),
        )
        .await
        .unwrap();
    let body: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["recipients"], 2);

    for client in [&mut customer, &mut kitchen] {
        let frame = client.recv_event("system:message").await.unwrap();
        assert_eq!(frame.data["level"], "warning");
    }
}

// ============================================================================
// Client frames
// ============================================================================

#[tokio::test]
async fn test_bad_frames_keep_connection_open() {
    let server = TestServer::start().await.unwrap();
    let (_, token) = credentials(Role::Waiter);
    let (mut client, _) = server.connect(&token).await.unwrap();

    client.send_raw("{{{").await.unwrap();
    assert_eq!(client.recv().await.unwrap().event, "error");

    client.send("dance", json!({})).await.unwrap();
    assert_eq!(client.recv().await.unwrap().event, "error");

    client.send("ping", Value::Null).await.unwrap();
    assert_eq!(client.recv_event("pong").await.unwrap().event, "pong");
    assert_eq!(server.state.manager().connection_count(), 1);
}

#[tokio::test]
async fn test_presence_update_shows_in_online_list() {
    let server = TestServer::start().await.unwrap();
    let (_, admin_token) = credentials(Role::Admin);
    let (waiter, waiter_token) = credentials(Role::Waiter);

    let (mut client, _) = server.connect(&waiter_token).await.unwrap();
    client
        .send("presence:update", json!({"status": "on break"}))
        .await
        .unwrap();
    client.recv_event("presence:updated").await.unwrap();

    let response = server
        .get_auth("/api/realtime/online", &admin_token)
        .await
        .unwrap();
    let online: OnlineResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(online.count, 1);
    assert_eq!(online.users[0].id, waiter.id);
    assert_eq!(online.users[0].status, "on break");
}

// ============================================================================
// HTTP routes
// ============================================================================

#[tokio::test]
async fn test_stats_follow_connections() {
    let server = TestServer::start().await.unwrap();
    let (_, owner_token) = credentials(Role::Owner);
    let (_, waiter_token) = credentials(Role::Waiter);

    let (client, _) = server.connect(&waiter_token).await.unwrap();

    let response = server
        .get_auth("/api/realtime/stats", &owner_token)
        .await
        .unwrap();
    let stats: StatsResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(stats.rooms["tables"], 1);
    assert_eq!(stats.rooms["kitchen"], 0);
    assert_eq!(stats.total_connections, 1);

    client.close().await.unwrap();
    server.wait_for_connections(0).await.unwrap();

    let response = server
        .get_auth("/api/realtime/stats", &owner_token)
        .await
        .unwrap();
    let stats: StatsResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(stats.rooms["tables"], 0);
    assert!(!stats.rooms.contains_key("role:waiter"));
}

#[tokio::test]
async fn test_routes_require_privileged_caller() {
    let server = TestServer::start().await.unwrap();
    let (_, waiter_token) = credentials(Role::Waiter);

    let response = server.get("/api/realtime/stats").await.unwrap();
    assert_status(response, StatusCode::UNAUTHORIZED).await.unwrap();

    let response = server
        .get_auth("/api/realtime/online", &waiter_token)
        .await
        .unwrap();
    assert_status(response, StatusCode::FORBIDDEN).await.unwrap();

    let response = server.get("/health").await.unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn test_shutdown_closes_connections() {
    let server = TestServer::start().await.unwrap();
    let (_, token) = credentials(Role::Kitchen);
    let (mut client, _) = server.connect(&token).await.unwrap();

    server.state.manager().shutdown();

    wait_until(|| server.state.manager().connection_count() == 0)
        .await
        .unwrap();
    assert!(client.next(Duration::from_secs(5)).await.unwrap().is_none());

    // Later connections are closed straight away
    let (_, late_token) = credentials(Role::Waiter);
    let mut late = WsClient::connect(&server.ws_url(&late_token)).await.unwrap();
    assert!(late.next(Duration::from_secs(5)).await.unwrap().is_none());
}
