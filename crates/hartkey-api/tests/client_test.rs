#![allow(clippy::unwrap_used)]
// Integration tests for `HartkeyClient` using wiremock.

use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hartkey_api::{Endpoints, Error, HartkeyClient, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, HartkeyClient) {
    let server = MockServer::start().await;
    let endpoints = Endpoints::single(&server.uri()).unwrap();
    let client = HartkeyClient::with_client(reqwest::Client::new(), endpoints);
    (server, client)
}

fn token() -> SecretString {
    SecretString::from("test-token".to_string())
}

fn event(device_id: u64, event_type: &str, raised_at: &str) -> serde_json::Value {
    json!({
        "device_id": device_id,
        "event_type": event_type,
        "raised_at": raised_at,
        "user_id": 17
    })
}

// ── Devices ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_devices_sends_bearer_and_parses_envelope() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/devices/intercom"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "devices": [
                    {
                        "id": 1001,
                        "device_type": "intercom",
                        "description": "Front door",
                        "capabilities": [{ "name": "open_door", "setup": true }],
                        "firmware_version": "2.4.1",
                        "serial_number": "HK-0001"
                    },
                    {
                        "id": "1002",
                        "device_type": "gate",
                        "name_by_company": "Yard gate"
                    }
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let devices = client.list_devices(&token()).await.unwrap();

    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].id.as_deref(), Some("1001"));
    assert_eq!(devices[0].display_name(), Some("Front door"));
    assert!(devices[0].has_capability("open_door"));
    assert_eq!(devices[0].serial_number.as_deref(), Some("HK-0001"));
    assert_eq!(devices[1].id.as_deref(), Some("1002"));
    assert_eq!(devices[1].device_type.as_deref(), Some("gate"));
}

#[tokio::test]
async fn test_list_devices_unauthorized() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/devices/intercom"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.list_devices(&token()).await;
    assert!(
        matches!(result, Err(Error::Authentication { status: 401 })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_list_devices_forbidden_is_auth() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/devices/intercom"))
        .respond_with(ResponseTemplate::new(403).set_body_string("token revoked"))
        .mount(&server)
        .await;

    let err = client.list_devices(&token()).await.unwrap_err();
    assert!(err.is_auth(), "expected auth error, got: {err:?}");
}

#[tokio::test]
async fn test_list_devices_server_error_is_transient() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/devices/intercom"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = client.list_devices(&token()).await.unwrap_err();
    assert!(err.is_transient(), "expected transient error, got: {err:?}");
    assert_eq!(err.status(), Some(503));
}

#[tokio::test]
async fn test_list_devices_rate_limited_is_transient() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/devices/intercom"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = client.list_devices(&token()).await.unwrap_err();
    assert!(err.is_transient(), "expected transient error, got: {err:?}");
}

#[tokio::test]
async fn test_list_devices_malformed_body_is_protocol() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/devices/intercom"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": {} })))
        .mount(&server)
        .await;

    let err = client.list_devices(&token()).await.unwrap_err();
    assert!(
        matches!(err, Error::Deserialization { .. }),
        "expected Deserialization error, got: {err:?}"
    );
    assert!(err.is_protocol());
}

#[tokio::test]
async fn test_timeout_is_transient() {
    let server = MockServer::start().await;
    let transport = TransportConfig::default().with_timeout(Duration::from_millis(50));
    let client =
        HartkeyClient::new(Endpoints::single(&server.uri()).unwrap(), &transport).unwrap();

    Mock::given(method("GET"))
        .and(path("/devices/intercom"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(500))
                .set_body_json(json!({ "data": { "devices": [] } })),
        )
        .mount(&server)
        .await;

    let err = client.list_devices(&token()).await.unwrap_err();
    assert!(
        matches!(err, Error::Transport(ref e) if e.is_timeout()),
        "expected timeout, got: {err:?}"
    );
    assert!(err.is_transient());
}

// ── Events ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_recent_events_query_and_ordering() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/events/list"))
        .and(header("authorization", "Bearer test-token"))
        .and(query_param("device_ids", "1001"))
        .and(query_param("sort_by", "raised_at"))
        .and(query_param("sort_order", "desc"))
        .and(query_param("offset", "0"))
        .and(query_param("limit", "10"))
        .and(query_param(
            "event_types",
            "api_open_remote,face_open_remote,pin_code_open_remote,code_open_local,rfid_open_local,dtmf_open_local",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "items": [
                    event(1001, "rfid_open_local", "2024-06-15T10:00:00Z"),
                    event(1001, "api_open_remote", "2024-06-15T10:03:00Z"),
                    event(2002, "face_open_remote", "2024-06-15T11:00:00Z")
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let events = client.list_recent_events(&token(), "1001", 10).await.unwrap();

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event_type, "api_open_remote");
    assert_eq!(events[0].raised_at.to_rfc3339(), "2024-06-15T10:03:00+00:00");
    assert_eq!(events[1].event_type, "rfid_open_local");
}

#[tokio::test]
async fn test_list_recent_events_empty_is_valid() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/events/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "items": [] } })))
        .mount(&server)
        .await;

    let events = client.list_recent_events(&token(), "1001", 10).await.unwrap();
    assert!(events.is_empty());
}

#[tokio::test]
async fn test_list_recent_events_limit_is_clamped() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/events/list"))
        .and(query_param("limit", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "items": [] } })))
        .expect(1)
        .mount(&server)
        .await;

    client
        .list_recent_events(&token(), "1001", 5_000)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_list_recent_events_page_overflow_is_protocol() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/events/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "items": [
                    event(1001, "api_open_remote", "2024-06-15T10:00:00Z"),
                    event(1001, "api_open_remote", "2024-06-15T10:01:00Z"),
                    event(1001, "api_open_remote", "2024-06-15T10:02:00Z")
                ]
            }
        })))
        .mount(&server)
        .await;

    let err = client
        .list_recent_events(&token(), "1001", 2)
        .await
        .unwrap_err();
    assert!(err.is_protocol(), "expected protocol error, got: {err:?}");
}

#[tokio::test]
async fn test_list_recent_events_bad_request_is_protocol() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/events/list"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": "bad device_ids" })),
        )
        .mount(&server)
        .await;

    let err = client
        .list_recent_events(&token(), "1001", 10)
        .await
        .unwrap_err();
    assert!(
        matches!(err, Error::Api { status: 400, .. }),
        "expected Api error, got: {err:?}"
    );
}

// ── Open ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_open_success() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/devices/1001/open"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "status": true } })))
        .expect(1)
        .mount(&server)
        .await;

    client.open(&token(), "1001").await.unwrap();
}

#[tokio::test]
async fn test_open_conflict_is_device_busy() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/devices/1001/open"))
        .respond_with(ResponseTemplate::new(409).set_body_string("already opening"))
        .mount(&server)
        .await;

    let result = client.open(&token(), "1001").await;
    match result {
        Err(Error::DeviceBusy { device_id, message }) => {
            assert_eq!(device_id, "1001");
            assert_eq!(message, "already opening");
        }
        other => panic!("expected DeviceBusy, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_open_unauthorized() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/devices/1001/open"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client.open(&token(), "1001").await.unwrap_err();
    assert!(err.is_auth());
}
