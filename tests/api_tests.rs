//! Integration tests for the birdnotify HTTP API
//!
//! Tests cover:
//! - Health endpoint and the GET / usage hint
//! - Request shape errors (400) vs detection-message grammar errors (500)
//! - End-to-end forwarding to a mock Signal gateway, including payload shape
//! - Primary send failure surfacing (non-optimistic mode)
//! - Return-early mode responding before the send outcome is known
//! - Secondary-channel absence never affecting the primary outcome

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot` method

use birdnotify::{build_router, AppState, Config};

/// Test helper: config pointing the gateway at `signal_url`
fn test_config(signal_url: &str, return_early: bool) -> Config {
    test_config_with(signal_url, return_early, false)
}

/// Test helper: config with the recording-attach flag exposed
fn test_config_with(signal_url: &str, return_early: bool, attach_recording: bool) -> Config {
    let signal_url = signal_url.to_string();
    Config::from_lookup(move |name| match name {
        "SIGNAL_API_URL" => Some(signal_url.clone()),
        "FROM_NUMBER" => Some("+15550001111".to_string()),
        "RECIPIENTS" => Some("+15550002222, +15550003333".to_string()),
        "RETURN_EARLY" => Some(if return_early { "1" } else { "0" }.to_string()),
        "ATTACH_RECORDING" => Some(if attach_recording { "1" } else { "0" }.to_string()),
        _ => None,
    })
    .unwrap()
}

/// Test helper: app wired to the given config
fn setup_app(config: Config) -> Router {
    let state = AppState::from_config(config).expect("Should build app state");
    build_router(state)
}

/// Test helper: JSON POST request to /
fn post_json(body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Test helper: extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

/// Test helper: local listener standing in for the Signal gateway.
///
/// Returns the gateway base URL and the payloads it received.
async fn spawn_mock_gateway(status: StatusCode) -> (String, Arc<Mutex<Vec<Value>>>) {
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = received.clone();

    let app = Router::new().route(
        "/v2/send",
        post(move |Json(body): Json<Value>| {
            let sink = sink.clone();
            async move {
                sink.lock().unwrap().push(body);
                (status, "mock gateway response")
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Should bind mock gateway");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), received)
}

fn valid_body() -> Value {
    json!({
        "message": "comname=Blue Jay --- sciname=Cyanocitta cristata --- confidencepct=91.2"
    })
}

// =============================================================================
// Health and usage hint
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_app(test_config("http://127.0.0.1:1", false));

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "birdnotify");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_get_root_hints_at_post() {
    let app = setup_app(test_config("http://127.0.0.1:1", false));

    let request = Request::builder()
        .method("GET")
        .uri("/")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-served-by"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"Please use POST");
}

// =============================================================================
// Validation: shape errors (400) vs content errors (500)
// =============================================================================

#[tokio::test]
async fn test_array_body_rejected_400() {
    let app = setup_app(test_config("http://127.0.0.1:1", false));

    let response = app.oneshot(post_json(&json!([]))).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Payload must be a JSON object");
}

#[tokio::test]
async fn test_non_string_message_rejected_400() {
    let app = setup_app(test_config("http://127.0.0.1:1", false));

    let response = app
        .oneshot(post_json(&json!({ "message": 42 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "`message` must be a string");
}

#[tokio::test]
async fn test_missing_separator_rejected_500() {
    let app = setup_app(test_config("http://127.0.0.1:1", false));

    let response = app
        .oneshot(post_json(&json!({ "message": "no separator here" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["success"], false);
    assert_eq!(
        body["error"],
        "Message should separate values by --- (see readme)"
    );
}

#[tokio::test]
async fn test_missing_sciname_rejected_500() {
    let app = setup_app(test_config("http://127.0.0.1:1", false));

    let response = app
        .oneshot(post_json(&json!({ "message": "comname=Robin --- date=2023-01-01" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = extract_json(response.into_body()).await;
    assert_eq!(
        body["error"],
        "Message should include key sciname= (see readme)"
    );
}

#[tokio::test]
async fn test_bad_attachments_type_rejected_500() {
    let app = setup_app(test_config("http://127.0.0.1:1", false));

    let mut body = valid_body();
    body["attachments"] = json!("nope");

    let response = app.oneshot(post_json(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "`attachments` must be an array");
}

// =============================================================================
// End-to-end forwarding
// =============================================================================

#[tokio::test]
async fn test_valid_detection_forwarded_to_gateway() {
    let (gateway_url, received) = spawn_mock_gateway(StatusCode::OK).await;
    let app = setup_app(test_config(&gateway_url, false));

    let response = app.oneshot(post_json(&valid_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["success"], true);

    // Non-optimistic mode awaits the send, so the gateway has the payload
    let payloads = received.lock().unwrap();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0]["recipientHandle"], "+15550001111");
    assert_eq!(
        payloads[0]["recipients"],
        json!(["+15550002222", "+15550003333"])
    );
    assert!(payloads[0]["message"]
        .as_str()
        .unwrap()
        .starts_with("A Blue Jay (Cyanocitta cristata)"));
    // No attachments were sent, so the field is omitted entirely
    assert!(payloads[0].get("attachments").is_none());
}

#[tokio::test]
async fn test_image_attachment_converted_to_data_uri() {
    let (gateway_url, received) = spawn_mock_gateway(StatusCode::OK).await;
    let app = setup_app(test_config(&gateway_url, false));

    let mut body = valid_body();
    body["attachments"] = json!([
        { "base64": "AAAA", "mimetype": "image/png" },
        { "base64": "BBBB", "mimetype": "audio/wav" },
    ]);

    let response = app.oneshot(post_json(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let payloads = received.lock().unwrap();
    assert_eq!(
        payloads[0]["attachments"],
        json!(["data:image/png;base64,AAAA"])
    );
}

#[tokio::test]
async fn test_embed_mode_appends_listen_line() {
    let (gateway_url, received) = spawn_mock_gateway(StatusCode::OK).await;
    let app = setup_app(test_config(&gateway_url, false));

    let body = json!({
        "message": "comname=Robin --- sciname=Turdus migratorius --- confidence=0.873 \
                    --- listenurl=http://archive.test/?filename=SONG-12345-20230101.wav \
                    --- date=2023-01-01"
    });

    let response = app.oneshot(post_json(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let payloads = received.lock().unwrap();
    let message = payloads[0]["message"].as_str().unwrap();
    assert!(message.contains("confidence of 0.87%"));
    assert!(message.contains(
        "Listen: http://archive.test/By_Date/2023-01-01/SONG/SONG-12345-20230101.wav"
    ));
}

#[tokio::test]
async fn test_recording_fetch_failure_never_blocks_notification() {
    let (gateway_url, received) = spawn_mock_gateway(StatusCode::OK).await;
    // attach mode on, but nothing listens on the archive port
    let app = setup_app(test_config_with(&gateway_url, false, true));

    let body = json!({
        "message": "comname=Robin --- sciname=Turdus migratorius --- confidencepct=90 \
                    --- listenurl=http://127.0.0.1:1/?filename=SONG-1-2.wav \
                    --- date=2023-01-01"
    });

    let response = app.oneshot(post_json(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response_body = extract_json(response.into_body()).await;
    assert_eq!(response_body["success"], true);

    // The notification went out without the recording
    let payloads = received.lock().unwrap();
    assert_eq!(payloads.len(), 1);
    assert!(payloads[0].get("attachments").is_none());
}

// =============================================================================
// Primary send failure handling
// =============================================================================

#[tokio::test]
async fn test_gateway_error_surfaces_as_500() {
    let (gateway_url, _received) = spawn_mock_gateway(StatusCode::BAD_GATEWAY).await;
    let app = setup_app(test_config(&gateway_url, false));

    let response = app.oneshot(post_json(&valid_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "mock gateway response");
}

#[tokio::test]
async fn test_unreachable_gateway_surfaces_as_500() {
    // Nothing listens on port 1
    let app = setup_app(test_config("http://127.0.0.1:1", false));

    let response = app.oneshot(post_json(&valid_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("Network error"));
}

// =============================================================================
// Return-early mode
// =============================================================================

#[tokio::test]
async fn test_return_early_responds_before_send_outcome() {
    // Gateway is unreachable; in return-early mode that must not matter
    let app = setup_app(test_config("http://127.0.0.1:1", true));

    let response = app.oneshot(post_json(&valid_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["success"], Value::Null);
}

#[tokio::test]
async fn test_return_early_not_delayed_by_recording_fetch() {
    // Archive that answers very slowly; in return-early mode the 201 must go
    // out right after validation, before the attach-mode fetch runs
    let slow_archive = Router::new().fallback(|| async {
        tokio::time::sleep(Duration::from_secs(2)).await;
        "audio-bytes"
    });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Should bind mock archive");
    let archive_addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, slow_archive).await.unwrap();
    });

    let (gateway_url, _received) = spawn_mock_gateway(StatusCode::OK).await;
    let app = setup_app(test_config_with(&gateway_url, true, true));

    let body = json!({
        "message": format!(
            "comname=Robin --- sciname=Turdus migratorius --- confidencepct=90 \
             --- listenurl=http://{}/?filename=SONG-1-2.wav --- date=2023-01-01",
            archive_addr
        )
    });

    let start = Instant::now();
    let response = app.oneshot(post_json(&body)).await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(
        elapsed < Duration::from_millis(500),
        "201 was delayed {:?} by the recording fetch",
        elapsed
    );

    let response_body = extract_json(response.into_body()).await;
    assert_eq!(response_body["success"], Value::Null);
}

#[tokio::test]
async fn test_return_early_still_rejects_invalid_shape() {
    let app = setup_app(test_config("http://127.0.0.1:1", true));

    let response = app.oneshot(post_json(&json!([]))).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Secondary channel isolation
// =============================================================================

#[tokio::test]
async fn test_missing_secondary_config_never_affects_primary() {
    // test_config sets no SLACK_WEBHOOK_URL and no UNSPLASH_API_KEY; the
    // primary path must be indistinguishable from a fully configured one
    let (gateway_url, received) = spawn_mock_gateway(StatusCode::OK).await;
    let app = setup_app(test_config(&gateway_url, false));

    let body = json!({
        "message": "comname=American Robin --- sciname=Turdus migratorius --- confidencepct=87.5"
    });

    let response = app.oneshot(post_json(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response_body = extract_json(response.into_body()).await;
    assert_eq!(response_body["success"], true);

    let payloads = received.lock().unwrap();
    assert!(payloads[0]["message"]
        .as_str()
        .unwrap()
        .starts_with("An American Robin"));
}
