//! # Webhook Integration Tests
//!
//! Drives the Axum router in-process with signed webhook bodies and checks
//! that tasks are stored, reminders scheduled, and acknowledgements sent.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::RecordingDispatcher;
use reminder_core::channel::{sign_body, PushClient, TemplateAcknowledger};
use reminder_core::config::ChannelConfig;
use reminder_core::database::{InMemoryTaskStore, TaskStore};
use reminder_core::scheduler::ReminderScheduler;
use reminder_core::web::{create_app, state::AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECRET: &str = "test-channel-secret";
const PHRASE: &str = "Proud of you!";

struct Harness {
    app: Router,
    store: Arc<InMemoryTaskStore>,
    scheduler: Arc<ReminderScheduler>,
    dispatcher: Arc<RecordingDispatcher>,
    _platform: MockServer,
}

async fn harness() -> Harness {
    let platform = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/bot/message/reply"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&platform)
        .await;

    let channel = ChannelConfig {
        api_base_url: platform.uri(),
        access_token: "token".to_string(),
        channel_secret: SECRET.to_string(),
        ..ChannelConfig::default()
    };

    let dispatcher = RecordingDispatcher::new(PHRASE);
    let scheduler = Arc::new(ReminderScheduler::in_memory(dispatcher.clone()));
    scheduler.initialize().await.unwrap();
    let store = Arc::new(InMemoryTaskStore::new());

    let state = AppState {
        scheduler: scheduler.clone(),
        store: store.clone(),
        push_client: PushClient::new(&channel).unwrap(),
        acknowledger: Arc::new(TemplateAcknowledger::new(PHRASE)),
        channel_secret: Arc::from(SECRET),
        default_offset_minutes: 60,
        environment: "test".to_string(),
    };

    Harness {
        app: create_app(state),
        store,
        scheduler,
        dispatcher,
        _platform: platform,
    }
}

fn text_event(user_id: &str, message_id: &str, text: &str) -> Value {
    json!({
        "type": "message",
        "replyToken": "reply-token-1",
        "timestamp": 1_700_000_000_000i64,
        "source": { "type": "user", "userId": user_id },
        "message": { "type": "text", "id": message_id, "text": text }
    })
}

fn signed_request(body: &Value) -> Request<Body> {
    let bytes = serde_json::to_vec(body).unwrap();
    Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json")
        .header("x-line-signature", sign_body(SECRET, &bytes))
        .body(Body::from(bytes))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_text_message_creates_task_and_schedules_reminder() {
    let h = harness().await;
    let payload = json!({
        "destination": "bot",
        "events": [text_event("U1", "m1", "Submit report @ 2099-10-01T12:00:00Z")]
    });

    let response = h.app.clone().oneshot(signed_request(&payload)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["scheduled"], 1);

    let tasks = h.store.find_by_user("U1").await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Submit report");
    assert!(tasks[0].due_at.is_some());
    assert_eq!(h.scheduler.pending_count().await.unwrap(), 1);
    assert!(h.dispatcher.deliveries().is_empty());
}

#[tokio::test]
async fn test_redelivered_event_replaces_earlier_task() {
    let h = harness().await;
    let first = json!({
        "events": [text_event("U1", "m9", "Renew passport @ 2099-10-01T12:00:00Z")]
    });
    let response = h.app.clone().oneshot(signed_request(&first)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Same message redelivered alongside a new one
    let redelivery = json!({
        "events": [
            text_event("U1", "m9", "Renew passport @ 2099-10-01T12:00:00Z"),
            text_event("U1", "m10", "Book dentist")
        ]
    });
    let response = h.app.clone().oneshot(signed_request(&redelivery)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(h.store.find_by_user("U1").await.unwrap().len(), 2);
    assert_eq!(h.scheduler.pending_count().await.unwrap(), 2);
    assert!(h.store.find("line-m9").await.unwrap().is_some());
}

#[tokio::test]
async fn test_non_text_events_are_ignored() {
    let h = harness().await;
    let payload = json!({
        "events": [
            { "type": "follow", "source": { "type": "user", "userId": "U1" } },
            {
                "type": "message",
                "source": { "type": "user", "userId": "U1" },
                "message": { "type": "sticker", "id": "s1" }
            }
        ]
    });

    let response = h.app.clone().oneshot(signed_request(&payload)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["scheduled"], 0);
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn test_bad_signature_is_rejected() {
    let h = harness().await;
    let payload = json!({ "events": [text_event("U1", "m1", "Buy milk")] });
    let bytes = serde_json::to_vec(&payload).unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("x-line-signature", sign_body("some-other-secret", &bytes))
        .body(Body::from(bytes.clone()))
        .unwrap();
    let response = h.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let unsigned = Request::builder()
        .method("POST")
        .uri("/webhook")
        .body(Body::from(bytes))
        .unwrap();
    let response = h.app.clone().oneshot(unsigned).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let h = harness().await;
    let bytes = b"{ not json".to_vec();
    let request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("x-line-signature", sign_body(SECRET, &bytes))
        .body(Body::from(bytes))
        .unwrap();

    let response = h.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_scheduling_failure_returns_server_error() {
    let h = harness().await;
    h.scheduler.shutdown().await.unwrap();

    let payload = json!({ "events": [text_event("U1", "m1", "Buy milk")] });
    let response = h.app.clone().oneshot(signed_request(&payload)).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_list_tasks_and_health_endpoints() {
    let h = harness().await;
    let payload = json!({
        "events": [
            text_event("U7", "m71", "Later thing @ 2099-12-01T09:00:00Z"),
            text_event("U7", "m72", "Sooner thing @ 2099-11-01T09:00:00Z")
        ]
    });
    let response = h.app.clone().oneshot(signed_request(&payload)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let list = Request::builder()
        .uri("/users/U7/tasks")
        .body(Body::empty())
        .unwrap();
    let body = json_body(h.app.clone().oneshot(list).await.unwrap()).await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["tasks"][0]["title"], "Sooner thing");

    let health = Request::builder().uri("/health").body(Body::empty()).unwrap();
    assert_eq!(
        h.app.clone().oneshot(health).await.unwrap().status(),
        StatusCode::OK
    );

    let ready = Request::builder().uri("/ready").body(Body::empty()).unwrap();
    let response = h.app.clone().oneshot(ready).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["scheduler_mode"], "in_memory");
    assert_eq!(body["pending_reminders"], 2);

    h.scheduler.shutdown().await.unwrap();
    let ready = Request::builder().uri("/ready").body(Body::empty()).unwrap();
    assert_eq!(
        h.app.clone().oneshot(ready).await.unwrap().status(),
        StatusCode::SERVICE_UNAVAILABLE
    );
}
