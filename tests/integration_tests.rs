use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha1::Sha1;
use tokio::sync::Semaphore;
use tower::ServiceExt;

use careline::config::AppConfig;
use careline::handlers;
use careline::models::{
    BookingRecord, EmotionReading, OutboundMessage, SemanticExtraction, Session, SlotUpdate,
};
use careline::services::ai::semantic::{ExtractionError, SemanticExtractor};
use careline::services::assistant::Assistant;
use careline::services::booking_sink::BookingSink;
use careline::services::composer::{FixedSelector, ResponseComposer};
use careline::services::dialogue::DialogueController;
use careline::services::messaging::MessagingProvider;
use careline::services::session_store::MemorySessionStore;
use careline::state::AppState;

// ── Mock Providers ──

struct MockExtractor;

#[async_trait]
impl SemanticExtractor for MockExtractor {
    async fn extract(
        &self,
        utterance: &str,
        _session: &Session,
    ) -> Result<SemanticExtraction, ExtractionError> {
        // Only picks up an age, leaving everything else to the keyword extractor
        let age = utterance
            .split_whitespace()
            .find(|w| w.chars().all(|c| c.is_ascii_digit()))
            .map(String::from);
        Ok(SemanticExtraction {
            intent: careline::models::Intent::AppointmentRequest,
            sentiment: careline::models::Sentiment::Neutral,
            updates: SlotUpdate {
                age,
                ..SlotUpdate::default()
            },
            response: String::new(),
        })
    }

    async fn classify_emotion(&self, _utterance: &str) -> Result<EmotionReading, ExtractionError> {
        Ok(EmotionReading::default())
    }

    async fn converse(&self, _utterance: &str) -> Result<String, ExtractionError> {
        Ok("Happy to help.".to_string())
    }
}

type Sent = Arc<Mutex<Vec<(String, OutboundMessage)>>>;

struct MockMessaging {
    sent: Sent,
    gate: Arc<Semaphore>,
}

#[async_trait]
impl MessagingProvider for MockMessaging {
    async fn send_message(&self, to: &str, message: &OutboundMessage) -> anyhow::Result<()> {
        let _permit = self.gate.acquire().await?;
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), message.clone()));
        Ok(())
    }
}

struct MockSink {
    records: Arc<Mutex<Vec<BookingRecord>>>,
}

#[async_trait]
impl BookingSink for MockSink {
    async fn deliver(&self, record: &BookingRecord) -> anyhow::Result<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

// ── Helpers ──

fn test_config(app_secret: &str) -> AppConfig {
    AppConfig {
        port: 3000,
        session_db: String::new(),
        whatsapp_token: String::new(),
        phone_number_id: "1234567890".to_string(),
        graph_api_version: "v21.0".to_string(),
        verify_token: "verify-me".to_string(),
        app_secret: app_secret.to_string(), // empty = skip signature validation
        llm_provider: "openai".to_string(),
        openai_api_key: String::new(),
        openai_model: "gpt-4o-mini".to_string(),
        openai_base_url: "http://localhost:0".to_string(),
        ollama_url: "http://localhost:11434".to_string(),
        ollama_model: "llama3.2".to_string(),
        extractor_timeout: Duration::from_secs(2),
        booking_sink_url: String::new(),
        booking_sink_secret: String::new(),
        dev_mode: true,
    }
}

struct Harness {
    state: Arc<AppState>,
    sent: Sent,
    records: Arc<Mutex<Vec<BookingRecord>>>,
}

fn harness(app_secret: &str) -> Harness {
    harness_with_gate(app_secret, Arc::new(Semaphore::new(Semaphore::MAX_PERMITS)))
}

/// Outbound sends wait on `gate`, so a test can hold replies back.
fn harness_with_gate(app_secret: &str, gate: Arc<Semaphore>) -> Harness {
    let sent: Sent = Arc::new(Mutex::new(vec![]));
    let records = Arc::new(Mutex::new(vec![]));
    let dialogue = DialogueController::new(
        Arc::new(MockExtractor),
        Arc::new(MockSink {
            records: Arc::clone(&records),
        }),
        ResponseComposer::new(Arc::new(FixedSelector(0))),
        Duration::from_secs(2),
    );
    let assistant = Assistant::new(
        Arc::new(MemorySessionStore::new()),
        Arc::new(MockMessaging {
            sent: Arc::clone(&sent),
            gate,
        }),
        dialogue,
    );
    let state = Arc::new(AppState {
        config: test_config(app_secret),
        assistant: Arc::new(assistant),
    });
    Harness {
        state,
        sent,
        records,
    }
}

fn test_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/webhook",
            get(handlers::webhook::verify).post(handlers::webhook::receive),
        )
        .route("/api/dev/message", post(handlers::dev::send_message))
        .with_state(state)
}

fn text_webhook(id: &str, body: &str) -> Value {
    webhook(json!({
        "from": "15550001111",
        "id": id,
        "timestamp": "1718700000",
        "type": "text",
        "text": { "body": body }
    }))
}

fn button_webhook(id: &str, reply_id: &str) -> Value {
    webhook(json!({
        "from": "15550001111",
        "id": id,
        "type": "interactive",
        "interactive": {
            "type": "button_reply",
            "button_reply": { "id": reply_id, "title": reply_id }
        }
    }))
}

fn webhook(message: Value) -> Value {
    json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "id": "WABA_ID",
            "changes": [{
                "field": "messages",
                "value": {
                    "messaging_product": "whatsapp",
                    "metadata": { "phone_number_id": "1234567890" },
                    "contacts": [{ "wa_id": "15550001111", "profile": { "name": "Asha Verma" } }],
                    "messages": [message]
                }
            }]
        }]
    })
}

fn post_webhook(payload: &Value, signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("Content-Type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header("X-Hub-Signature", signature);
    }
    builder.body(Body::from(payload.to_string())).unwrap()
}

fn sign(secret: &str, body: &str) -> String {
    let mut mac = Hmac::<Sha1>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body.as_bytes());
    let hex: String = mac
        .finalize()
        .into_bytes()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect();
    format!("sha1={hex}")
}

/// Posts a webhook and waits for the replies it triggered.
async fn send(h: &Harness, app: &Router, payload: Value) -> StatusCode {
    let status = app
        .clone()
        .oneshot(post_webhook(&payload, None))
        .await
        .unwrap()
        .status();
    h.state.assistant.wait_idle().await;
    status
}

async fn body_json(res: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

// ── Health Check ──

#[tokio::test]
async fn test_health() {
    let app = test_app(harness("").state);

    let res = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["status"], "ok");
}

// ── Verification Handshake ──

#[tokio::test]
async fn test_verify_echoes_challenge() {
    let app = test_app(harness("").state);

    let res = app
        .oneshot(
            Request::builder()
                .uri("/webhook?hub.mode=subscribe&hub.verify_token=verify-me&hub.challenge=424242")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"424242");
}

#[tokio::test]
async fn test_verify_wrong_token_forbidden() {
    let app = test_app(harness("").state);

    let res = app
        .oneshot(
            Request::builder()
                .uri("/webhook?hub.mode=subscribe&hub.verify_token=nope&hub.challenge=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

// ── Webhook Tests ──

#[tokio::test]
async fn test_greeting_sends_menu() {
    let h = harness("");
    let app = test_app(h.state.clone());

    assert_eq!(send(&h, &app, text_webhook("wamid.1", "hi")).await, StatusCode::OK);

    let sent = h.sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].0, "15550001111");
    assert!(sent[0].1.body().starts_with("Hey Asha!"));
    match &sent[1].1 {
        OutboundMessage::Choice { options, .. } => assert_eq!(options.len(), 3),
        other => panic!("expected menu, got {other:?}"),
    }
}

#[tokio::test]
async fn test_duplicate_delivery_ignored() {
    let h = harness("");
    let app = test_app(h.state.clone());

    send(&h, &app, text_webhook("wamid.dup", "hello")).await;
    let after_first = h.sent.lock().unwrap().len();
    assert_eq!(send(&h, &app, text_webhook("wamid.dup", "hello")).await, StatusCode::OK);

    assert_eq!(h.sent.lock().unwrap().len(), after_first);
}

#[tokio::test]
async fn test_status_callback_is_acknowledged() {
    let h = harness("");
    let app = test_app(h.state.clone());

    let payload = json!({
        "object": "whatsapp_business_account",
        "entry": [{ "changes": [{ "value": { "statuses": [{ "id": "wamid.x", "status": "read" }] } }] }]
    });
    assert_eq!(send(&h, &app, payload).await, StatusCode::OK);
    assert!(h.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_json_rejected() {
    let app = test_app(harness("").state);

    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhook")
                .body(Body::from("not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_signature_required_when_secret_set() {
    let h = harness("app-secret");
    let app = test_app(h.state.clone());
    let payload = text_webhook("wamid.sig", "hi");

    let res = app
        .clone()
        .oneshot(post_webhook(&payload, None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app
        .clone()
        .oneshot(post_webhook(&payload, Some(&sign("wrong", &payload.to_string()))))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert!(h.sent.lock().unwrap().is_empty());

    let res = app
        .oneshot(post_webhook(&payload, Some(&sign("app-secret", &payload.to_string()))))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    h.state.assistant.wait_idle().await;
    assert_eq!(h.sent.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_webhook_acknowledges_before_replying() {
    let gate = Arc::new(Semaphore::new(0));
    let h = harness_with_gate("", Arc::clone(&gate));
    let app = test_app(h.state.clone());

    let res = app
        .oneshot(post_webhook(&text_webhook("wamid.slow", "hi"), None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(h.sent.lock().unwrap().is_empty());

    gate.add_permits(2);
    h.state.assistant.wait_idle().await;
    let sent = h.sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].1.body().starts_with("Hey Asha!"));
}

#[tokio::test]
async fn test_full_booking_over_webhook() {
    let h = harness("");
    let app = test_app(h.state.clone());

    send(&h, &app, text_webhook("m1", "hi")).await;
    send(&h, &app, button_webhook("m2", "lab_test")).await;
    send(&h, &app, button_webhook("m3", "date_tomorrow")).await;
    send(&h, &app, button_webhook("m4", "time_morning")).await;
    send(&h, &app, text_webhook("m5", "42")).await;
    send(
        &h,
        &app,
        webhook(json!({
            "from": "15550001111",
            "id": "m6",
            "type": "location",
            "location": { "latitude": 12.97, "longitude": 77.59, "name": "Indiranagar Clinic Road" }
        })),
    )
    .await;
    send(&h, &app, button_webhook("m7", "blood_test")).await;

    {
        let sent = h.sent.lock().unwrap();
        let last = &sent[sent.len() - 1].1;
        assert!(matches!(last, OutboundMessage::Choice { body, .. } if body == "Confirm booking?"));
        let summary = sent[sent.len() - 2].1.body();
        assert!(summary.contains("• Age: 42"));
        assert!(summary.contains("• Sub-service: Blood Test"));
        assert!(summary.contains("• Location: Indiranagar Clinic Road"));
    }

    send(&h, &app, button_webhook("m8", "confirm_yes")).await;

    let records = h.records.lock().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].sender, "15550001111");
    assert_eq!(records[0].age, Some(42));
    assert_eq!(records[0].name.as_deref(), Some("Asha Verma"));
    assert!(records[0].location_coordinates.is_some());

    let sent = h.sent.lock().unwrap();
    assert!(sent[sent.len() - 1].1.body().contains("confirmed"));
}

// ── Dev Endpoint ──

#[tokio::test]
async fn test_dev_message_returns_replies() {
    let h = harness("");
    let app = test_app(h.state.clone());

    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/dev/message")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    json!({ "from_phone": "15559990000", "type": "text", "body": "hello" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    let messages = json["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["type"], "text");
    assert_eq!(messages[1]["type"], "choice");
}

#[tokio::test]
async fn test_dev_message_requires_sender() {
    let app = test_app(harness("").state);

    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/dev/message")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    json!({ "from_phone": " ", "type": "selection", "id": "lab_test" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
