//! Completion client tests against a local stub endpoint

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};

use voxkb::{CompletionClient, Credential, Error, HttpCompletionClient, Locale, PromptBuilder};

#[derive(Clone, Default)]
struct Seen(Arc<Mutex<Vec<(Option<String>, Value)>>>);

impl Seen {
    fn requests(&self) -> Vec<(Option<String>, Value)> {
        self.0.lock().unwrap().clone()
    }
}

async fn answer(State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);
    seen.0.lock().unwrap().push((auth, body));

    Json(json!({
        "choices": [{ "message": { "role": "assistant", "content": "Kilenctől ötig." } }]
    }))
}

async fn no_choices() -> Json<Value> {
    Json(json!({ "choices": [] }))
}

async fn not_json() -> &'static str {
    "<html>gateway</html>"
}

async fn server_error() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(2)).await;
    Json(json!({ "choices": [{ "message": { "content": "late" } }] }))
}

async fn spawn_stub() -> (SocketAddr, Seen) {
    let seen = Seen::default();
    let app = Router::new()
        .route("/ok", post(answer))
        .route("/empty", post(no_choices))
        .route("/text", post(not_json))
        .route("/fail", post(server_error))
        .route("/slow", post(slow))
        .with_state(seen.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, seen)
}

fn client(addr: SocketAddr, path: &str, timeout: Duration) -> HttpCompletionClient {
    HttpCompletionClient::new(format!("http://{addr}{path}"), "gpt-4o-mini", timeout).unwrap()
}

fn credential() -> Credential {
    Credential::new("ghp_secret").unwrap()
}

#[tokio::test]
async fn test_request_shape_and_reply() {
    let (addr, seen) = spawn_stub().await;
    let request = PromptBuilder::new(Locale::Hungarian).build("nyitvatartás", "9-17");

    let reply = client(addr, "/ok", Duration::from_secs(5))
        .complete(&request, Some(&credential()))
        .await
        .unwrap();
    assert_eq!(reply, "Kilenctől ötig.");

    let requests = seen.requests();
    assert_eq!(requests.len(), 1);
    let (auth, body) = &requests[0];

    assert_eq!(auth.as_deref(), Some("Bearer ghp_secret"));
    assert_eq!(body["model"], "gpt-4o-mini");
    assert!((body["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
    assert_eq!(body["max_tokens"], 200);

    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "system");
    assert_eq!(messages[0]["content"], request.system_prompt.as_str());
    assert_eq!(messages[1]["role"], "user");
    assert_eq!(messages[1]["content"], "nyitvatartás");
}

#[tokio::test]
async fn test_missing_credential_sends_nothing() {
    let (addr, seen) = spawn_stub().await;
    let request = PromptBuilder::new(Locale::English).build("hours", "9-5");

    let err = client(addr, "/ok", Duration::from_secs(5))
        .complete(&request, None)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::MissingCredential));
    assert!(seen.requests().is_empty());
}

#[tokio::test]
async fn test_server_error_is_transport() {
    let (addr, _) = spawn_stub().await;
    let request = PromptBuilder::new(Locale::English).build("hours", "9-5");

    let err = client(addr, "/fail", Duration::from_secs(5))
        .complete(&request, Some(&credential()))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Transport(_)));
}

#[tokio::test]
async fn test_empty_choices_is_malformed() {
    let (addr, _) = spawn_stub().await;
    let request = PromptBuilder::new(Locale::English).build("hours", "9-5");

    let err = client(addr, "/empty", Duration::from_secs(5))
        .complete(&request, Some(&credential()))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::MalformedResponse(_)));
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let (addr, _) = spawn_stub().await;
    let request = PromptBuilder::new(Locale::English).build("hours", "9-5");

    let err = client(addr, "/text", Duration::from_secs(5))
        .complete(&request, Some(&credential()))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::MalformedResponse(_)));
}

#[tokio::test]
async fn test_timeout_is_transport() {
    let (addr, _) = spawn_stub().await;
    let request = PromptBuilder::new(Locale::English).build("hours", "9-5");

    let err = client(addr, "/slow", Duration::from_millis(100))
        .complete(&request, Some(&credential()))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Transport(_)));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_transport() {
    // Port 9 (discard) on localhost is closed in test environments
    let request = PromptBuilder::new(Locale::English).build("hours", "9-5");
    let client =
        HttpCompletionClient::new("http://127.0.0.1:9/chat", "gpt-4o-mini", Duration::from_secs(2))
            .unwrap();

    let err = client.complete(&request, Some(&credential())).await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
}
