#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use digisathi_relay::{config::Config, routes, state::AppState};
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tower::util::ServiceExt;

/// What the fake completions endpoint answers with.
#[derive(Clone)]
pub enum Canned {
    Json(StatusCode, Value),
    Raw(StatusCode, &'static str),
    Stall(Duration, Value),
}

pub fn ok_body(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}],
        "usage": {"prompt_tokens": 42, "completion_tokens": 5, "total_tokens": 47}
    })
}

#[derive(Clone)]
struct FakeState {
    canned: Arc<Canned>,
    hits: Arc<AtomicUsize>,
    payloads: Arc<Mutex<Vec<Value>>>,
    auth: Arc<Mutex<Vec<String>>>,
}

pub struct FakeUpstream {
    pub base: String,
    hits: Arc<AtomicUsize>,
    payloads: Arc<Mutex<Vec<Value>>>,
    auth: Arc<Mutex<Vec<String>>>,
}

impl FakeUpstream {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub async fn payloads(&self) -> Vec<Value> {
        self.payloads.lock().await.clone()
    }

    pub async fn auth_headers(&self) -> Vec<String> {
        self.auth.lock().await.clone()
    }
}

async fn completions(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    state.payloads.lock().await.push(body);
    if let Some(auth) = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        state.auth.lock().await.push(auth.to_string());
    }

    match state.canned.as_ref() {
        Canned::Json(status, value) => (*status, Json(value.clone())).into_response(),
        Canned::Raw(status, text) => (*status, *text).into_response(),
        Canned::Stall(delay, value) => {
            tokio::time::sleep(*delay).await;
            (StatusCode::OK, Json(value.clone())).into_response()
        }
    }
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

pub async fn spawn_upstream(canned: Canned) -> FakeUpstream {
    let state = FakeState {
        canned: Arc::new(canned),
        hits: Arc::new(AtomicUsize::new(0)),
        payloads: Arc::new(Mutex::new(Vec::new())),
        auth: Arc::new(Mutex::new(Vec::new())),
    };
    let upstream = FakeUpstream {
        base: String::new(),
        hits: state.hits.clone(),
        payloads: state.payloads.clone(),
        auth: state.auth.clone(),
    };

    let app = Router::new()
        .route("/v1/chat/completions", post(completions))
        .with_state(state);
    let addr = serve(app).await;

    FakeUpstream { base: format!("http://{addr}/v1"), ..upstream }
}

/// An address nothing is listening on.
pub async fn closed_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub fn test_config(upstream_base: &str, timeout: Duration, feedback_path: PathBuf) -> Config {
    let mut config = Config::for_upstream("sk-test", upstream_base);
    config.upstream_timeout = timeout;
    config.feedback_path = feedback_path;
    config
}

pub fn relay_app(config: Config) -> Router {
    let state = Arc::new(AppState::new(config).unwrap());
    routes::app(state)
}

/// Run the relay on a real socket, for clients that speak HTTP.
pub async fn serve_relay(config: Config) -> SocketAddr {
    serve(relay_app(config)).await
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, body)
}

pub async fn post_json(app: &Router, uri: &str, body: impl Into<String>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.into()))
        .unwrap();
    let (status, _, body) = send(app, request).await;
    (status, body)
}
