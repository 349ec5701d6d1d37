#![allow(dead_code)]

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// What the stub Responses backend answers with.
#[derive(Clone)]
pub enum UpstreamReply {
    Json(serde_json::Value),
    EventStream(String),
    Error {
        status: StatusCode,
        body: serde_json::Value,
    },
}

/// Minimal Responses-style backend bound to an ephemeral local port.
pub struct UpstreamStub {
    pub base_url: String,
    requests: Arc<Mutex<Vec<serde_json::Value>>>,
    auth_headers: Arc<Mutex<Vec<Option<String>>>>,
    shutdown: Option<oneshot::Sender<()>>,
}

#[derive(Clone)]
struct StubState {
    reply: UpstreamReply,
    requests: Arc<Mutex<Vec<serde_json::Value>>>,
    auth_headers: Arc<Mutex<Vec<Option<String>>>>,
}

impl UpstreamStub {
    pub async fn start(reply: UpstreamReply) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let auth_headers = Arc::new(Mutex::new(Vec::new()));
        let state = StubState {
            reply,
            requests: requests.clone(),
            auth_headers: auth_headers.clone(),
        };

        let router = Router::new()
            .route("/v1/responses", post(responses_handler))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub upstream");
        let addr = listener.local_addr().expect("stub upstream local addr");
        let (tx, rx) = oneshot::channel::<()>();

        let server = axum::serve(listener, router.into_make_service());
        tokio::spawn(async move {
            tokio::select! {
                res = server => {
                    if let Err(err) = res {
                        eprintln!("Stub upstream server error: {err:?}");
                    }
                }
                _ = rx => {}
            }
        });

        UpstreamStub {
            base_url: format!("http://{}/v1", addr),
            requests,
            auth_headers,
            shutdown: Some(tx),
        }
    }

    /// Request bodies received so far, in arrival order.
    pub fn requests(&self) -> Vec<serde_json::Value> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn auth_headers(&self) -> Vec<Option<String>> {
        self.auth_headers.lock().expect("auth lock").clone()
    }
}

impl Drop for UpstreamStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn responses_handler(
    State(state): State<StubState>,
    headers: axum::http::HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    state.requests.lock().expect("requests lock").push(body);
    state.auth_headers.lock().expect("auth lock").push(
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string()),
    );

    match state.reply {
        UpstreamReply::Json(v) => Json(v).into_response(),
        UpstreamReply::EventStream(text) => {
            ([(header::CONTENT_TYPE, "text/event-stream")], text).into_response()
        }
        UpstreamReply::Error { status, body } => (status, Json(body)).into_response(),
    }
}
