use axum::{
    body::Body,
    extract::State,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use http::{header, StatusCode};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::conversion::to_responses_request;
use crate::error::BridgeError;
use crate::models::chat::ChatCompletionRequest;
use crate::response::{responses_body_to_chat_response, responses_to_chat_response};
use crate::stream::{map_stream_body, remap_event_stream};
use crate::util::{
    cors_layer_from_env, error_response, post_responses, relay_upstream_error, AppState,
};

const ROUTES: [&str; 5] = [
    "/status",
    "/convert",
    "/convert/response",
    "/convert/stream",
    "/v1/chat/completions",
];

/// Build the Axum router with state taken from the environment.
pub fn build_router() -> Router {
    build_router_with_state(AppState::from_env())
}

/// Build the Axum router around an explicit state (tests point it at a stub upstream).
pub fn build_router_with_state(state: AppState) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/convert", post(convert))
        .route("/convert/response", post(convert_response))
        .route("/convert/stream", post(convert_stream))
        .route("/v1/chat/completions", post(chat_completions))
        .with_state(Arc::new(state))
        .layer(cors_layer_from_env())
        .layer(TraceLayer::new_for_http())
}

/// Service status endpoint exposing routes and whether an upstream is configured.
async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "chat-bridge",
        "version": env!("CARGO_PKG_VERSION"),
        "upstream_configured": state.upstream_base_url.is_some(),
        "routes": ROUTES,
    }))
}

fn bridge_error_response(err: &BridgeError) -> Response {
    let status = match err {
        BridgeError::Config { .. } => StatusCode::SERVICE_UNAVAILABLE,
        BridgeError::Decode(_) | BridgeError::Upstream(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, &err.to_string())
}

/// Convert a Chat Completions request into a Responses request document.
async fn convert(Json(req): Json<ChatCompletionRequest>) -> Response {
    match to_responses_request(&req).to_document() {
        Ok(doc) => Json(doc).into_response(),
        Err(e) => bridge_error_response(&e),
    }
}

/// Convert a Responses response document into a Chat Completions response.
async fn convert_response(Json(doc): Json<serde_json::Value>) -> impl IntoResponse {
    Json(responses_to_chat_response(&doc))
}

/// Convert a buffered Responses event-stream body into Chat chunk lines.
async fn convert_stream(body: String) -> Response {
    match map_stream_body(&body) {
        Ok(out) => ([(header::CONTENT_TYPE, "text/event-stream")], out).into_response(),
        Err(e) => bridge_error_response(&e),
    }
}

/// Full bridge: map the Chat request, call the Responses backend, map the answer back.
/// - Non-streaming: JSON roundtrip through the response mapper
/// - Streaming: upstream events remapped line by line as they arrive
async fn chat_completions(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatCompletionRequest>,
) -> Response {
    let stream = req.stream.unwrap_or(false);

    let url = match state.responses_url() {
        Ok(u) => u,
        Err(e) => return bridge_error_response(&e),
    };
    let payload = match to_responses_request(&req).to_document() {
        Ok(v) => v,
        Err(e) => return bridge_error_response(&e),
    };

    let upstream = match post_responses(
        &state.http,
        &url,
        &payload,
        state.api_key.as_deref(),
        stream,
    )
    .await
    {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(error = %e, "upstream request failed");
            return bridge_error_response(&e);
        }
    };

    if !upstream.status().is_success() {
        return relay_upstream_error(upstream).await;
    }

    if stream {
        let body = Body::from_stream(remap_event_stream(Box::pin(upstream.bytes_stream())));
        return (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/event-stream"),
                (header::CACHE_CONTROL, "no-cache"),
            ],
            body,
        )
            .into_response();
    }

    let bytes = match upstream.bytes().await {
        Ok(b) => b,
        Err(e) => return bridge_error_response(&BridgeError::Upstream(e)),
    };
    match responses_body_to_chat_response(&bytes) {
        Ok(chat) => Json(chat).into_response(),
        Err(e) => bridge_error_response(&e),
    }
}
