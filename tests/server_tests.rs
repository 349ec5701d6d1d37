/// Router tests: conversion endpoints in-process, and the chat-completions bridge
/// against a stub Responses backend.
mod common {
    pub mod upstream_stub;
}

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chat_bridge::server::build_router_with_state;
use chat_bridge::util::AppState;
use common::upstream_stub::{UpstreamReply, UpstreamStub};
use serde_json::{json, Value};
use tower::ServiceExt;

fn router(upstream_base_url: Option<String>, api_key: Option<&str>) -> Router {
    build_router_with_state(AppState {
        http: reqwest::Client::new(),
        upstream_base_url,
        api_key: api_key.map(|k| k.to_string()),
    })
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Option<String>, String) {
    let resp = app.oneshot(req).await.expect("router response");
    let status = resp.status();
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    (status, content_type, String::from_utf8_lossy(&bytes).into_owned())
}

fn post_json(path: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

#[tokio::test]
async fn status_reports_routes() {
    let req = Request::builder()
        .uri("/status")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(router(None, None), req).await;
    assert_eq!(status, StatusCode::OK);
    let v: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["name"], json!("chat-bridge"));
    assert_eq!(v["upstream_configured"], json!(false));
    assert!(v["routes"]
        .as_array()
        .unwrap()
        .contains(&json!("/v1/chat/completions")));
}

#[tokio::test]
async fn convert_endpoint_maps_request() {
    let (status, _, body) = send(
        router(None, None),
        post_json(
            "/convert",
            &json!({"model": "m", "messages": [{"role": "user", "content": "hi"}]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let v: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(
        v,
        json!({
            "model": "m",
            "input": [{"type": "message", "role": "user", "content": [{"type": "text", "text": "hi"}]}]
        })
    );
}

#[tokio::test]
async fn convert_response_endpoint_maps_document() {
    let (status, _, body) = send(
        router(None, None),
        post_json(
            "/convert/response",
            &json!({"output": [{"type": "message", "content": [{"type": "text", "text": "hello"}]}]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let v: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["object"], json!("chat.completion"));
    assert_eq!(v["choices"][0]["message"]["content"], json!("hello"));
}

#[tokio::test]
async fn convert_stream_endpoint_maps_lines() {
    let input = "data: {\"output\":[{\"type\":\"message\",\"content\":[{\"type\":\"text\",\"text\":\"x\"}]}]}\n\ndata: [DONE]\n";
    let req = Request::builder()
        .method("POST")
        .uri("/convert/stream")
        .body(Body::from(input))
        .unwrap();
    let (status, content_type, body) = send(router(None, None), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/event-stream"));
    let lines: Vec<&str> = body.split('\n').collect();
    assert!(lines[0].contains("\"chat.completion.chunk\""));
    assert_eq!(&lines[1..], ["", "data: [DONE]", ""]);
}

#[tokio::test]
async fn bridge_without_upstream_is_unavailable() {
    let (status, _, body) = send(
        router(None, None),
        post_json(
            "/v1/chat/completions",
            &json!({"model": "m", "messages": [{"role": "user", "content": "hi"}]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let v: Value = serde_json::from_str(&body).unwrap();
    assert!(v["error"]["message"]
        .as_str()
        .unwrap()
        .contains("UPSTREAM_BASE_URL"));
}

#[tokio::test]
async fn bridge_non_streaming_roundtrip() {
    let stub = UpstreamStub::start(UpstreamReply::Json(json!({
        "id": "resp_1",
        "created": 1_700_000_000,
        "model": "gpt-4o-mini",
        "output": [
            {"type": "message", "role": "assistant", "content": [{"type": "text", "text": "Sure."}]},
            {"type": "function_call", "call_id": "call_1", "name": "lookup", "arguments": "{}"}
        ],
        "finish_reason": "tool_calls",
        "usage": {"input_tokens": 9, "output_tokens": 4, "cache_read_input_tokens": 8}
    })))
    .await;

    let (status, _, body) = send(
        router(Some(stub.base_url.clone()), Some("sk-test")),
        post_json(
            "/v1/chat/completions",
            &json!({
                "model": "gpt-4o-mini",
                "max_tokens": 32,
                "messages": [{"role": "user", "content": "look it up"}]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let v: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(
        v,
        json!({
            "id": "resp_1",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": "Sure.",
                    "tool_calls": [{"id": "call_1", "type": "function", "function": {"name": "lookup", "arguments": "{}"}}]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {
                "prompt_tokens": 9,
                "completion_tokens": 4,
                "total_tokens": 13,
                "prompt_tokens_details": {"cached_tokens": 8}
            }
        })
    );

    let sent = stub.requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["max_tokens"], json!(32));
    assert_eq!(sent[0]["input"][0]["content"][0]["text"], json!("look it up"));
    assert_eq!(stub.auth_headers(), vec![Some("Bearer sk-test".to_string())]);
}

#[tokio::test]
async fn bridge_streaming_remaps_events() {
    let upstream_body = [
        r#"data: {"id":"resp_1","output":[{"type":"message","role":"assistant","content":[{"type":"text","text":"Hi"}]}]}"#,
        "",
        r#"data: {"id":"resp_1","output":[],"finish_reason":"stop","usage":{"input_tokens":2,"output_tokens":1}}"#,
        "",
        "data: [DONE]",
        "",
    ]
    .join("\n");
    let stub = UpstreamStub::start(UpstreamReply::EventStream(upstream_body)).await;

    let (status, content_type, body) = send(
        router(Some(stub.base_url.clone()), None),
        post_json(
            "/v1/chat/completions",
            &json!({"model": "m", "stream": true, "messages": [{"role": "user", "content": "hey"}]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/event-stream"));

    let data_lines: Vec<&str> = body.lines().filter(|l| !l.is_empty()).collect();
    assert_eq!(data_lines.len(), 3);
    let first: Value = serde_json::from_str(data_lines[0].strip_prefix("data: ").unwrap()).unwrap();
    assert_eq!(first["choices"][0]["delta"], json!({"role": "assistant", "content": "Hi"}));
    let last: Value = serde_json::from_str(data_lines[1].strip_prefix("data: ").unwrap()).unwrap();
    assert_eq!(last["choices"][0]["finish_reason"], json!("stop"));
    assert_eq!(last["usage"]["total_tokens"], json!(3));
    assert_eq!(data_lines[2], "data: [DONE]");

    let sent = stub.requests();
    assert_eq!(sent[0]["stream"], json!(true));
    assert_eq!(stub.auth_headers(), vec![None]);
}

#[tokio::test]
async fn bridge_relays_upstream_errors() {
    let stub = UpstreamStub::start(UpstreamReply::Error {
        status: StatusCode::TOO_MANY_REQUESTS,
        body: json!({"error": {"message": "slow down"}}),
    })
    .await;

    let (status, _, body) = send(
        router(Some(stub.base_url.clone()), None),
        post_json(
            "/v1/chat/completions",
            &json!({"model": "m", "messages": [{"role": "user", "content": "hi"}]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    let v: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["error"]["message"], json!("slow down"));
}
