use axum::response::{IntoResponse, Response};
use http::StatusCode;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize dotenv and structured tracing based on RUST_LOG.
/// - Supports explicit env file paths via ENV_FILE, DOTENV_PATH
/// - Falls back to default .env discovery
/// - Logs the source used
pub fn init_tracing() {
    let mut env_source: String = "none".into();
    for key in ["ENV_FILE", "DOTENV_PATH"] {
        if let Ok(p) = std::env::var(key) {
            let p = p.trim();
            if !p.is_empty()
                && std::path::Path::new(p).is_file()
                && dotenvy::from_filename(p).is_ok()
            {
                env_source = format!("{p} ({key})");
                break;
            }
        }
    }

    if env_source == "none" {
        if let Ok(path) = dotenvy::dotenv() {
            env_source = path.display().to_string();
        }
    }

    // Initialize tracing (respects RUST_LOG potentially provided by the env file)
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=info".into());
    let subscriber = fmt().with_env_filter(EnvFilter::new(filter)).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    tracing::info!("Environment loaded from: {}", env_source);
}

/// Get the bind address for the HTTP server from env or default to 0.0.0.0:8088.
pub fn env_bind_addr() -> String {
    std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8088".into())
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn truthy_env(key: &str) -> bool {
    std::env::var(key)
        .map(|v| v.trim().to_ascii_lowercase())
        .map(|v| v == "1" || v == "true" || v == "yes" || v == "on")
        .unwrap_or(false)
}

/// Resolve the Responses-style backend base URL (UPSTREAM_BASE_URL, then OPENAI_BASE_URL).
/// A trailing slash is stripped.
pub fn upstream_base_url() -> Option<String> {
    non_empty_env("UPSTREAM_BASE_URL")
        .or_else(|| non_empty_env("OPENAI_BASE_URL"))
        .map(|u| u.trim_end_matches('/').to_string())
}

/// Shared application state used by the HTTP server and handlers.
#[derive(Clone)]
pub struct AppState {
    pub http: reqwest::Client,
    /// Base URL of the Responses-style backend; the bridge posts to `{base}/responses`.
    pub upstream_base_url: Option<String>,
    /// Bearer forwarded to the backend when set.
    pub api_key: Option<String>,
}

impl AppState {
    pub fn from_env() -> Self {
        Self {
            http: build_http_client_from_env(),
            upstream_base_url: upstream_base_url(),
            api_key: non_empty_env("OPENAI_API_KEY"),
        }
    }

    /// Full URL of the upstream Responses endpoint.
    pub fn responses_url(&self) -> crate::error::Result<String> {
        self.upstream_base_url
            .as_deref()
            .map(|base| format!("{base}/responses"))
            .ok_or_else(|| {
                crate::error::BridgeError::config("UPSTREAM_BASE_URL (or OPENAI_BASE_URL) not set")
            })
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Build an HTTP client honoring proxy and timeout environment variables.
///
/// Environment:
/// - CHAT_BRIDGE_NO_PROXY = 1|true|yes|on  -> disable all proxies
/// - CHAT_BRIDGE_PROXY_URL = <url>         -> proxy for all schemes
/// - CHAT_BRIDGE_HTTP_TIMEOUT_SECONDS      -> overall request timeout (u64)
pub fn build_http_client_from_env() -> reqwest::Client {
    let mut builder = reqwest::Client::builder();

    if let Ok(secs) = std::env::var("CHAT_BRIDGE_HTTP_TIMEOUT_SECONDS") {
        if let Ok(n) = secs.trim().parse::<u64>() {
            builder = builder.timeout(std::time::Duration::from_secs(n));
        }
    }

    if truthy_env("CHAT_BRIDGE_NO_PROXY") {
        builder = builder.no_proxy();
    } else if let Some(url) = non_empty_env("CHAT_BRIDGE_PROXY_URL") {
        match reqwest::Proxy::all(&url) {
            Ok(p) => builder = builder.proxy(p),
            Err(e) => tracing::warn!(error = %e, "ignoring invalid CHAT_BRIDGE_PROXY_URL"),
        }
    }

    builder = builder.user_agent(format!("chat-bridge/{}", env!("CARGO_PKG_VERSION")));

    builder.build().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "falling back to default HTTP client");
        reqwest::Client::new()
    })
}

/// Build a JSON error response with the given HTTP status and message.
pub fn error_response(status: StatusCode, msg: &str) -> Response {
    let body = serde_json::json!({ "error": { "message": msg } });
    (status, axum::Json(body)).into_response()
}

/// POST a Responses request document upstream.
///
/// Streaming requests ask for `text/event-stream`. No retries are attempted.
pub async fn post_responses(
    client: &reqwest::Client,
    url: &str,
    payload: &serde_json::Value,
    bearer: Option<&str>,
    stream: bool,
) -> crate::error::Result<reqwest::Response> {
    let accept = if stream {
        "text/event-stream"
    } else {
        "application/json"
    };
    let mut rb = client
        .post(url)
        .header(http::header::ACCEPT, accept)
        .json(payload);
    if let Some(k) = bearer.filter(|k| !k.is_empty()) {
        rb = rb.bearer_auth(k);
    }
    tracing::debug!(url = %url, stream, has_bearer = bearer.is_some(), "posting upstream");
    Ok(rb.send().await?)
}

/// Relay a non-success upstream response verbatim (status and body).
pub async fn relay_upstream_error(resp: reqwest::Response) -> Response {
    let status = StatusCode::from_u16(resp.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let bytes = resp.bytes().await.unwrap_or_default();
    tracing::warn!(status = %status, "upstream returned an error status");
    (
        status,
        [(http::header::CONTENT_TYPE, "application/json")],
        bytes,
    )
        .into_response()
}

/// Build a CORS layer from environment variables.
///
/// Environment variables:
/// - CORS_ALLOWED_ORIGINS: "*" or comma-separated origins (e.g., "https://a.com, https://b.com")
/// - CORS_ALLOWED_METHODS: "*" or comma-separated methods (e.g., "GET,POST,OPTIONS")
/// - CORS_ALLOWED_HEADERS: "*" or comma-separated request header names
///
/// Defaults are permissive (Any) when not configured.
pub fn cors_layer_from_env() -> tower_http::cors::CorsLayer {
    use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};

    fn list<T>(key: &str, parse: impl Fn(&str) -> Option<T>) -> Option<Vec<T>> {
        let raw = std::env::var(key).ok()?;
        let raw = raw.trim();
        if raw == "*" {
            return None;
        }
        let vals: Vec<T> = raw
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .filter_map(parse)
            .collect();
        (!vals.is_empty()).then_some(vals)
    }

    let mut layer = CorsLayer::new();

    layer = match list("CORS_ALLOWED_ORIGINS", |p| http::HeaderValue::from_str(p).ok()) {
        Some(vals) => layer.allow_origin(AllowOrigin::list(vals)),
        None => layer.allow_origin(Any),
    };
    layer = match list("CORS_ALLOWED_METHODS", |p| {
        http::Method::from_bytes(p.to_ascii_uppercase().as_bytes()).ok()
    }) {
        Some(vals) => layer.allow_methods(AllowMethods::list(vals)),
        None => layer.allow_methods(Any),
    };
    layer = match list("CORS_ALLOWED_HEADERS", |p| {
        http::header::HeaderName::try_from(p).ok()
    }) {
        Some(vals) => layer.allow_headers(AllowHeaders::list(vals)),
        None => layer.allow_headers(Any),
    };

    layer
}
