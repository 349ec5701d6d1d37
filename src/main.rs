use anyhow::Context;
use chat_bridge::server::build_router;
use chat_bridge::util::{env_bind_addr, init_tracing, upstream_base_url};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    match upstream_base_url() {
        Some(url) => tracing::info!("Upstream Responses backend: {}", url),
        None => tracing::warn!(
            "No UPSTREAM_BASE_URL/OPENAI_BASE_URL set; /v1/chat/completions will answer 503"
        ),
    }

    let addr = env_bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("chat-bridge listening on http://{}", addr);

    axum::serve(listener, build_router())
        .await
        .context("server error")?;
    Ok(())
}
