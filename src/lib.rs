#![forbid(unsafe_code)]
#![doc = r#"
Chat Bridge

Let a client speaking the OpenAI Chat Completions schema talk to a backend that
implements the Responses schema.

Crate highlights
- Requests: `to_responses_request(&ChatCompletionRequest)` builds the Responses request.
- Responses: `responses_to_chat_response(&serde_json::Value)` assembles a single-choice Chat response.
- Streams: `map_stream_line(&str)` rewrites one `data: {...}` event line into a Chat chunk line.
- HTTP server (in `server`): `/convert*` helpers and a `/v1/chat/completions` bridge.

Modules
- `models`: Data structures for Chat and Responses.
- `conversion`: Chat request -> Responses request, content normalization.
- `response`: Responses response -> Chat response.
- `stream`: Responses event stream -> Chat chunk stream.
- `server`: Axum router/handlers (the binary uses this).
- `util`: Shared helpers (tracing, env, upstream calls, CORS).

All mappers are pure: no I/O, no shared state, safe to call from any thread.
"#]

pub mod conversion;
pub mod error;
pub mod models;
pub mod response;
pub mod server;
pub mod stream;
pub mod util;

pub use crate::conversion::{normalize_content, to_responses_request};
pub use crate::error::{BridgeError, Result};
pub use crate::response::{responses_body_to_chat_response, responses_to_chat_response};
pub use crate::stream::{map_stream_body, map_stream_line, SseLineBuffer};

// Re-export model namespaces for convenience (downstream users can do `use chat_bridge::chat`).
pub use crate::models::{chat, responses};
