//! Data models for the Chat Completions and Responses APIs.
//!
//! This module groups two submodules:
//! - `chat`: Strongly shaped Chat Completions request, response and stream-chunk types.
//! - `responses`: The Responses request document plus lenient decoding of Responses
//!   response documents and stream events.
//!
//! The mapping logic lives in `crate::conversion` (requests), `crate::response`
//! (whole responses) and `crate::stream` (stream lines).

pub mod chat;
pub mod responses;

// Optional convenience re-exports for downstream users.
pub use chat::{
    ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, FunctionDef,
    MessageContent, Role, ToolCall, ToolDefinition,
};
pub use responses::{ContentPart, InputItem, OutputItem, ResponsesRequest, ResponsesTool};
