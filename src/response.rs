//! Responses response document -> Chat Completions response.

use crate::error::{BridgeError, Result};
use crate::models::chat;
use crate::models::responses::{self as resp, Envelope, OutputItem, ResponsesUsage};
use serde_json::Value;

/// Convert a Responses API response document into a Chat Completions response.
///
/// - `id`, `created`, `model` copied when of the expected type; otherwise left at default.
/// - `object` is always `"chat.completion"`.
/// - All `message` items merge into one assistant message: their text parts are
///   concatenated in order with no separator. Each `function_call` item becomes a
///   `ToolCall`, in order.
/// - Exactly one choice (index 0) is produced when `output` is an array; none when
///   `output` is absent.
/// - `finish_reason` is read from the top level of the document.
pub fn responses_to_chat_response(doc: &Value) -> chat::ChatCompletionResponse {
    let envelope = Envelope::decode(doc);

    let choices = resp::decode_output(doc)
        .map(|items| vec![assemble_choice(&items, envelope.finish_reason.clone())])
        .unwrap_or_default();

    chat::ChatCompletionResponse {
        id: envelope.id.unwrap_or_default(),
        object: "chat.completion".to_string(),
        created: envelope.created.unwrap_or_default(),
        model: envelope.model.unwrap_or_default(),
        choices,
        usage: ResponsesUsage::decode(doc).map(|u| map_usage(&u)),
    }
}

/// Decode a raw upstream body and convert it.
///
/// The body must be JSON; unlike the document mapper this can fail.
pub fn responses_body_to_chat_response(body: &[u8]) -> Result<chat::ChatCompletionResponse> {
    let doc: Value = serde_json::from_slice(body).map_err(BridgeError::Decode)?;
    Ok(responses_to_chat_response(&doc))
}

fn assemble_choice(items: &[OutputItem], finish_reason: Option<String>) -> chat::ChatChoice {
    let mut content = String::new();
    let mut tool_calls = Vec::new();

    for item in items {
        match item {
            OutputItem::Message(message) => {
                for text in &message.texts {
                    content.push_str(text);
                }
            }
            OutputItem::FunctionCall(call) => tool_calls.push(chat::ToolCall::function(
                call.call_id.clone().unwrap_or_default(),
                call.name.clone().unwrap_or_default(),
                call.arguments.clone().unwrap_or_default(),
            )),
            OutputItem::FunctionCallOutput(_) | OutputItem::Ignored => {}
        }
    }

    chat::ChatChoice {
        index: 0,
        message: chat::ChatResponseMessage {
            role: "assistant".to_string(),
            content: (!content.is_empty()).then_some(content),
            tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
        },
        finish_reason,
        logprobs: None,
    }
}

/// Map Responses usage onto Chat usage. Detail blocks appear only for strictly positive counts.
pub(crate) fn map_usage(usage: &ResponsesUsage) -> chat::ChatUsage {
    let prompt_tokens = usage.input_tokens.unwrap_or_default();
    let completion_tokens = usage.output_tokens.unwrap_or_default();

    chat::ChatUsage {
        prompt_tokens,
        completion_tokens,
        total_tokens: prompt_tokens.saturating_add(completion_tokens),
        prompt_tokens_details: usage
            .cache_read_input_tokens
            .filter(|n| *n > 0)
            .map(|cached_tokens| chat::PromptTokensDetails { cached_tokens }),
        completion_tokens_details: usage
            .reasoning_tokens
            .filter(|n| *n > 0)
            .map(|reasoning_tokens| chat::CompletionTokensDetails { reasoning_tokens }),
    }
}
