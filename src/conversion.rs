use crate::models::chat;
use crate::models::responses::{self as resp, ContentPart, InputItem};

/// Convert an OpenAI Chat Completions request into a Responses API request.
///
/// Mapping highlights:
/// - model, stream, store: copied when present.
/// - messages -> `input` items, in order:
///   system -> `message` with a single text part (only for a non-empty string);
///   user / plain assistant -> `message` with normalized content;
///   assistant with tool calls -> one `function_call` per call, content dropped;
///   tool -> `function_call_output` keyed by `tool_call_id`.
/// - max_tokens wins over max_completion_tokens; both land on `max_tokens`.
/// - temperature, top_p, penalties, stop, tool_choice: forwarded verbatim.
/// - tools: flattened to `{ type, name, description?, parameters?, strict? }`.
///
/// The mapping is total; encoding the result can still fail (see
/// [`resp::ResponsesRequest::to_document`]).
pub fn to_responses_request(src: &chat::ChatCompletionRequest) -> resp::ResponsesRequest {
    let tools = src
        .tools
        .as_ref()
        .filter(|ts| !ts.is_empty())
        .map(|ts| ts.iter().map(map_tool).collect::<Vec<_>>());

    resp::ResponsesRequest {
        model: src.model.clone(),
        input: map_messages(&src.messages),
        stream: src.stream,
        store: src.store,
        // First match wins; the two limits are never merged.
        max_tokens: src.max_tokens.or(src.max_completion_tokens),
        temperature: src.temperature,
        top_p: src.top_p,
        presence_penalty: src.presence_penalty,
        frequency_penalty: src.frequency_penalty,
        stop: src.stop.clone(),
        tools,
        tool_choice: src.tool_choice.clone(),
    }
}

fn map_messages(src: &[chat::ChatMessage]) -> Vec<InputItem> {
    src.iter().flat_map(map_message).collect()
}

fn map_message(m: &chat::ChatMessage) -> Vec<InputItem> {
    match m.role {
        chat::Role::System => {
            let content = m
                .content
                .as_ref()
                .and_then(|c| c.as_text())
                .filter(|s| !s.is_empty())
                .map(|s| vec![resp::text_part(s)]);
            vec![InputItem::Message {
                role: m.role.as_str().to_string(),
                content,
            }]
        }
        chat::Role::Assistant if m.tool_calls.as_ref().is_some_and(|tc| !tc.is_empty()) => m
            .tool_calls
            .iter()
            .flatten()
            .map(|call| InputItem::FunctionCall {
                call_id: call.id.clone(),
                name: call.function.name.clone(),
                arguments: call.function.arguments.clone(),
            })
            .collect(),
        chat::Role::User | chat::Role::Assistant => vec![InputItem::Message {
            role: m.role.as_str().to_string(),
            content: normalize_content(m.content.as_ref()),
        }],
        chat::Role::Tool => {
            let output = m.content.as_ref().and_then(|c| c.as_text()).map(String::from);
            if output.is_none() && m.content.is_some() {
                tracing::debug!(
                    call_id = m.tool_call_id.as_deref().unwrap_or_default(),
                    "dropping non-string tool message content"
                );
            }
            vec![InputItem::FunctionCallOutput {
                call_id: m.tool_call_id.clone().unwrap_or_default(),
                output,
            }]
        }
        chat::Role::Unknown => {
            tracing::debug!("dropping message with unrecognized role");
            Vec::new()
        }
    }
}

/// Normalize Chat message content into Responses content parts.
///
/// - absent -> `None`
/// - plain string -> `[{ "type": "text", "text": <string> }]`
/// - array -> every element that is a JSON object, in order; anything else is dropped
/// - any other shape -> `None`
pub fn normalize_content(content: Option<&chat::MessageContent>) -> Option<Vec<ContentPart>> {
    match content? {
        chat::MessageContent::Text(s) => Some(vec![resp::text_part(s)]),
        chat::MessageContent::Parts(parts) => Some(
            parts
                .iter()
                .filter_map(|p| p.as_object().cloned())
                .collect(),
        ),
        chat::MessageContent::Other(_) => None,
    }
}

fn map_tool(t: &chat::ToolDefinition) -> resp::ResponsesTool {
    match t {
        chat::ToolDefinition::Function { function } => resp::ResponsesTool::Function {
            name: function.name.clone(),
            description: function.description.clone().filter(|d| !d.is_empty()),
            parameters: function.parameters.clone().filter(|p| !p.is_null()),
            strict: function.strict,
        },
    }
}
