use serde::Serialize;
use serde_json::{Map, Number, Value};

/// One content part of a Responses message item, kept as an open JSON object.
///
/// Only `{ "type": "text", "text": ... }` parts are interpreted by the mappers;
/// any other part passes through untouched.
pub type ContentPart = Map<String, Value>;

/// Build a `{ "type": "text", "text": <text> }` content part.
pub fn text_part(text: &str) -> ContentPart {
    let mut part = Map::new();
    part.insert("type".into(), Value::String("text".into()));
    part.insert("text".into(), Value::String(text.to_string()));
    part
}

/// Item of a Responses request `input` sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputItem {
    Message {
        role: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        content: Option<Vec<ContentPart>>,
    },
    FunctionCall {
        call_id: String,
        name: String,
        arguments: String,
    },
    FunctionCallOutput {
        call_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        output: Option<String>,
    },
}

/// Tool definition in the flattened Responses shape:
/// `{ "type": "function", "name": ..., "description"?, "parameters"?, "strict"? }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsesTool {
    Function {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        parameters: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        strict: Option<bool>,
    },
}

/// Responses request built from a Chat Completions request.
///
/// Absent optional fields are omitted from the serialized document rather than
/// written as `null`; an empty `input` or `tools` list is omitted as well.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponsesRequest {
    pub model: String,
    pub input: Vec<InputItem>,

    pub stream: Option<bool>,
    pub store: Option<bool>,

    // Sampling / decoding
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub presence_penalty: Option<f64>,
    pub frequency_penalty: Option<f64>,
    /// Accepts a single string or an array of strings.
    pub stop: Option<Value>,

    // Tools
    pub tools: Option<Vec<ResponsesTool>>,
    pub tool_choice: Option<Value>,
}

impl ResponsesRequest {
    /// Encode into a JSON document ready to send upstream.
    ///
    /// Fails only when a float parameter is not representable in JSON (NaN or infinite).
    pub fn to_document(&self) -> crate::error::Result<Value> {
        serde_json::to_value(self).map_err(crate::error::BridgeError::Encode)
    }
}

impl Serialize for ResponsesRequest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut root = Map::new();

        root.insert("model".to_string(), Value::String(self.model.clone()));

        if let Some(s) = self.stream {
            root.insert("stream".into(), Value::Bool(s));
        }
        if let Some(s) = self.store {
            root.insert("store".into(), Value::Bool(s));
        }

        if !self.input.is_empty() {
            let input_val =
                serde_json::to_value(&self.input).map_err(serde::ser::Error::custom)?;
            root.insert("input".to_string(), input_val);
        }

        let to_num = |f: f64, label: &str| {
            Number::from_f64(f).ok_or_else(|| serde::ser::Error::custom(format!("invalid {label}")))
        };

        if let Some(v) = self.max_tokens {
            root.insert("max_tokens".into(), Value::Number(v.into()));
        }
        if let Some(v) = self.temperature {
            root.insert(
                "temperature".into(),
                Value::Number(to_num(v, "temperature")?),
            );
        }
        if let Some(v) = self.top_p {
            root.insert("top_p".into(), Value::Number(to_num(v, "top_p")?));
        }
        if let Some(v) = self.presence_penalty {
            root.insert(
                "presence_penalty".into(),
                Value::Number(to_num(v, "presence_penalty")?),
            );
        }
        if let Some(v) = self.frequency_penalty {
            root.insert(
                "frequency_penalty".into(),
                Value::Number(to_num(v, "frequency_penalty")?),
            );
        }
        if let Some(v) = self.stop.clone() {
            root.insert("stop".into(), v);
        }
        if let Some(tools) = self.tools.as_ref().filter(|t| !t.is_empty()) {
            root.insert(
                "tools".into(),
                serde_json::to_value(tools).map_err(serde::ser::Error::custom)?,
            );
        }
        if let Some(tc) = self.tool_choice.as_ref() {
            root.insert("tool_choice".into(), tc.clone());
        }

        Value::Object(root).serialize(serializer)
    }
}

// ============================================================================
// Lenient decoding of Responses documents (responses and stream events)
// ============================================================================
//
// Upstream documents are not owned by this crate. Every field is read on its
// own: a missing key or a value of the wrong JSON type is treated as absent and
// never aborts decoding of its siblings.

/// Read `key` as a string, if present and of string type.
pub(crate) fn str_field(obj: &Value, key: &str) -> Option<String> {
    obj.get(key).and_then(|v| v.as_str()).map(|s| s.to_string())
}

/// Read `key` as a non-negative integer. Any JSON number is accepted and
/// truncated toward zero; negatives clamp to zero.
pub(crate) fn count_field(obj: &Value, key: &str) -> Option<u64> {
    let n = obj.get(key)?.as_f64()?;
    Some(if n > 0.0 { n.trunc() as u64 } else { 0 })
}

/// Top-level scalar fields shared by Responses responses and stream events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    pub id: Option<String>,
    pub created: Option<u64>,
    pub model: Option<String>,
    pub finish_reason: Option<String>,
}

impl Envelope {
    pub fn decode(doc: &Value) -> Self {
        Self {
            id: str_field(doc, "id"),
            created: count_field(doc, "created"),
            model: str_field(doc, "model"),
            finish_reason: str_field(doc, "finish_reason"),
        }
    }
}

/// A `message` output item, reduced to what the mappers read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageItem {
    pub role: Option<String>,
    /// Text of every `text` content part, in encounter order.
    pub texts: Vec<String>,
}

/// A `function_call` output item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionCallItem {
    pub call_id: Option<String>,
    pub name: Option<String>,
    pub arguments: Option<String>,
}

/// A `function_call_output` item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionCallOutputItem {
    pub call_id: Option<String>,
    pub output: Option<String>,
}

/// One decoded element of an `output` sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputItem {
    Message(MessageItem),
    FunctionCall(FunctionCallItem),
    FunctionCallOutput(FunctionCallOutputItem),
    /// Not an object, no string `type`, or a type the mappers do not interpret.
    Ignored,
}

impl OutputItem {
    pub fn decode(item: &Value) -> Self {
        if !item.is_object() {
            return OutputItem::Ignored;
        }
        match item.get("type").and_then(|t| t.as_str()) {
            Some("message") => OutputItem::Message(MessageItem {
                role: str_field(item, "role"),
                texts: text_parts(item),
            }),
            Some("function_call") => OutputItem::FunctionCall(FunctionCallItem {
                call_id: str_field(item, "call_id"),
                name: str_field(item, "name"),
                arguments: str_field(item, "arguments"),
            }),
            Some("function_call_output") => {
                OutputItem::FunctionCallOutput(FunctionCallOutputItem {
                    call_id: str_field(item, "call_id"),
                    output: str_field(item, "output"),
                })
            }
            _ => OutputItem::Ignored,
        }
    }
}

fn text_parts(item: &Value) -> Vec<String> {
    item.get("content")
        .and_then(|c| c.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter(|p| p.get("type").and_then(|t| t.as_str()) == Some("text"))
                .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// Decode the `output` sequence. `None` when the key is missing or not an array.
pub fn decode_output(doc: &Value) -> Option<Vec<OutputItem>> {
    doc.get("output")
        .and_then(|o| o.as_array())
        .map(|items| items.iter().map(OutputItem::decode).collect())
}

/// Usage block of a Responses document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponsesUsage {
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
    pub cache_read_input_tokens: Option<u64>,
    /// `output_tokens_details.reasoning_tokens`
    pub reasoning_tokens: Option<u64>,
}

impl ResponsesUsage {
    /// Decode `usage`; `None` when the key is missing or not an object.
    pub fn decode(doc: &Value) -> Option<Self> {
        let usage = doc.get("usage").filter(|u| u.is_object())?;
        Some(Self {
            input_tokens: count_field(usage, "input_tokens"),
            output_tokens: count_field(usage, "output_tokens"),
            cache_read_input_tokens: count_field(usage, "cache_read_input_tokens"),
            reasoning_tokens: usage
                .get("output_tokens_details")
                .and_then(|d| count_field(d, "reasoning_tokens")),
        })
    }
}
