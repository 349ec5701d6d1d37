//! Error types for the bridge.
//!
//! The mappers themselves are total over their input; errors only arise when
//! encoding an output document, decoding a raw inbound body, or talking to the
//! upstream in the HTTP layer.

use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BridgeError {
    #[error("encode responses request: {0}")]
    Encode(serde_json::Error),

    #[error("marshal chat completion chunk: {0}")]
    EncodeChunk(serde_json::Error),

    #[error("decode responses document: {0}")]
    Decode(serde_json::Error),

    #[error("stream line exceeds {limit} bytes without a newline")]
    LineTooLong { limit: usize },

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("upstream error: {0}")]
    Upstream(#[from] reqwest::Error),
}

impl BridgeError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
