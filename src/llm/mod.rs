pub mod client;

pub use client::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("cannot reach the generation endpoint at {0}")]
    Connection(String),

    #[error("generation endpoint returned error (status {status}): {body}")]
    Endpoint { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("model returned no candidates")]
    EmptyResponse,

    #[error("model output was not valid JSON: {0}")]
    MalformedJson(String),

    #[error("response parsing error: {0}")]
    ResponseParsing(String),
}
