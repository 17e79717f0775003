use reqwest::StatusCode;
use thiserror::Error;

/// Failures raised while talking to a completion endpoint.
///
/// Everything is surfaced to callers as `anyhow::Error`; downcast to this
/// type when the kind of failure matters.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("No API key configured; pass one explicitly or set OPENAI_API_KEY")]
    MissingApiKey,

    #[error("Input message too long. Message: {0}")]
    ContextLengthExceeded(String),

    #[error("OpenAI API error: {0}")]
    Api(String),

    #[error("Request failed: {status}: {body}")]
    Request { status: StatusCode, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}
