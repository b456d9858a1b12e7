/// Error types shared by the lab-finder crates.
///
/// These cover the outbound clients (OpenAI-compatible host, keyword extraction service).
/// Application-specific errors live in each binary crate and wrap `CommonError` via `#[from]`.
use reqwest::StatusCode;

use crate::openai::OpenAiClientError;

#[derive(Debug, thiserror::Error)]
pub enum CommonError {
    #[error("llm request failed: {0}")]
    OpenAi(#[from] OpenAiClientError),

    #[error("extraction service request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("extraction service returned status={status}: {body}")]
    ExtractionService { status: StatusCode, body: String },
}
