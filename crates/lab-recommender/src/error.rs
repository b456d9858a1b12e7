#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("parse error in {file} at line {line}: {message}")]
    Parse {
        file: String,
        line: usize,
        message: String,
    },

    #[error("catalog error: {0}")]
    Catalog(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("lab not found: {0}")]
    NotFound(String),

    #[error("keyword extraction failed: {0}")]
    Extraction(String),

    #[error("keyword extraction is not configured")]
    ExtractorUnavailable,

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error(transparent)]
    Common(#[from] lab_common::error::CommonError),
}
