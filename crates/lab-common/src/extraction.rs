/// Client for an external keyword extraction service.
///
/// Contract: `POST {base_url}/extract-keywords` with `{"document": "..."}` answers
/// `{"keywords": [...]}`, optionally with `extraction_method`, `categories` and `confidence`.
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CommonError;

const MAX_ERROR_BODY_BYTES: usize = 4 * 1024;

#[derive(Debug, Serialize)]
struct ExtractionRequest<'a> {
    document: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionServiceResponse {
    pub keywords: Vec<String>,
    #[serde(default)]
    pub extraction_method: Option<String>,
    /// Category name to keyword list; non-list values (such as a nested confidence) are kept raw.
    #[serde(default)]
    pub categories: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub confidence: Option<String>,
}

#[derive(Clone)]
pub struct ExtractionServiceClient {
    endpoint: String,
    timeout: Duration,
    http: reqwest::Client,
}

impl ExtractionServiceClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CommonError> {
        let http = reqwest::Client::builder()
            .user_agent("lab-finder/keyword-extractor")
            .build()?;
        Ok(Self {
            endpoint: format!("{}/extract-keywords", base_url.trim_end_matches('/')),
            timeout,
            http,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn extract(&self, text: &str) -> Result<ExtractionServiceResponse, CommonError> {
        debug!(endpoint = %self.endpoint, chars = text.chars().count(), "calling extraction service");
        let resp = self
            .http
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&ExtractionRequest { document: text })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let bytes = resp.bytes().await.unwrap_or_default();
            let end = bytes.len().min(MAX_ERROR_BODY_BYTES);
            let body = String::from_utf8_lossy(&bytes[..end]).to_string();
            return Err(CommonError::ExtractionService { status, body });
        }
        Ok(resp.json::<ExtractionServiceResponse>().await?)
    }
}
