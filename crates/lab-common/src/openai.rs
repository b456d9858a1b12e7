use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Clone, Debug)]
pub struct OpenAiClientConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub default_timeout: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub max_error_body_bytes: usize,
}

impl OpenAiClientConfig {
    pub fn from_env() -> Self {
        let base_url = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8001/v1".to_string());

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            default_timeout: Duration::from_secs(env_parse("OPENAI_TIMEOUT_SECS").unwrap_or(60)),
            max_retries: env_parse("OPENAI_MAX_RETRIES").unwrap_or(3),
            initial_backoff: Duration::from_millis(
                env_parse("OPENAI_RETRY_INITIAL_MS").unwrap_or(200),
            ),
            max_backoff: Duration::from_millis(env_parse("OPENAI_RETRY_MAX_MS").unwrap_or(5_000)),
            max_error_body_bytes: env_parse("OPENAI_MAX_ERROR_BODY_BYTES").unwrap_or(8 * 1024),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse::<T>().ok())
}

#[derive(Debug, thiserror::Error)]
pub enum OpenAiClientError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid response JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("upstream returned error: status={status} message={message}")]
    Upstream { status: StatusCode, message: String },

    #[error("upstream returned non-JSON error: status={status} body={body}")]
    UpstreamBody { status: StatusCode, body: String },

    #[error("completion had no message content")]
    EmptyCompletion,
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint with bounded retries.
#[derive(Clone)]
pub struct OpenAiClient {
    config: OpenAiClientConfig,
    http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(config: OpenAiClientConfig) -> Result<Self, OpenAiClientError> {
        let http = reqwest::Client::builder()
            .user_agent("lab-finder/keyword-extractor")
            .build()?;
        Ok(Self { config, http })
    }

    pub async fn chat_completions(
        &self,
        request: ChatCompletionRequest,
        timeout_override: Option<Duration>,
    ) -> Result<ChatCompletionResponse, OpenAiClientError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let timeout = timeout_override.unwrap_or(self.config.default_timeout);
        self.request_with_retry(|| {
            let req = request.clone();
            let url = url.clone();
            async move {
                let mut builder = self.http.post(&url).timeout(timeout).json(&req);
                if let Some(key) = &self.config.api_key {
                    builder = builder.bearer_auth(key);
                }
                let resp = builder.send().await?;
                Self::parse_json_response(resp, self.config.max_error_body_bytes).await
            }
        })
        .await
    }

    /// Single-turn prompt; returns the assistant text of the first choice.
    pub async fn complete_prompt(
        &self,
        model: &str,
        prompt: String,
        temperature: Option<f32>,
    ) -> Result<String, OpenAiClientError> {
        let request = ChatCompletionRequest {
            model: model.to_string(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt,
            }],
            temperature,
            max_tokens: None,
        };
        let response = self.chat_completions(request, None).await?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or(OpenAiClientError::EmptyCompletion)?;
        if choice.finish_reason.as_deref() == Some("length") {
            warn!(model, "completion hit the token limit, reply may be truncated");
        }
        choice
            .message
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or(OpenAiClientError::EmptyCompletion)
    }

    async fn parse_json_response<T: for<'de> Deserialize<'de>>(
        resp: reqwest::Response,
        max_error_body_bytes: usize,
    ) -> Result<T, OpenAiClientError> {
        if resp.status().is_success() {
            let json = resp.json::<T>().await?;
            return Ok(json);
        }
        Err(Self::to_upstream_error(resp, max_error_body_bytes).await)
    }

    async fn to_upstream_error(
        resp: reqwest::Response,
        max_error_body_bytes: usize,
    ) -> OpenAiClientError {
        let status = resp.status();
        let body = read_limited_text(resp, max_error_body_bytes).await;
        if let Ok(parsed) = serde_json::from_str::<OpenAiErrorEnvelope>(&body) {
            let message = parsed
                .error
                .message
                .unwrap_or_else(|| "unknown upstream error".to_string());
            return OpenAiClientError::Upstream { status, message };
        }
        OpenAiClientError::UpstreamBody { status, body }
    }

    async fn request_with_retry<T, Fut, F>(&self, mut f: F) -> Result<T, OpenAiClientError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, OpenAiClientError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match f().await {
                Ok(v) => return Ok(v),
                Err(e) => {
                    if attempt > self.config.max_retries || !should_retry(&e) {
                        return Err(e);
                    }
                    let delay = backoff_delay(
                        self.config.initial_backoff,
                        self.config.max_backoff,
                        attempt - 1,
                    );
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis(),
                        error = %e,
                        "llm request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

fn should_retry(err: &OpenAiClientError) -> bool {
    match err {
        OpenAiClientError::Request(e) => e.is_timeout() || e.is_connect() || e.is_body(),
        OpenAiClientError::Upstream { status, .. }
        | OpenAiClientError::UpstreamBody { status, .. } => {
            *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
        }
        OpenAiClientError::InvalidJson(_) | OpenAiClientError::EmptyCompletion => false,
    }
}

fn backoff_delay(initial: Duration, max: Duration, exponent: u32) -> Duration {
    let mult = 1u128.checked_shl(exponent).unwrap_or(u128::MAX);
    let base_ms = initial.as_millis().saturating_mul(mult);
    let capped_ms = std::cmp::min(base_ms, max.as_millis()) as u64;
    let jitter_cap = std::cmp::max(1, capped_ms / 4);
    Duration::from_millis(capped_ms.saturating_add(pseudo_jitter_ms(jitter_cap)))
}

fn pseudo_jitter_ms(max_inclusive: u64) -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u64)
        .unwrap_or(0);
    nanos % (max_inclusive + 1)
}

async fn read_limited_text(resp: reqwest::Response, max_bytes: usize) -> String {
    match resp.bytes().await {
        Ok(mut b) => {
            if b.len() > max_bytes {
                b.truncate(max_bytes);
            }
            String::from_utf8_lossy(&b).to_string()
        }
        Err(e) => {
            warn!(error = %e, "failed to read upstream error body");
            "<failed to read error body>".to_string()
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorEnvelope {
    error: OpenAiErrorObject,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorObject {
    message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionChoice {
    pub message: ChatCompletionMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionMessage {
    pub role: Option<String>,
    pub content: Option<String>,
}
