use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;
use crate::ranker::DEFAULT_TOP_N;
use crate::similarity::Alignment;

const DEFAULT_MAX_TOP_N: usize = 50;
const DEFAULT_EXTRACTOR_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub catalog_path: String,
    pub redis_url: Option<String>,
    pub default_top_n: usize,
    pub max_top_n: usize,
    pub alignment: Alignment,
    pub extractor_url: Option<String>,
    pub extractor_timeout: Duration,
    pub extractor_model: Option<String>,
    pub rate_limit_rps: u32,
    pub mcp_tcp_listen_addr: Option<String>,
    pub http_listen_addr: Option<String>,
}

impl Config {
    /// Required:
    /// - `LAB_CATALOG_PATH` (JSON export or crawler output directory)
    ///
    /// Optional:
    /// - `REDIS_URL`
    /// - `LAB_DEFAULT_TOP_N` (default: 10)
    /// - `LAB_MAX_TOP_N` (default: 50)
    /// - `LAB_SIMILARITY_ALIGNMENT` (`positional` or `shared-vocabulary`, default: positional)
    /// - `KEYWORD_EXTRACTOR_URL`, `KEYWORD_EXTRACTOR_TIMEOUT_SECS` (default: 60)
    /// - `KEYWORD_EXTRACTOR_MODEL` (LLM extraction through the `OPENAI_*` client)
    /// - `RATE_LIMIT_RPS`
    /// - `MCP_TCP_LISTEN_ADDR`, `LAB_HTTP_LISTEN_ADDR`
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let catalog_path = var("LAB_CATALOG_PATH").ok_or_else(|| {
            AppError::Config("LAB_CATALOG_PATH environment variable is required".to_string())
        })?;
        if !Path::new(&catalog_path).exists() {
            return Err(AppError::Config(format!(
                "catalog not found: {catalog_path}"
            )));
        }

        let default_top_n = parse_var(&var, "LAB_DEFAULT_TOP_N")?.unwrap_or(DEFAULT_TOP_N);
        let max_top_n = parse_var(&var, "LAB_MAX_TOP_N")?.unwrap_or(DEFAULT_MAX_TOP_N);
        if default_top_n == 0 || max_top_n == 0 {
            return Err(AppError::Config(
                "LAB_DEFAULT_TOP_N and LAB_MAX_TOP_N must be at least 1".to_string(),
            ));
        }
        if default_top_n > max_top_n {
            return Err(AppError::Config(format!(
                "LAB_DEFAULT_TOP_N ({default_top_n}) exceeds LAB_MAX_TOP_N ({max_top_n})"
            )));
        }

        let alignment: Alignment = parse_var(&var, "LAB_SIMILARITY_ALIGNMENT")?.unwrap_or_default();
        let extractor_timeout = Duration::from_secs(
            parse_var(&var, "KEYWORD_EXTRACTOR_TIMEOUT_SECS")?
                .unwrap_or(DEFAULT_EXTRACTOR_TIMEOUT_SECS),
        );

        Ok(Self {
            catalog_path,
            redis_url: var("REDIS_URL"),
            default_top_n,
            max_top_n,
            alignment,
            extractor_url: var("KEYWORD_EXTRACTOR_URL"),
            extractor_timeout,
            extractor_model: var("KEYWORD_EXTRACTOR_MODEL"),
            rate_limit_rps: parse_var(&var, "RATE_LIMIT_RPS")?.unwrap_or(0),
            mcp_tcp_listen_addr: var("MCP_TCP_LISTEN_ADDR"),
            http_listen_addr: var("LAB_HTTP_LISTEN_ADDR"),
        })
    }

    pub fn catalog_path(&self) -> PathBuf {
        Path::new(&self.catalog_path).to_path_buf()
    }

    pub fn extraction_configured(&self) -> bool {
        self.extractor_url.is_some() || self.extractor_model.is_some()
    }
}

fn parse_var<T>(var: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    var(name)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| AppError::Config(format!("invalid {name}='{raw}': {e}")))
        })
        .transpose()
}
