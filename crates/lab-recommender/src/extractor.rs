/// Keyword extraction from CV text.
///
/// Two backends produce the same `ExtractedKeywords`: an external extraction service
/// and an OpenAI-compatible chat model prompted for categorized research keywords.
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use lab_common::api::ExtractKeywordsResponse;
use lab_common::extraction::ExtractionServiceClient;
use lab_common::openai::OpenAiClient;

use crate::error::AppError;
use crate::rate_limit::RateLimiter;

/// Cleaned documents shorter than this are rejected.
pub const MIN_DOCUMENT_CHARS: usize = 100;
/// Characters of cleaned text sent to the model.
pub const MAX_PROMPT_CHARS: usize = 6000;
pub const MAX_KEYWORDS: usize = 20;

/// Categories requested from the model, in the order their keywords are flattened.
pub const CATEGORIES: [&str; 4] = ["research_fields", "technologies", "methods", "applications"];

const DEFAULT_CONFIDENCE: &str = "medium";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedKeywords {
    pub method: String,
    pub keywords: Vec<String>,
    pub categories: BTreeMap<String, Vec<String>>,
    pub confidence: String,
}

impl From<ExtractedKeywords> for ExtractKeywordsResponse {
    fn from(extracted: ExtractedKeywords) -> Self {
        ExtractKeywordsResponse {
            extraction_method: extracted.method,
            keywords: extracted.keywords,
            categories: extracted.categories,
            confidence: extracted.confidence,
        }
    }
}

pub enum ExtractorBackend {
    Remote(ExtractionServiceClient),
    Llm {
        client: Arc<OpenAiClient>,
        model: String,
    },
}

pub struct KeywordExtractor {
    backend: ExtractorBackend,
    limiter: Option<RateLimiter>,
}

impl KeywordExtractor {
    pub fn new(backend: ExtractorBackend, limiter: Option<RateLimiter>) -> Self {
        Self { backend, limiter }
    }

    pub fn method(&self) -> &'static str {
        match self.backend {
            ExtractorBackend::Remote(_) => "remote",
            ExtractorBackend::Llm { .. } => "llm",
        }
    }

    pub async fn extract(&self, document: &str) -> Result<ExtractedKeywords, AppError> {
        let cleaned = clean_text(document);
        let chars = cleaned.chars().count();
        if chars < MIN_DOCUMENT_CHARS {
            return Err(AppError::InvalidRequest(format!(
                "document text is too short ({chars} characters after cleaning, need at least {MIN_DOCUMENT_CHARS})"
            )));
        }

        if let Some(limiter) = &self.limiter {
            limiter.check().await?;
        }

        let extracted = match &self.backend {
            ExtractorBackend::Remote(client) => {
                let resp = client.extract(&cleaned).await?;
                let (categories, category_confidence) = split_categories(&resp.categories);
                ExtractedKeywords {
                    method: resp.extraction_method.unwrap_or_else(|| "remote".to_string()),
                    keywords: dedupe_keywords(resp.keywords),
                    categories,
                    confidence: resp
                        .confidence
                        .or(category_confidence)
                        .unwrap_or_else(|| DEFAULT_CONFIDENCE.to_string()),
                }
            }
            ExtractorBackend::Llm { client, model } => {
                let prompt = build_prompt(&cleaned);
                let content = client
                    .complete_prompt(model, prompt, Some(0.0))
                    .await
                    .map_err(lab_common::error::CommonError::from)?;
                parse_llm_response(&content)?
            }
        };

        info!(
            method = %extracted.method,
            keywords = extracted.keywords.len(),
            confidence = %extracted.confidence,
            "keywords extracted"
        );
        Ok(extracted)
    }
}

/// Replace everything except word characters, whitespace and `. - + #` with spaces,
/// then collapse whitespace.
pub fn clean_text(text: &str) -> String {
    let disallowed = Regex::new(r"[^\w\s.\-+#]").expect("valid regex");
    let spaces = Regex::new(r"\s+").expect("valid regex");
    let replaced = disallowed.replace_all(text, " ");
    spaces.replace_all(&replaced, " ").trim().to_string()
}

pub fn build_prompt(text: &str) -> String {
    let excerpt: String = text.chars().take(MAX_PROMPT_CHARS).collect();
    format!(
        r#"The following is the text of a researcher's CV. Extract the research-related keywords and group them into categories.
The text may mix several languages.

CV text:
{excerpt}

Respond with exactly this JSON shape:
{{
    "research_fields": ["AI", "Machine Learning", "Computer Vision"],
    "technologies": ["Python", "TensorFlow", "PyTorch"],
    "methods": ["Deep Learning", "CNN", "Transfer Learning"],
    "applications": ["Medical Imaging", "Natural Language Processing"],
    "confidence": "high"
}}

Rules:
- At most 8 keywords per category
- Leave out overly generic words such as "computer" or "software"
- confidence is one of high, medium, low
- Respond with the JSON object only"#
    )
}

/// Parse a model reply into keywords: fenced or bare JSON, array-valued categories flattened.
pub fn parse_llm_response(content: &str) -> Result<ExtractedKeywords, AppError> {
    let body = strip_code_fences(content);
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| AppError::Extraction(format!("model reply is not valid JSON: {e}")))?;
    let serde_json::Value::Object(map) = value else {
        return Err(AppError::Extraction(
            "model reply is not a JSON object".to_string(),
        ));
    };

    let (categories, confidence) = split_categories(&map);

    let mut ordered: Vec<String> = Vec::new();
    for name in CATEGORIES {
        if let Some(list) = categories.get(name) {
            ordered.extend(list.iter().cloned());
        }
    }
    for (name, list) in &categories {
        if !CATEGORIES.contains(&name.as_str()) {
            ordered.extend(list.iter().cloned());
        }
    }

    let mut keywords = dedupe_keywords(ordered);
    keywords.truncate(MAX_KEYWORDS);
    debug!(keywords = keywords.len(), categories = categories.len(), "parsed model reply");

    Ok(ExtractedKeywords {
        method: "llm".to_string(),
        keywords,
        categories,
        confidence: confidence.unwrap_or_else(|| DEFAULT_CONFIDENCE.to_string()),
    })
}

fn strip_code_fences(content: &str) -> &str {
    let body = if let Some((_, rest)) = content.split_once("```json") {
        rest
    } else if let Some((_, rest)) = content.split_once("```") {
        rest
    } else {
        return content.trim();
    };
    body.split_once("```").map_or(body, |(inner, _)| inner).trim()
}

/// Array-valued entries become categories (string items only); a string `confidence`
/// entry is returned separately.
fn split_categories(
    map: &serde_json::Map<String, serde_json::Value>,
) -> (BTreeMap<String, Vec<String>>, Option<String>) {
    let mut categories = BTreeMap::new();
    let mut confidence = None;
    for (name, value) in map {
        match value {
            serde_json::Value::Array(items) => {
                let words: Vec<String> = items
                    .iter()
                    .filter_map(|item| item.as_str())
                    .map(str::to_string)
                    .collect();
                categories.insert(name.clone(), words);
            }
            serde_json::Value::String(s) if name == "confidence" => confidence = Some(s.clone()),
            _ => {}
        }
    }
    (categories, confidence)
}

/// Trimmed, non-empty, first occurrence wins.
fn dedupe_keywords(keywords: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    keywords
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty() && seen.insert(k.clone()))
        .collect()
}
