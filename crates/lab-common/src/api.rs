use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RecommendLabsParams {
    /// Research keywords of the candidate, e.g. ["Robotics", "Machine Learning"].
    pub keywords: Vec<String>,
    /// Number of labs to return (default: 10, clamped to the server maximum).
    pub top_n: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RecommendFromDocumentParams {
    /// Plain text of the candidate's CV.
    pub document: String,
    /// Number of labs to return (default: 10, clamped to the server maximum).
    pub top_n: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ExtractKeywordsParams {
    /// Plain text of the document to extract research keywords from.
    #[serde(alias = "text")]
    pub document: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetLabParams {
    /// Catalog lab ID such as "mit-cs-1".
    pub lab_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LabDetail {
    pub id: String,
    pub name: String,
    pub organization: String,
    pub department: String,
    /// Comma-separated research keywords.
    pub keywords: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LabRecommendation {
    #[serde(flatten)]
    pub lab: LabDetail,
    /// Cosine similarity between the candidate keywords and the lab text, in [0, 1].
    pub similarity_score: f64,
    /// Candidate keywords found verbatim (case-insensitive) in the lab keyword list.
    pub matching_keywords: Vec<String>,
    pub match_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RecommendLabsResponse {
    pub keywords: Vec<String>,
    pub total_labs: usize,
    /// Number of recommendations actually returned.
    pub top_n: usize,
    pub recommendations: Vec<LabRecommendation>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExtractKeywordsResponse {
    /// Which extractor produced the keywords ("remote" or "llm").
    pub extraction_method: String,
    pub keywords: Vec<String>,
    /// Keywords grouped by category when the extractor reports them.
    pub categories: BTreeMap<String, Vec<String>>,
    pub confidence: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RecommendFromDocumentResponse {
    pub extraction: ExtractKeywordsResponse,
    pub recommendations: RecommendLabsResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LabDetailResponse {
    pub lab: LabDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OrganizationInfo {
    pub name: String,
    pub lab_count: usize,
    pub departments: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OrganizationListResponse {
    pub organizations: Vec<OrganizationInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HealthResponse {
    pub status: String,
    pub labs_loaded: usize,
    pub extraction_configured: bool,
    pub cache_available: bool,
    pub similarity_alignment: String,
}
