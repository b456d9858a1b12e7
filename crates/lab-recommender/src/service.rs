/// Operations shared by the MCP tools and the HTTP API.
use std::sync::Arc;

use tracing::{info, warn};

use lab_common::api::{
    HealthResponse, LabDetail, LabRecommendation, OrganizationInfo, RecommendFromDocumentResponse,
    RecommendLabsResponse,
};

use crate::cache::{RecommendScope, RecommendationCache};
use crate::catalog::LabCatalog;
use crate::error::AppError;
use crate::extractor::{ExtractedKeywords, KeywordExtractor};
use crate::ranker::LabRanker;

pub struct LabService {
    catalog: Arc<LabCatalog>,
    ranker: LabRanker,
    cache: RecommendationCache,
    extractor: Option<KeywordExtractor>,
    default_top_n: usize,
    max_top_n: usize,
}

impl LabService {
    pub fn new(
        ranker: LabRanker,
        cache: RecommendationCache,
        extractor: Option<KeywordExtractor>,
        default_top_n: usize,
        max_top_n: usize,
    ) -> Self {
        let catalog = Arc::clone(ranker.catalog());
        Self {
            catalog,
            ranker,
            cache,
            extractor,
            default_top_n,
            max_top_n: max_top_n.max(1),
        }
    }

    /// Requested count, or the default, clamped to `[1, max_top_n]`.
    pub fn resolve_top_n(&self, requested: Option<u32>) -> usize {
        requested
            .map(|n| n as usize)
            .unwrap_or(self.default_top_n)
            .clamp(1, self.max_top_n)
    }

    pub async fn recommend(
        &self,
        keywords: &[String],
        top_n: Option<u32>,
    ) -> Result<RecommendLabsResponse, AppError> {
        let keywords: Vec<String> = keywords
            .iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        if keywords.is_empty() {
            return Err(AppError::InvalidRequest(
                "keywords must not be empty".to_string(),
            ));
        }
        let top_n = self.resolve_top_n(top_n);

        let scope = RecommendScope {
            catalog_fingerprint: self.catalog.fingerprint(),
            alignment: self.ranker.alignment(),
            top_n,
            keywords: &keywords,
        };
        let ranked = match self.cache.get_recommendations(&scope).await {
            Some(cached) => cached,
            None => {
                let ranked = self.ranker.rank(&keywords, top_n);
                self.cache.set_recommendations(&scope, &ranked).await;
                ranked
            }
        };

        info!(
            keywords = keywords.len(),
            top_n,
            returned = ranked.len(),
            "recommendations computed"
        );

        let recommendations: Vec<LabRecommendation> =
            ranked.into_iter().map(LabRecommendation::from).collect();
        Ok(RecommendLabsResponse {
            total_labs: self.catalog.len(),
            top_n: recommendations.len(),
            keywords,
            recommendations,
        })
    }

    pub fn extraction_configured(&self) -> bool {
        self.extractor.is_some()
    }

    pub async fn extract_keywords(&self, document: &str) -> Result<ExtractedKeywords, AppError> {
        let extractor = self
            .extractor
            .as_ref()
            .ok_or(AppError::ExtractorUnavailable)?;
        if document.trim().is_empty() {
            return Err(AppError::InvalidRequest(
                "document must not be empty".to_string(),
            ));
        }

        if let Some(cached) = self.cache.get_keywords(document).await {
            return Ok(cached);
        }
        let extracted = extractor.extract(document).await?;
        self.cache.set_keywords(document, &extracted).await;
        Ok(extracted)
    }

    pub async fn recommend_from_document(
        &self,
        document: &str,
        top_n: Option<u32>,
    ) -> Result<RecommendFromDocumentResponse, AppError> {
        let extracted = self.extract_keywords(document).await?;
        if extracted.keywords.is_empty() {
            warn!(method = %extracted.method, "extractor returned no keywords");
            return Err(AppError::Extraction(
                "no research keywords found in the document".to_string(),
            ));
        }
        let recommendations = self.recommend(&extracted.keywords, top_n).await?;
        Ok(RecommendFromDocumentResponse {
            extraction: extracted.into(),
            recommendations,
        })
    }

    pub fn lab(&self, id: &str) -> Result<LabDetail, AppError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(AppError::InvalidRequest(
                "lab_id must not be empty".to_string(),
            ));
        }
        self.catalog
            .get(id)
            .map(LabDetail::from)
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    pub fn organizations(&self) -> Vec<OrganizationInfo> {
        self.catalog
            .organizations()
            .into_iter()
            .map(|org| OrganizationInfo {
                name: org.name,
                lab_count: org.lab_count,
                departments: org.departments,
            })
            .collect()
    }

    pub async fn health(&self) -> HealthResponse {
        HealthResponse {
            status: "healthy".to_string(),
            labs_loaded: self.catalog.len(),
            extraction_configured: self.extraction_configured(),
            cache_available: self.cache.is_available().await,
            similarity_alignment: self.ranker.alignment().to_string(),
        }
    }
}
