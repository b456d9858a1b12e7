/// Redis caching layer for recommendations and keyword extraction.
///
/// All operations return `Option<T>` for graceful degradation.
///
/// Key schema:
/// - `labfinder:v1:recommend:{sha256(fingerprint|alignment|top_n|keywords)}`: JSON Vec<RankedLab> (TTL 3600s)
/// - `labfinder:v1:keywords:{sha256(document)}`: JSON ExtractedKeywords (TTL 86400s)
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::extractor::ExtractedKeywords;
use crate::model::RankedLab;
use crate::similarity::Alignment;
use lab_common::redis::RedisCache;

const KEY_PREFIX: &str = "labfinder:v1:";
const RECOMMEND_TTL_SECS: u64 = 3600;
const KEYWORDS_TTL_SECS: u64 = 86_400;

pub struct RecommendationCache {
    redis: RedisCache,
}

impl RecommendationCache {
    pub fn new(redis: RedisCache) -> Self {
        Self { redis }
    }

    pub async fn is_available(&self) -> bool {
        self.redis.is_available().await
    }

    pub async fn get_recommendations(&self, scope: &RecommendScope<'_>) -> Option<Vec<RankedLab>> {
        let key = recommend_key(scope);
        let json = self.redis.get(&key).await?;
        debug!(key, "recommendation cache hit");
        serde_json::from_str(&json)
            .inspect_err(|e| warn!(error = %e, key, "cache deserialization failed"))
            .ok()
    }

    pub async fn set_recommendations(&self, scope: &RecommendScope<'_>, results: &[RankedLab]) {
        let key = recommend_key(scope);
        if let Ok(json) = serde_json::to_string(results) {
            self.redis.set_with_ttl(&key, &json, RECOMMEND_TTL_SECS).await;
        }
    }

    pub async fn get_keywords(&self, document: &str) -> Option<ExtractedKeywords> {
        let key = keywords_key(document);
        let json = self.redis.get(&key).await?;
        debug!(key, "keyword cache hit");
        serde_json::from_str(&json)
            .inspect_err(|e| warn!(error = %e, key, "cache deserialization failed"))
            .ok()
    }

    pub async fn set_keywords(&self, document: &str, extracted: &ExtractedKeywords) {
        let key = keywords_key(document);
        if let Ok(json) = serde_json::to_string(extracted) {
            self.redis.set_with_ttl(&key, &json, KEYWORDS_TTL_SECS).await;
        }
    }
}

/// Everything a ranking result depends on.
pub struct RecommendScope<'a> {
    pub catalog_fingerprint: &'a str,
    pub alignment: Alignment,
    pub top_n: usize,
    pub keywords: &'a [String],
}

fn recommend_key(scope: &RecommendScope<'_>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(scope.catalog_fingerprint.as_bytes());
    hasher.update(b"|");
    hasher.update(scope.alignment.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(scope.top_n.to_string().as_bytes());
    for keyword in scope.keywords {
        hasher.update(b"|");
        hasher.update(keyword.as_bytes());
    }
    let hash = hasher.finalize();
    format!("{KEY_PREFIX}recommend:{:x}", hash)
}

fn keywords_key(document: &str) -> String {
    let hash = Sha256::digest(document.as_bytes());
    format!("{KEY_PREFIX}keywords:{:x}", hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope<'a>(fingerprint: &'a str, top_n: usize, keywords: &'a [String]) -> RecommendScope<'a> {
        RecommendScope {
            catalog_fingerprint: fingerprint,
            alignment: Alignment::Positional,
            top_n,
            keywords,
        }
    }

    #[test]
    fn recommend_key_covers_every_input() {
        let kw = vec!["robotics".to_string(), "vision".to_string()];
        let base = recommend_key(&scope("abc", 10, &kw));
        assert!(base.starts_with("labfinder:v1:recommend:"));
        assert_eq!(base, recommend_key(&scope("abc", 10, &kw)));

        assert_ne!(base, recommend_key(&scope("abd", 10, &kw)));
        assert_ne!(base, recommend_key(&scope("abc", 11, &kw)));

        let reordered = vec!["vision".to_string(), "robotics".to_string()];
        assert_ne!(base, recommend_key(&scope("abc", 10, &reordered)));

        let mut other = scope("abc", 10, &kw);
        other.alignment = Alignment::SharedVocabulary;
        assert_ne!(base, recommend_key(&other));
    }

    #[test]
    fn keywords_key_hashes_document() {
        let key = keywords_key("some cv text");
        assert!(key.starts_with("labfinder:v1:keywords:"));
        assert_eq!(key.len(), "labfinder:v1:keywords:".len() + 64);
        assert_ne!(key, keywords_key("other cv text"));
    }

    #[tokio::test]
    async fn unconfigured_cache_misses() {
        let cache = RecommendationCache::new(RedisCache::new(None));
        let kw = vec!["robotics".to_string()];
        assert!(!cache.is_available().await);
        assert!(cache.get_recommendations(&scope("abc", 10, &kw)).await.is_none());
        cache.set_recommendations(&scope("abc", 10, &kw), &[]).await;
        assert!(cache.get_keywords("doc").await.is_none());
    }
}
