use std::sync::Arc;

use rmcp::{ServiceExt, transport::stdio};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lab_common::extraction::ExtractionServiceClient;
use lab_common::openai::{OpenAiClient, OpenAiClientConfig};
use lab_common::redis::RedisCache;
use lab_recommender::cache::RecommendationCache;
use lab_recommender::catalog::LabCatalog;
use lab_recommender::config::Config;
use lab_recommender::extractor::{ExtractorBackend, KeywordExtractor};
use lab_recommender::rate_limit::RateLimiter;
use lab_recommender::ranker::LabRanker;
use lab_recommender::server::LabFinderServer;
use lab_recommender::service::LabService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting lab-recommender");

    let config = Config::from_env()?;
    info!(
        catalog_path = %config.catalog_path,
        alignment = %config.alignment,
        default_top_n = config.default_top_n,
        max_top_n = config.max_top_n,
        redis = config.redis_url.is_some(),
        "configuration loaded"
    );

    let catalog = Arc::new(LabCatalog::load(&config.catalog_path())?);
    if catalog.is_empty() {
        warn!("catalog is empty, every recommendation will be empty");
    }
    info!(
        labs = catalog.len(),
        organizations = catalog.organizations().len(),
        fingerprint = %catalog.fingerprint(),
        "catalog loaded"
    );

    let redis_cache = RedisCache::new(config.redis_url.as_deref());
    if redis_cache.is_available().await {
        info!("redis connected");
    } else if redis_cache.is_configured() {
        warn!("redis unreachable, running without cache");
    } else {
        info!("redis not configured, running without cache");
    }
    let cache = RecommendationCache::new(redis_cache);

    let extractor = build_extractor(&config)?;
    let ranker = LabRanker::new(catalog, config.alignment);
    let service = Arc::new(LabService::new(
        ranker,
        cache,
        extractor,
        config.default_top_n,
        config.max_top_n,
    ));

    if let Some(addr) = config.http_listen_addr.clone() {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            if let Err(e) = lab_recommender::http::serve(&addr, service).await {
                tracing::error!(error = %e, "HTTP API stopped");
            }
        });
    }

    let server = LabFinderServer::new(service);

    if let Some(addr) = config.mcp_tcp_listen_addr.as_deref() {
        let listener = TcpListener::bind(addr).await?;
        info!(listen_addr = %addr, "MCP server ready, serving on TCP");
        loop {
            let (stream, peer) = listener.accept().await?;
            let server = server.clone();
            tokio::spawn(async move {
                tracing::info!(peer = %peer, "MCP client connected");
                let service = server.serve(stream).await.inspect_err(|e| {
                    tracing::error!(error = %e, "MCP server error");
                })?;
                service.waiting().await?;
                tracing::info!(peer = %peer, "MCP client disconnected");
                Ok::<(), anyhow::Error>(())
            });
        }
    } else {
        info!("MCP server ready, serving on stdio");
        let service = server.serve(stdio()).await.inspect_err(|e| {
            tracing::error!(error = %e, "MCP server error");
        })?;
        service.waiting().await?;
        info!("MCP server shut down");
    }
    Ok(())
}

/// The remote extraction service wins when both it and an LLM model are configured.
fn build_extractor(config: &Config) -> anyhow::Result<Option<KeywordExtractor>> {
    let limiter = RateLimiter::new(config.rate_limit_rps);
    if let Some(limiter) = &limiter {
        info!(rps = limiter.rps(), "extraction rate limit enabled");
    }

    if let Some(url) = config.extractor_url.as_deref() {
        let client = ExtractionServiceClient::new(url, config.extractor_timeout)?;
        info!(endpoint = %client.endpoint(), "keyword extraction via remote service");
        return Ok(Some(KeywordExtractor::new(
            ExtractorBackend::Remote(client),
            limiter,
        )));
    }

    if let Some(model) = config.extractor_model.clone() {
        let openai_config = OpenAiClientConfig::from_env();
        info!(
            base_url = %openai_config.base_url,
            model = %model,
            timeout_ms = openai_config.default_timeout.as_millis(),
            max_retries = openai_config.max_retries,
            "keyword extraction via LLM"
        );
        let client = Arc::new(OpenAiClient::new(openai_config)?);
        return Ok(Some(KeywordExtractor::new(
            ExtractorBackend::Llm { client, model },
            limiter,
        )));
    }

    info!("keyword extraction not configured");
    Ok(None)
}
