/// HTTP JSON API over the same `LabService` the MCP tools use.
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::AppError;
use crate::service::LabService;
use lab_common::api::{
    ExtractKeywordsParams, ExtractKeywordsResponse, HealthResponse, LabDetailResponse,
    OrganizationListResponse, RecommendFromDocumentParams, RecommendFromDocumentResponse,
    RecommendLabsParams, RecommendLabsResponse,
};

type ApiResult<T> = Result<Json<Success<T>>, (StatusCode, String)>;

/// Successful bodies carry `"success": true` alongside the payload fields.
#[derive(Debug, Serialize)]
pub struct Success<T> {
    pub success: bool,
    #[serde(flatten)]
    pub body: T,
}

fn ok<T>(body: T) -> Json<Success<T>> {
    Json(Success {
        success: true,
        body,
    })
}

pub fn router(service: Arc<LabService>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/recommend-labs", post(recommend_labs))
        .route("/extract-keywords", post(extract_keywords))
        .route("/recommend-from-document", post(recommend_from_document))
        .route("/lab/{id}", get(get_lab))
        .route("/organizations", get(list_organizations))
        .with_state(service)
}

pub async fn serve(addr: &str, service: Arc<LabService>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(listen_addr = %addr, "HTTP API ready");
    axum::serve(listener, router(service)).await?;
    Ok(())
}

fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        AppError::ExtractorUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        AppError::Extraction(_) | AppError::Common(_) => StatusCode::BAD_GATEWAY,
        AppError::Config(_) | AppError::Parse { .. } | AppError::Catalog(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn api_error(err: AppError) -> (StatusCode, String) {
    let status = status_for(&err);
    if status.is_server_error() {
        warn!(error = %err, status = status.as_u16(), "request failed");
    }
    (status, err.to_string())
}

/// GET / - service banner
pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Lab Finder API",
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /health
pub async fn health(State(service): State<Arc<LabService>>) -> Json<Success<HealthResponse>> {
    ok(service.health().await)
}

/// POST /recommend-labs - `{"keywords": [...], "top_n": 10}`
pub async fn recommend_labs(
    State(service): State<Arc<LabService>>,
    Json(req): Json<RecommendLabsParams>,
) -> ApiResult<RecommendLabsResponse> {
    if req.keywords.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "keywords are required".to_string()));
    }
    service
        .recommend(&req.keywords, req.top_n)
        .await
        .map(ok)
        .map_err(api_error)
}

/// POST /extract-keywords - `{"document": "..."}` (`text` is accepted as an alias)
pub async fn extract_keywords(
    State(service): State<Arc<LabService>>,
    Json(req): Json<ExtractKeywordsParams>,
) -> ApiResult<ExtractKeywordsResponse> {
    service
        .extract_keywords(&req.document)
        .await
        .map(|extracted| ok(extracted.into()))
        .map_err(api_error)
}

/// POST /recommend-from-document - `{"document": "...", "top_n": 10}`
pub async fn recommend_from_document(
    State(service): State<Arc<LabService>>,
    Json(req): Json<RecommendFromDocumentParams>,
) -> ApiResult<RecommendFromDocumentResponse> {
    service
        .recommend_from_document(&req.document, req.top_n)
        .await
        .map(ok)
        .map_err(api_error)
}

/// GET /lab/{id}
pub async fn get_lab(
    State(service): State<Arc<LabService>>,
    Path(id): Path<String>,
) -> ApiResult<LabDetailResponse> {
    service
        .lab(&id)
        .map(|lab| ok(LabDetailResponse { lab }))
        .map_err(api_error)
}

/// GET /organizations
pub async fn list_organizations(
    State(service): State<Arc<LabService>>,
) -> Json<Success<OrganizationListResponse>> {
    ok(OrganizationListResponse {
        organizations: service.organizations(),
    })
}
