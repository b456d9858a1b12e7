/// MCP server implementation for lab recommendations.
///
/// Exposes five tools:
/// - `recommend_labs`: Rank catalog labs against research keywords
/// - `recommend_from_document`: Extract keywords from CV text, then rank
/// - `extract_keywords`: Extract research keywords from CV text
/// - `get_lab`: Look up a lab by ID
/// - `list_organizations`: Browse organizations and their departments
use std::sync::Arc;

use rmcp::{
    Json, ServerHandler,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};
use tracing::info;

use crate::service::LabService;
use lab_common::api::{
    ExtractKeywordsParams, ExtractKeywordsResponse, GetLabParams, LabDetailResponse,
    OrganizationListResponse, RecommendFromDocumentParams, RecommendFromDocumentResponse,
    RecommendLabsParams, RecommendLabsResponse,
};

#[derive(Clone)]
pub struct LabFinderServer {
    service: Arc<LabService>,
    tool_router: ToolRouter<LabFinderServer>,
}

impl LabFinderServer {
    pub fn new(service: Arc<LabService>) -> Self {
        Self {
            service,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl LabFinderServer {
    #[tool(description = "Recommend university research labs for a list of research keywords (e.g. [\"Robotics\", \"Machine Learning\"]). Results are ranked by text similarity with at most 4 labs per organization before backfilling.")]
    async fn recommend_labs(
        &self,
        Parameters(params): Parameters<RecommendLabsParams>,
    ) -> Result<Json<RecommendLabsResponse>, String> {
        if params.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err("keywords must not be empty".to_string());
        }

        let response = self
            .service
            .recommend(&params.keywords, params.top_n)
            .await
            .map_err(|e| format!("recommendation failed: {e}"))?;
        Ok(Json(response))
    }

    #[tool(description = "Extract research keywords from the plain text of a CV and recommend matching research labs.")]
    async fn recommend_from_document(
        &self,
        Parameters(params): Parameters<RecommendFromDocumentParams>,
    ) -> Result<Json<RecommendFromDocumentResponse>, String> {
        let document = params.document.trim();
        if document.is_empty() {
            return Err("document must not be empty".to_string());
        }

        info!(chars = document.chars().count(), "recommend_from_document tool invoked");
        let response = self
            .service
            .recommend_from_document(document, params.top_n)
            .await
            .map_err(|e| format!("recommendation failed: {e}"))?;
        Ok(Json(response))
    }

    #[tool(description = "Extract categorized research keywords (research fields, technologies, methods, applications) from the plain text of a CV.")]
    async fn extract_keywords(
        &self,
        Parameters(params): Parameters<ExtractKeywordsParams>,
    ) -> Result<Json<ExtractKeywordsResponse>, String> {
        let document = params.document.trim();
        if document.is_empty() {
            return Err("document must not be empty".to_string());
        }

        let extracted = self
            .service
            .extract_keywords(document)
            .await
            .map_err(|e| format!("extraction failed: {e}"))?;
        Ok(Json(extracted.into()))
    }

    #[tool(description = "Get the full record of a research lab by ID (e.g. 'mit-cs-1').")]
    async fn get_lab(
        &self,
        Parameters(params): Parameters<GetLabParams>,
    ) -> Result<Json<LabDetailResponse>, String> {
        let lab_id = params.lab_id.trim();
        if lab_id.is_empty() {
            return Err("lab_id must not be empty".to_string());
        }

        let lab = self.service.lab(lab_id).map_err(|e| e.to_string())?;
        Ok(Json(LabDetailResponse { lab }))
    }

    #[tool(description = "List the organizations in the lab catalog with their lab counts and departments.")]
    async fn list_organizations(&self) -> Result<Json<OrganizationListResponse>, String> {
        Ok(Json(OrganizationListResponse {
            organizations: self.service.organizations(),
        }))
    }
}

#[tool_handler]
impl ServerHandler for LabFinderServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            server_info: Implementation {
                name: "lab-recommender".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Research lab recommender. Use recommend_labs with research keywords, \
                 or recommend_from_document / extract_keywords with CV text when an \
                 extractor is configured. get_lab returns a single lab and \
                 list_organizations browses the catalog."
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rmcp::handler::server::wrapper::Parameters;

    use super::LabFinderServer;
    use crate::service::tests::service;
    use lab_common::api::{GetLabParams, RecommendLabsParams};

    #[test]
    fn tools_publish_output_schemas() {
        let tools = LabFinderServer::tool_router().list_all();
        for name in [
            "recommend_labs",
            "recommend_from_document",
            "extract_keywords",
            "get_lab",
            "list_organizations",
        ] {
            let tool = tools
                .iter()
                .find(|t| t.name == name)
                .unwrap_or_else(|| panic!("missing tool: {name}"));
            assert!(
                tool.output_schema.is_some(),
                "tool {name} should publish output_schema"
            );
        }
    }

    #[tokio::test]
    async fn tools_validate_and_delegate() {
        let server = LabFinderServer::new(Arc::new(service()));

        let empty = server
            .recommend_labs(Parameters(RecommendLabsParams {
                keywords: vec![" ".to_string()],
                top_n: None,
            }))
            .await;
        assert_eq!(empty.err().as_deref(), Some("keywords must not be empty"));

        let found = server
            .get_lab(Parameters(GetLabParams {
                lab_id: "yale-me-1".to_string(),
            }))
            .await
            .expect("lab exists");
        assert_eq!(found.0.lab.organization, "Yale");

        let missing = server
            .get_lab(Parameters(GetLabParams {
                lab_id: "nope".to_string(),
            }))
            .await;
        assert!(missing.is_err());
    }
}
