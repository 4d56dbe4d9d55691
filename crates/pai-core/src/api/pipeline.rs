//! Pipeline definitions (PAIFlow)

use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{fetch_page, id_from_body};
use crate::client::{ApiRequest, PaiClient};
use crate::error::Result;
use crate::pagination::{ListOptions, PaginatedResult, paginate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Pipeline {
    pub pipeline_id: String,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub workspace_id: Option<String>,
    /// Pipeline manifest (YAML); only returned by `get`
    #[serde(default)]
    pub manifest: Option<String>,
    #[serde(default)]
    pub gmt_create_time: Option<String>,
    #[serde(default)]
    pub gmt_modified_time: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PipelineFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline_identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline_provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline_version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreatePipelineRequest {
    pub workspace_id: String,
    pub manifest: String,
}

/// Pipeline operations
#[derive(Debug, Clone)]
pub struct PipelineApi {
    client: PaiClient,
}

impl PipelineApi {
    pub fn new(client: PaiClient) -> Self {
        Self { client }
    }

    pub async fn list(
        &self,
        filter: &PipelineFilter,
        options: &ListOptions,
    ) -> Result<PaginatedResult<Pipeline>> {
        fetch_page(
            &self.client,
            ApiRequest::get("ListPipelines", "/api/v1/pipelines"),
            filter,
            options,
            "Pipelines",
        )
        .await
    }

    pub fn list_all<'a>(
        &'a self,
        filter: &'a PipelineFilter,
        options: &'a ListOptions,
    ) -> impl Stream<Item = Result<Pipeline>> + 'a {
        paginate(
            move |page, size| async move { self.list(filter, &options.at_page(page, size)).await },
            options.page_number,
            options.page_size,
        )
    }

    pub async fn get(&self, pipeline_id: &str) -> Result<Pipeline> {
        self.client
            .execute(
                ApiRequest::get("GetPipeline", "/api/v1/pipelines/{PipelineId}")
                    .path_param("PipelineId", pipeline_id),
            )
            .await
    }

    pub async fn create(&self, request: &CreatePipelineRequest) -> Result<String> {
        let body = self
            .client
            .execute_value(
                ApiRequest::post("CreatePipeline", "/api/v1/pipelines").json_body(request)?,
            )
            .await?;
        id_from_body(&body, "PipelineId")
    }

    /// Replace the pipeline manifest
    pub async fn update(&self, pipeline_id: &str, manifest: &str) -> Result<()> {
        self.client
            .execute_unit(
                ApiRequest::put("UpdatePipeline", "/api/v1/pipelines/{PipelineId}")
                    .path_param("PipelineId", pipeline_id)
                    .body_value(serde_json::json!({ "Manifest": manifest })),
            )
            .await
    }

    pub async fn delete(&self, pipeline_id: &str) -> Result<()> {
        self.client
            .execute_unit(
                ApiRequest::delete("DeletePipeline", "/api/v1/pipelines/{PipelineId}")
                    .path_param("PipelineId", pipeline_id),
            )
            .await
    }
}
