//! Pipeline runs (PAIFlow)
//!
//! A run is created either from a registered pipeline (`pipeline_id`) or from an
//! inline manifest; exactly one of the two must be given.

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

use super::{fetch_page, id_from_body};
use crate::client::{ApiRequest, PaiClient};
use crate::error::{PaiError, Result};
use crate::pagination::{ListOptions, PaginatedResult, paginate};
use crate::progress::{ProgressCallback, StatusSource, run_status, wait_for_status};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PipelineRun {
    pub pipeline_run_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub workspace_id: Option<String>,
    #[serde(default)]
    pub pipeline_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub gmt_create_time: Option<String>,
    #[serde(default)]
    pub gmt_start_time: Option<String>,
    #[serde(default)]
    pub gmt_end_time: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PipelineRunFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Parameters of a new run
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreatePipelineRunRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline_id: Option<String>,
    /// Inline pipeline manifest (YAML or JSON)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<String>,
    /// Run arguments as a YAML or JSON string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
    /// Start right away instead of waiting for an explicit start
    pub no_confirm_required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
}

impl CreatePipelineRunRequest {
    /// Run a registered pipeline
    pub fn from_pipeline(pipeline_id: impl Into<String>) -> Self {
        Self {
            pipeline_id: Some(pipeline_id.into()),
            no_confirm_required: true,
            ..Self::default()
        }
    }

    /// Run an inline manifest
    pub fn from_manifest(manifest: impl Into<String>) -> Self {
        Self {
            manifest: Some(manifest.into()),
            no_confirm_required: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_workspace_id(mut self, workspace_id: impl Into<String>) -> Self {
        self.workspace_id = Some(workspace_id.into());
        self
    }

    #[must_use]
    pub fn with_arguments(mut self, arguments: impl Into<String>) -> Self {
        self.arguments = Some(arguments.into());
        self
    }

    /// Exactly one of `pipeline_id` and `manifest` must be set
    pub fn validate(&self) -> Result<()> {
        match (&self.pipeline_id, &self.manifest) {
            (Some(_), Some(_)) => Err(PaiError::Validation(
                "pipeline_id and manifest are mutually exclusive".to_string(),
            )),
            (None, None) => Err(PaiError::Validation(
                "one of pipeline_id or manifest is required".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// Pipeline run operations
#[derive(Debug, Clone)]
pub struct PipelineRunApi {
    client: PaiClient,
}

impl PipelineRunApi {
    pub fn new(client: PaiClient) -> Self {
        Self { client }
    }

    pub async fn list(
        &self,
        filter: &PipelineRunFilter,
        options: &ListOptions,
    ) -> Result<PaginatedResult<PipelineRun>> {
        fetch_page(
            &self.client,
            ApiRequest::get("ListPipelineRuns", "/api/v1/pipelineruns"),
            filter,
            options,
            "PipelineRuns",
        )
        .await
    }

    pub fn list_all<'a>(
        &'a self,
        filter: &'a PipelineRunFilter,
        options: &'a ListOptions,
    ) -> impl Stream<Item = Result<PipelineRun>> + 'a {
        paginate(
            move |page, size| async move { self.list(filter, &options.at_page(page, size)).await },
            options.page_number,
            options.page_size,
        )
    }

    pub async fn get(&self, run_id: &str) -> Result<PipelineRun> {
        self.client
            .execute(
                ApiRequest::get("GetPipelineRun", "/api/v1/pipelineruns/{PipelineRunId}")
                    .path_param("PipelineRunId", run_id),
            )
            .await
    }

    /// Create a run, returning its id
    ///
    /// Fails with [`PaiError::Validation`] before any request is sent unless exactly
    /// one of `pipeline_id` and `manifest` is set.
    pub async fn create(&self, request: &CreatePipelineRunRequest) -> Result<String> {
        request.validate()?;
        let body = self
            .client
            .execute_value(
                ApiRequest::post("CreatePipelineRun", "/api/v1/pipelineruns").json_body(request)?,
            )
            .await?;
        id_from_body(&body, "PipelineRunId")
    }

    /// Rename a run
    pub async fn update(&self, run_id: &str, name: &str) -> Result<()> {
        self.client
            .execute_unit(
                ApiRequest::put("UpdatePipelineRun", "/api/v1/pipelineruns/{PipelineRunId}")
                    .path_param("PipelineRunId", run_id)
                    .body_value(serde_json::json!({ "Name": name })),
            )
            .await
    }

    pub async fn delete(&self, run_id: &str) -> Result<()> {
        self.client
            .execute_unit(
                ApiRequest::delete("DeletePipelineRun", "/api/v1/pipelineruns/{PipelineRunId}")
                    .path_param("PipelineRunId", run_id),
            )
            .await
    }

    pub async fn start(&self, run_id: &str) -> Result<()> {
        self.client
            .execute_unit(
                ApiRequest::put(
                    "StartPipelineRun",
                    "/api/v1/pipelineruns/{PipelineRunId}/start",
                )
                .path_param("PipelineRunId", run_id),
            )
            .await
    }

    pub async fn terminate(&self, run_id: &str) -> Result<()> {
        self.client
            .execute_unit(
                ApiRequest::put(
                    "TerminatePipelineRun",
                    "/api/v1/pipelineruns/{PipelineRunId}/terminate",
                )
                .path_param("PipelineRunId", run_id),
            )
            .await
    }

    /// Wait until the run succeeds; failure or termination ends the wait early
    pub async fn wait(
        &self,
        run_id: &str,
        timeout: Duration,
        interval: Duration,
        on_progress: Option<ProgressCallback>,
    ) -> Result<String> {
        let source = RunStatus {
            api: self,
            run_id,
        };
        wait_for_status(
            &source,
            run_status::SUCCEEDED,
            &run_status::UNEXPECTED,
            timeout,
            interval,
            on_progress,
        )
        .await
    }
}

struct RunStatus<'a> {
    api: &'a PipelineRunApi,
    run_id: &'a str,
}

#[async_trait]
impl StatusSource for RunStatus<'_> {
    fn resource_name(&self) -> String {
        format!("pipeline run {}", self.run_id)
    }

    async fn fetch_status(&self) -> Result<String> {
        let run = self.api.get(self.run_id).await?;
        Ok(run.status.unwrap_or_default())
    }
}
