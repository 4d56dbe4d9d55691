//! Training jobs (PAI-DLC)

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;

use super::{fetch_page, id_from_body};
use crate::client::{ApiRequest, PaiClient};
use crate::error::{PaiError, Result};
use crate::pagination::{ListOptions, PaginatedResult, paginate};
use crate::progress::{ProgressCallback, StatusSource, job_status, wait_for_status};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TrainingJob {
    pub job_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    /// `TFJob`, `PyTorchJob`, `XGBoostJob`, ...
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub workspace_id: Option<String>,
    #[serde(default)]
    pub resource_id: Option<String>,
    #[serde(default)]
    pub user_command: Option<String>,
    #[serde(default)]
    pub reason_code: Option<String>,
    #[serde(default)]
    pub reason_message: Option<String>,
    /// Run time in seconds
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub gmt_create_time: Option<String>,
    #[serde(default)]
    pub gmt_finish_time: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct JobFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    /// RFC 3339 lower bound on creation time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

/// Role of a set of pods within a job
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JobSpec {
    /// `Worker`, `PS`, `Chief`, `Master`, ...
    #[serde(rename = "Type")]
    pub role: String,
    pub image: String,
    pub pod_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ecs_spec: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A dataset mounted into the job's pods
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JobDataSource {
    pub data_source_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateJobRequest {
    pub display_name: String,
    pub job_type: String,
    pub job_specs: Vec<JobSpec>,
    pub user_command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    /// Dedicated resource group; public resources when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub data_sources: Vec<JobDataSource>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub envs: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub thirdparty_libs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
}

impl CreateJobRequest {
    fn validate(&self) -> Result<()> {
        if self.job_specs.is_empty() {
            return Err(PaiError::Validation(
                "a training job needs at least one job spec".to_string(),
            ));
        }
        if self.user_command.trim().is_empty() {
            return Err(PaiError::Validation(
                "a training job needs a user command".to_string(),
            ));
        }
        Ok(())
    }
}

/// Training job operations
#[derive(Debug, Clone)]
pub struct TrainingJobApi {
    client: PaiClient,
}

impl TrainingJobApi {
    pub fn new(client: PaiClient) -> Self {
        Self { client }
    }

    pub async fn list(
        &self,
        filter: &JobFilter,
        options: &ListOptions,
    ) -> Result<PaginatedResult<TrainingJob>> {
        fetch_page(
            &self.client,
            ApiRequest::get("ListJobs", "/api/v1/jobs"),
            filter,
            options,
            "Jobs",
        )
        .await
    }

    pub fn list_all<'a>(
        &'a self,
        filter: &'a JobFilter,
        options: &'a ListOptions,
    ) -> impl Stream<Item = Result<TrainingJob>> + 'a {
        paginate(
            move |page, size| async move { self.list(filter, &options.at_page(page, size)).await },
            options.page_number,
            options.page_size,
        )
    }

    pub async fn get(&self, job_id: &str) -> Result<TrainingJob> {
        self.client
            .execute(ApiRequest::get("GetJob", "/api/v1/jobs/{JobId}").path_param("JobId", job_id))
            .await
    }

    pub async fn create(&self, request: &CreateJobRequest) -> Result<String> {
        request.validate()?;
        let body = self
            .client
            .execute_value(ApiRequest::post("CreateJob", "/api/v1/jobs").json_body(request)?)
            .await?;
        id_from_body(&body, "JobId")
    }

    /// Change the scheduling priority of a queued job
    pub async fn update(&self, job_id: &str, priority: u32) -> Result<()> {
        self.client
            .execute_unit(
                ApiRequest::put("UpdateJob", "/api/v1/jobs/{JobId}")
                    .path_param("JobId", job_id)
                    .body_value(serde_json::json!({ "Priority": priority })),
            )
            .await
    }

    pub async fn delete(&self, job_id: &str) -> Result<()> {
        self.client
            .execute_unit(
                ApiRequest::delete("DeleteJob", "/api/v1/jobs/{JobId}").path_param("JobId", job_id),
            )
            .await
    }

    pub async fn stop(&self, job_id: &str) -> Result<()> {
        self.client
            .execute_unit(
                ApiRequest::post("StopJob", "/api/v1/jobs/{JobId}/stop").path_param("JobId", job_id),
            )
            .await
    }

    /// Wait until the job succeeds; failure or a stop ends the wait early
    pub async fn wait(
        &self,
        job_id: &str,
        timeout: Duration,
        interval: Duration,
        on_progress: Option<ProgressCallback>,
    ) -> Result<String> {
        let source = JobStatus { api: self, job_id };
        wait_for_status(
            &source,
            job_status::SUCCEEDED,
            &job_status::UNEXPECTED,
            timeout,
            interval,
            on_progress,
        )
        .await
    }
}

struct JobStatus<'a> {
    api: &'a TrainingJobApi,
    job_id: &'a str,
}

#[async_trait]
impl StatusSource for JobStatus<'_> {
    fn resource_name(&self) -> String {
        format!("training job {}", self.job_id)
    }

    async fn fetch_status(&self) -> Result<String> {
        Ok(self.api.get(self.job_id).await?.status.unwrap_or_default())
    }
}
