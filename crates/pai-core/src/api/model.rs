//! Model registry and model versions (AIWorkspace)

use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Label, fetch_page, id_from_body};
use crate::client::{ApiRequest, PaiClient};
use crate::error::Result;
use crate::pagination::{ListOptions, PaginatedResult, paginate};

/// A registered model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModelRecord {
    pub model_id: String,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub workspace_id: Option<String>,
    #[serde(default)]
    pub model_description: Option<String>,
    #[serde(default)]
    pub model_doc: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub task: Option<String>,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub accessibility: Option<String>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub latest_version: Option<ModelVersionRecord>,
    #[serde(default)]
    pub gmt_create_time: Option<String>,
    #[serde(default)]
    pub gmt_modified_time: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One version of a registered model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModelVersionRecord {
    pub version_name: String,
    #[serde(default)]
    pub version_description: Option<String>,
    /// Artifact location, usually an `oss://` URI
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub source_type: Option<String>,
    #[serde(default)]
    pub source_id: Option<String>,
    #[serde(default)]
    pub format_type: Option<String>,
    #[serde(default)]
    pub framework_type: Option<String>,
    /// Partial EAS service config used when deploying this version
    #[serde(default)]
    pub inference_spec: Option<Value>,
    #[serde(default)]
    pub approval_status: Option<String>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub gmt_create_time: Option<String>,
    #[serde(default)]
    pub gmt_modified_time: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModelFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Free-text search over name and description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateModelRequest {
    pub model_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_doc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accessibility: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateModelRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_doc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accessibility: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModelVersionFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framework_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateModelVersionRequest {
    /// Server picks the next version name when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_name: Option<String>,
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framework_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inference_spec: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateModelVersionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inference_spec: Option<Value>,
}

/// Model and model version operations
#[derive(Debug, Clone)]
pub struct ModelApi {
    client: PaiClient,
}

impl ModelApi {
    pub fn new(client: PaiClient) -> Self {
        Self { client }
    }

    pub async fn list(
        &self,
        filter: &ModelFilter,
        options: &ListOptions,
    ) -> Result<PaginatedResult<ModelRecord>> {
        fetch_page(
            &self.client,
            ApiRequest::get("ListModels", "/api/v1/models"),
            filter,
            options,
            "Models",
        )
        .await
    }

    pub fn list_all<'a>(
        &'a self,
        filter: &'a ModelFilter,
        options: &'a ListOptions,
    ) -> impl Stream<Item = Result<ModelRecord>> + 'a {
        paginate(
            move |page, size| async move { self.list(filter, &options.at_page(page, size)).await },
            options.page_number,
            options.page_size,
        )
    }

    pub async fn get(&self, model_id: &str) -> Result<ModelRecord> {
        self.client
            .execute(
                ApiRequest::get("GetModel", "/api/v1/models/{ModelId}")
                    .path_param("ModelId", model_id),
            )
            .await
    }

    pub async fn create(&self, request: &CreateModelRequest) -> Result<String> {
        let body = self
            .client
            .execute_value(ApiRequest::post("CreateModel", "/api/v1/models").json_body(request)?)
            .await?;
        id_from_body(&body, "ModelId")
    }

    pub async fn update(&self, model_id: &str, request: &UpdateModelRequest) -> Result<()> {
        self.client
            .execute_unit(
                ApiRequest::put("UpdateModel", "/api/v1/models/{ModelId}")
                    .path_param("ModelId", model_id)
                    .json_body(request)?,
            )
            .await
    }

    pub async fn delete(&self, model_id: &str) -> Result<()> {
        self.client
            .execute_unit(
                ApiRequest::delete("DeleteModel", "/api/v1/models/{ModelId}")
                    .path_param("ModelId", model_id),
            )
            .await
    }

    pub async fn list_versions(
        &self,
        model_id: &str,
        filter: &ModelVersionFilter,
        options: &ListOptions,
    ) -> Result<PaginatedResult<ModelVersionRecord>> {
        fetch_page(
            &self.client,
            ApiRequest::get("ListModelVersions", "/api/v1/models/{ModelId}/versions")
                .path_param("ModelId", model_id),
            filter,
            options,
            "Versions",
        )
        .await
    }

    pub async fn get_version(
        &self,
        model_id: &str,
        version_name: &str,
    ) -> Result<ModelVersionRecord> {
        self.client
            .execute(
                ApiRequest::get(
                    "GetModelVersion",
                    "/api/v1/models/{ModelId}/versions/{VersionName}",
                )
                .path_param("ModelId", model_id)
                .path_param("VersionName", version_name),
            )
            .await
    }

    /// Add a version, returning its name
    pub async fn create_version(
        &self,
        model_id: &str,
        request: &CreateModelVersionRequest,
    ) -> Result<String> {
        let body = self
            .client
            .execute_value(
                ApiRequest::post("CreateModelVersion", "/api/v1/models/{ModelId}/versions")
                    .path_param("ModelId", model_id)
                    .json_body(request)?,
            )
            .await?;
        id_from_body(&body, "VersionName")
    }

    pub async fn update_version(
        &self,
        model_id: &str,
        version_name: &str,
        request: &UpdateModelVersionRequest,
    ) -> Result<()> {
        self.client
            .execute_unit(
                ApiRequest::put(
                    "UpdateModelVersion",
                    "/api/v1/models/{ModelId}/versions/{VersionName}",
                )
                .path_param("ModelId", model_id)
                .path_param("VersionName", version_name)
                .json_body(request)?,
            )
            .await
    }

    pub async fn delete_version(&self, model_id: &str, version_name: &str) -> Result<()> {
        self.client
            .execute_unit(
                ApiRequest::delete(
                    "DeleteModelVersion",
                    "/api/v1/models/{ModelId}/versions/{VersionName}",
                )
                .path_param("ModelId", model_id)
                .path_param("VersionName", version_name),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_model_with_latest_version() {
        let model: ModelRecord = serde_json::from_value(json!({
            "ModelId": "model-1",
            "ModelName": "resnet",
            "LatestVersion": {
                "VersionName": "3",
                "Uri": "oss://bucket/resnet/3/",
                "InferenceSpec": {"processor": "pytorch_cpu_1.10"}
            }
        }))
        .unwrap();
        let latest = model.latest_version.unwrap();
        assert_eq!(latest.version_name, "3");
        assert_eq!(
            latest.inference_spec,
            Some(json!({"processor": "pytorch_cpu_1.10"}))
        );
    }

    #[test]
    fn test_create_version_body_skips_unset() {
        let request = CreateModelVersionRequest {
            uri: "oss://bucket/m/".to_string(),
            format_type: Some("SavedModel".to_string()),
            ..CreateModelVersionRequest::default()
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"Uri": "oss://bucket/m/", "FormatType": "SavedModel"})
        );
    }
}
