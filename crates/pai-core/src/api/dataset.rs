//! Dataset registry (AIWorkspace)

use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Label, fetch_page, id_from_body};
use crate::client::{ApiRequest, PaiClient};
use crate::error::Result;
use crate::pagination::{ListOptions, PaginatedResult, paginate};

/// A registered dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Dataset {
    pub dataset_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub workspace_id: Option<String>,
    /// `OSS` or `NAS`
    #[serde(default)]
    pub data_source_type: Option<String>,
    #[serde(default)]
    pub data_type: Option<String>,
    /// `FILE` or `DIRECTORY`
    #[serde(default)]
    pub property: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub accessibility: Option<String>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub gmt_create_time: Option<String>,
    #[serde(default)]
    pub gmt_modified_time: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Filters for [`DatasetApi::list`]; unset fields are not sent
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DatasetFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub data_source_types: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub data_types: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateDatasetRequest {
    pub name: String,
    pub workspace_id: String,
    pub data_source_type: String,
    pub property: String,
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accessibility: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,
    /// Mount options as a JSON string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateDatasetRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
}

/// Dataset operations
#[derive(Debug, Clone)]
pub struct DatasetApi {
    client: PaiClient,
}

impl DatasetApi {
    pub fn new(client: PaiClient) -> Self {
        Self { client }
    }

    pub async fn list(
        &self,
        filter: &DatasetFilter,
        options: &ListOptions,
    ) -> Result<PaginatedResult<Dataset>> {
        fetch_page(
            &self.client,
            ApiRequest::get("ListDatasets", "/api/v1/datasets"),
            filter,
            options,
            "Datasets",
        )
        .await
    }

    /// Every matching dataset, fetched page by page as the stream is polled
    pub fn list_all<'a>(
        &'a self,
        filter: &'a DatasetFilter,
        options: &'a ListOptions,
    ) -> impl Stream<Item = Result<Dataset>> + 'a {
        paginate(
            move |page, size| async move { self.list(filter, &options.at_page(page, size)).await },
            options.page_number,
            options.page_size,
        )
    }

    pub async fn get(&self, dataset_id: &str) -> Result<Dataset> {
        self.client
            .execute(
                ApiRequest::get("GetDataset", "/api/v1/datasets/{DatasetId}")
                    .path_param("DatasetId", dataset_id),
            )
            .await
    }

    /// Register a dataset, returning its id
    pub async fn create(&self, request: &CreateDatasetRequest) -> Result<String> {
        let body = self
            .client
            .execute_value(ApiRequest::post("CreateDataset", "/api/v1/datasets").json_body(request)?)
            .await?;
        id_from_body(&body, "DatasetId")
    }

    pub async fn update(&self, dataset_id: &str, request: &UpdateDatasetRequest) -> Result<()> {
        self.client
            .execute_unit(
                ApiRequest::put("UpdateDataset", "/api/v1/datasets/{DatasetId}")
                    .path_param("DatasetId", dataset_id)
                    .json_body(request)?,
            )
            .await
    }

    pub async fn delete(&self, dataset_id: &str) -> Result<()> {
        self.client
            .execute_unit(
                ApiRequest::delete("DeleteDataset", "/api/v1/datasets/{DatasetId}")
                    .path_param("DatasetId", dataset_id),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dataset_keeps_unknown_fields() {
        let dataset: Dataset = serde_json::from_value(json!({
            "DatasetId": "d-1",
            "Name": "images",
            "Uri": "oss://bucket/images/",
            "Labels": [{"Key": "team", "Value": "cv"}],
            "Owner": "1234"
        }))
        .unwrap();
        assert_eq!(dataset.dataset_id, "d-1");
        assert_eq!(dataset.labels, vec![Label::new("team", "cv")]);
        assert_eq!(dataset.extra.get("Owner"), Some(&json!("1234")));
    }

    #[test]
    fn test_filter_sends_only_set_fields() {
        let filter = DatasetFilter {
            workspace_id: Some("ws-1".to_string()),
            data_types: vec!["PIC".to_string(), "TEXT".to_string()],
            ..DatasetFilter::default()
        };
        let value = serde_json::to_value(&filter).unwrap();
        assert_eq!(value, json!({"WorkspaceId": "ws-1", "DataTypes": ["PIC", "TEXT"]}));
    }
}
