//! Container image registry (AIWorkspace)

use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Label, fetch_page, id_from_body};
use crate::client::{ApiRequest, PaiClient};
use crate::error::Result;
use crate::pagination::{ListOptions, PaginatedResult, paginate};

/// Label key marking an image as official
pub const OFFICIAL_LABEL: &str = "system.official";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Image {
    pub image_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image_uri: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub workspace_id: Option<String>,
    #[serde(default)]
    pub accessibility: Option<String>,
    #[serde(default)]
    pub labels: Vec<Label>,
    /// Image size in GB
    #[serde(default)]
    pub size: Option<f64>,
    #[serde(default)]
    pub gmt_create_time: Option<String>,
    #[serde(default)]
    pub gmt_modified_time: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Image {
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|l| l.key == key)
            .map(|l| l.value.as_str())
    }

    pub fn is_official(&self) -> bool {
        self.label(OFFICIAL_LABEL) == Some("true")
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `key=value` selectors, comma-joined on the wire
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accessibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateImageRequest {
    pub name: String,
    pub image_uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accessibility: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateImageRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accessibility: Option<String>,
}

/// Image operations
#[derive(Debug, Clone)]
pub struct ImageApi {
    client: PaiClient,
}

impl ImageApi {
    pub fn new(client: PaiClient) -> Self {
        Self { client }
    }

    pub async fn list(
        &self,
        filter: &ImageFilter,
        options: &ListOptions,
    ) -> Result<PaginatedResult<Image>> {
        fetch_page(
            &self.client,
            ApiRequest::get("ListImages", "/api/v1/images"),
            filter,
            options,
            "Images",
        )
        .await
    }

    pub fn list_all<'a>(
        &'a self,
        filter: &'a ImageFilter,
        options: &'a ListOptions,
    ) -> impl Stream<Item = Result<Image>> + 'a {
        paginate(
            move |page, size| async move { self.list(filter, &options.at_page(page, size)).await },
            options.page_number,
            options.page_size,
        )
    }

    pub async fn get(&self, image_id: &str) -> Result<Image> {
        self.client
            .execute(
                ApiRequest::get("GetImage", "/api/v1/images/{ImageId}")
                    .path_param("ImageId", image_id),
            )
            .await
    }

    pub async fn create(&self, request: &CreateImageRequest) -> Result<String> {
        let body = self
            .client
            .execute_value(ApiRequest::post("CreateImage", "/api/v1/images").json_body(request)?)
            .await?;
        id_from_body(&body, "ImageId")
    }

    pub async fn update(&self, image_id: &str, request: &UpdateImageRequest) -> Result<()> {
        self.client
            .execute_unit(
                ApiRequest::put("UpdateImage", "/api/v1/images/{ImageId}")
                    .path_param("ImageId", image_id)
                    .json_body(request)?,
            )
            .await
    }

    pub async fn delete(&self, image_id: &str) -> Result<()> {
        self.client
            .execute_unit(
                ApiRequest::delete("DeleteImage", "/api/v1/images/{ImageId}")
                    .path_param("ImageId", image_id),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_official_label() {
        let image: Image = serde_json::from_value(json!({
            "ImageId": "image-1",
            "ImageUri": "registry.cn-hangzhou.aliyuncs.com/pai/torch:2.1",
            "Labels": [
                {"Key": "system.official", "Value": "true"},
                {"Key": "system.chipType", "Value": "GPU"}
            ]
        }))
        .unwrap();
        assert!(image.is_official());
        assert_eq!(image.label("system.chipType"), Some("GPU"));
        assert_eq!(image.label("missing"), None);
    }
}
