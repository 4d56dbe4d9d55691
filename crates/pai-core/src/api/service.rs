//! Online inference services (PAI-EAS)
//!
//! Services are addressed by the cluster (region) they run in and their name.
//! Creating and updating a service takes a [`ServiceConfig`] document.

use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{page_from_body, with_list_options};
use crate::client::{ApiRequest, PaiClient};
use crate::error::{PaiError, Result};
use crate::pagination::{ListOptions, PaginatedResult, paginate};
use crate::progress::ServiceStatus;
use crate::service_config::ServiceConfig;

const SERVICE_PATH: &str = "/api/v2/services/{ClusterId}/{ServiceName}";

/// An EAS label, which uses its own key names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceLabel {
    pub label_key: String,
    pub label_value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceRecord {
    pub service_name: String,
    #[serde(default)]
    pub service_id: Option<String>,
    /// Region id, used as the cluster id in service paths
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub status: Option<ServiceStatus>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub running_instance: Option<u32>,
    #[serde(default)]
    pub total_instance: Option<u32>,
    #[serde(default)]
    pub pending_instance: Option<u32>,
    #[serde(default)]
    pub internet_endpoint: Option<String>,
    #[serde(default)]
    pub intranet_endpoint: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default)]
    pub service_group: Option<String>,
    #[serde(default)]
    pub workspace_id: Option<String>,
    /// The service document as a JSON string
    #[serde(default)]
    pub service_config: Option<String>,
    #[serde(default)]
    pub labels: Vec<ServiceLabel>,
    #[serde(default)]
    pub create_time: Option<String>,
    #[serde(default)]
    pub update_time: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ServiceRecord {
    /// Decoded service document, if the server returned one
    pub fn config(&self) -> Result<Option<ServiceConfig>> {
        match self.service_config.as_deref() {
            Some(doc) if !doc.trim().is_empty() => Ok(Some(ServiceConfig::from_json_str(doc)?)),
            _ => Ok(None),
        }
    }

    pub fn status(&self) -> ServiceStatus {
        self.status
            .clone()
            .unwrap_or_else(|| ServiceStatus::Other(String::new()))
    }
}

/// Result of a create call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreatedService {
    pub service_name: String,
    #[serde(default)]
    pub service_id: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub status: Option<ServiceStatus>,
    #[serde(default)]
    pub internet_endpoint: Option<String>,
    #[serde(default)]
    pub intranet_endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceFilter {
    /// Fuzzy match on the service name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Fields of `PUT .../meta`
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceMetaUpdate {
    /// Traffic weight within the service group
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Inference service operations
#[derive(Debug, Clone)]
pub struct ServiceApi {
    client: PaiClient,
}

impl ServiceApi {
    pub fn new(client: PaiClient) -> Self {
        Self { client }
    }

    pub async fn list(
        &self,
        filter: &ServiceFilter,
        options: &ListOptions,
    ) -> Result<PaginatedResult<ServiceRecord>> {
        let request = with_list_options(
            ApiRequest::get("ListServices", "/api/v2/services").query_struct(filter)?,
            options,
            "Sort",
        );
        let body = self.client.execute_value(request).await?;
        page_from_body(body, "Services", options)
    }

    pub fn list_all<'a>(
        &'a self,
        filter: &'a ServiceFilter,
        options: &'a ListOptions,
    ) -> impl Stream<Item = Result<ServiceRecord>> + 'a {
        paginate(
            move |page, size| async move { self.list(filter, &options.at_page(page, size)).await },
            options.page_number,
            options.page_size,
        )
    }

    pub async fn get(&self, cluster_id: &str, service_name: &str) -> Result<ServiceRecord> {
        self.client
            .execute(
                ApiRequest::get("DescribeService", SERVICE_PATH)
                    .path_param("ClusterId", cluster_id)
                    .path_param("ServiceName", service_name),
            )
            .await
    }

    /// Create a service from its document
    pub async fn create(&self, config: &ServiceConfig) -> Result<CreatedService> {
        if config.name().is_none_or(str::is_empty) {
            return Err(PaiError::Validation(
                "service config needs metadata.name".to_string(),
            ));
        }
        self.client
            .execute(
                ApiRequest::post("CreateService", "/api/v2/services")
                    .body_value(config.to_value()?),
            )
            .await
    }

    /// Apply a full or partial document to a running service
    pub async fn update(
        &self,
        cluster_id: &str,
        service_name: &str,
        config: &ServiceConfig,
    ) -> Result<()> {
        self.client
            .execute_unit(
                ApiRequest::put("UpdateService", SERVICE_PATH)
                    .path_param("ClusterId", cluster_id)
                    .path_param("ServiceName", service_name)
                    .body_value(config.to_value()?),
            )
            .await
    }

    /// Change the instance count
    pub async fn scale(&self, cluster_id: &str, service_name: &str, instances: u32) -> Result<()> {
        let patch = ServiceConfig::default().with_instance_count(instances);
        self.update(cluster_id, service_name, &patch).await
    }

    pub async fn update_meta(
        &self,
        cluster_id: &str,
        service_name: &str,
        meta: &ServiceMetaUpdate,
    ) -> Result<()> {
        self.client
            .execute_unit(
                ApiRequest::put("UpdateServiceMeta", "/api/v2/services/{ClusterId}/{ServiceName}/meta")
                    .path_param("ClusterId", cluster_id)
                    .path_param("ServiceName", service_name)
                    .json_body(meta)?,
            )
            .await
    }

    pub async fn delete(&self, cluster_id: &str, service_name: &str) -> Result<()> {
        self.client
            .execute_unit(
                ApiRequest::delete("DeleteService", SERVICE_PATH)
                    .path_param("ClusterId", cluster_id)
                    .path_param("ServiceName", service_name),
            )
            .await
    }

    pub async fn start(&self, cluster_id: &str, service_name: &str) -> Result<()> {
        self.client
            .execute_unit(
                ApiRequest::put("StartService", "/api/v2/services/{ClusterId}/{ServiceName}/start")
                    .path_param("ClusterId", cluster_id)
                    .path_param("ServiceName", service_name),
            )
            .await
    }

    pub async fn stop(&self, cluster_id: &str, service_name: &str) -> Result<()> {
        self.client
            .execute_unit(
                ApiRequest::put("StopService", "/api/v2/services/{ClusterId}/{ServiceName}/stop")
                    .path_param("ClusterId", cluster_id)
                    .path_param("ServiceName", service_name),
            )
            .await
    }
}
