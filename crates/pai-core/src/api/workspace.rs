//! Workspaces and their members (AIWorkspace)

use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::{fetch_page, id_from_body};
use crate::client::{ApiRequest, PaiClient};
use crate::error::{PaiError, Result};
use crate::pagination::{ListOptions, PaginatedResult, paginate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WorkspaceRecord {
    pub workspace_id: String,
    #[serde(default)]
    pub workspace_name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// `prod`, or `dev` and `prod`
    #[serde(default)]
    pub env_types: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub creator: Option<String>,
    #[serde(default)]
    pub is_default: Option<bool>,
    #[serde(default)]
    pub gmt_create_time: Option<String>,
    #[serde(default)]
    pub gmt_modified_time: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WorkspaceMember {
    pub member_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub member_name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub gmt_create_time: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A user to add to a workspace with the given roles
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NewMember {
    pub user_id: String,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct WorkspaceFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub workspace_ids: Vec<String>,
    /// Also return the default workspace flag and admin names
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MemberFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateWorkspaceRequest {
    pub workspace_name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub env_types: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateWorkspaceRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Workspace and member operations
#[derive(Debug, Clone)]
pub struct WorkspaceApi {
    client: PaiClient,
}

impl WorkspaceApi {
    pub fn new(client: PaiClient) -> Self {
        Self { client }
    }

    pub async fn list(
        &self,
        filter: &WorkspaceFilter,
        options: &ListOptions,
    ) -> Result<PaginatedResult<WorkspaceRecord>> {
        fetch_page(
            &self.client,
            ApiRequest::get("ListWorkspaces", "/api/v1/workspaces"),
            filter,
            options,
            "Workspaces",
        )
        .await
    }

    pub fn list_all<'a>(
        &'a self,
        filter: &'a WorkspaceFilter,
        options: &'a ListOptions,
    ) -> impl Stream<Item = Result<WorkspaceRecord>> + 'a {
        paginate(
            move |page, size| async move { self.list(filter, &options.at_page(page, size)).await },
            options.page_number,
            options.page_size,
        )
    }

    pub async fn get(&self, workspace_id: &str) -> Result<WorkspaceRecord> {
        self.client
            .execute(
                ApiRequest::get("GetWorkspace", "/api/v1/workspaces/{WorkspaceId}")
                    .path_param("WorkspaceId", workspace_id),
            )
            .await
    }

    pub async fn create(&self, request: &CreateWorkspaceRequest) -> Result<String> {
        if request.workspace_name.is_empty() {
            return Err(PaiError::Validation(
                "workspace name is required".to_string(),
            ));
        }
        let body = self
            .client
            .execute_value(
                ApiRequest::post("CreateWorkspace", "/api/v1/workspaces").json_body(request)?,
            )
            .await?;
        id_from_body(&body, "WorkspaceId")
    }

    pub async fn update(&self, workspace_id: &str, request: &UpdateWorkspaceRequest) -> Result<()> {
        self.client
            .execute_unit(
                ApiRequest::put("UpdateWorkspace", "/api/v1/workspaces/{WorkspaceId}")
                    .path_param("WorkspaceId", workspace_id)
                    .json_body(request)?,
            )
            .await
    }

    pub async fn delete(&self, workspace_id: &str) -> Result<()> {
        self.client
            .execute_unit(
                ApiRequest::delete("DeleteWorkspace", "/api/v1/workspaces/{WorkspaceId}")
                    .path_param("WorkspaceId", workspace_id),
            )
            .await
    }

    pub async fn list_members(
        &self,
        workspace_id: &str,
        filter: &MemberFilter,
        options: &ListOptions,
    ) -> Result<PaginatedResult<WorkspaceMember>> {
        fetch_page(
            &self.client,
            ApiRequest::get("ListMembers", "/api/v1/workspaces/{WorkspaceId}/members")
                .path_param("WorkspaceId", workspace_id),
            filter,
            options,
            "Members",
        )
        .await
    }

    /// Add members, returning the created member records
    pub async fn add_members(
        &self,
        workspace_id: &str,
        members: &[NewMember],
    ) -> Result<Vec<WorkspaceMember>> {
        if members.is_empty() {
            return Err(PaiError::Validation(
                "at least one member is required".to_string(),
            ));
        }
        let mut body = self
            .client
            .execute_value(
                ApiRequest::post("CreateMember", "/api/v1/workspaces/{WorkspaceId}/members")
                    .path_param("WorkspaceId", workspace_id)
                    .body_value(json!({ "Members": members })),
            )
            .await?;
        match body.get_mut("Members").map(Value::take) {
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(members) => Ok(serde_json::from_value(members)?),
        }
    }

    pub async fn delete_members(&self, workspace_id: &str, member_ids: &[String]) -> Result<()> {
        if member_ids.is_empty() {
            return Err(PaiError::Validation(
                "at least one member id is required".to_string(),
            ));
        }
        self.client
            .execute_unit(
                ApiRequest::delete("DeleteMembers", "/api/v1/workspaces/{WorkspaceId}/members")
                    .path_param("WorkspaceId", workspace_id)
                    .query_param("MemberIds", member_ids.join(",")),
            )
            .await
    }
}
