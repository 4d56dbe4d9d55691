//! Workspace entity

use crate::api::workspace::{
    CreateWorkspaceRequest, MemberFilter, NewMember, WorkspaceFilter, WorkspaceMember,
    WorkspaceRecord,
};
use crate::error::Result;
use crate::pagination::{ListOptions, PaginatedResult};
use crate::session::Session;

/// A workspace bound to a session
#[derive(Debug, Clone)]
pub struct Workspace {
    session: Session,
    record: WorkspaceRecord,
}

impl Workspace {
    pub fn from_record(session: Session, record: WorkspaceRecord) -> Self {
        Self { session, record }
    }

    pub async fn get(session: &Session, workspace_id: &str) -> Result<Self> {
        let record = session.workspaces().get(workspace_id).await?;
        Ok(Self::from_record(session.clone(), record))
    }

    /// The session's default workspace
    pub async fn current(session: &Session) -> Result<Self> {
        let workspace_id = session.require_workspace_id("Workspace::current")?;
        Self::get(session, workspace_id).await
    }

    pub async fn list(
        session: &Session,
        filter: &WorkspaceFilter,
        options: &ListOptions,
    ) -> Result<PaginatedResult<Workspace>> {
        let page = session.workspaces().list(filter, options).await?;
        Ok(page.map(|record| Self::from_record(session.clone(), record)))
    }

    /// Create a workspace and fetch it back
    pub async fn create(session: &Session, request: &CreateWorkspaceRequest) -> Result<Self> {
        let workspace_id = session.workspaces().create(request).await?;
        tracing::info!("Created workspace {}", workspace_id);
        Self::get(session, &workspace_id).await
    }

    pub fn record(&self) -> &WorkspaceRecord {
        &self.record
    }

    pub fn id(&self) -> &str {
        &self.record.workspace_id
    }

    pub fn name(&self) -> Option<&str> {
        self.record.workspace_name.as_deref()
    }

    pub async fn refresh(&mut self) -> Result<()> {
        let record = self.session.workspaces().get(self.id()).await?;
        self.record = record;
        Ok(())
    }

    pub async fn members(
        &self,
        filter: &MemberFilter,
        options: &ListOptions,
    ) -> Result<PaginatedResult<WorkspaceMember>> {
        self.session
            .workspaces()
            .list_members(self.id(), filter, options)
            .await
    }

    pub async fn add_members(&self, members: &[NewMember]) -> Result<Vec<WorkspaceMember>> {
        self.session
            .workspaces()
            .add_members(self.id(), members)
            .await
    }

    pub async fn remove_members(&self, member_ids: &[String]) -> Result<()> {
        self.session
            .workspaces()
            .delete_members(self.id(), member_ids)
            .await
    }

    pub async fn delete(self) -> Result<()> {
        self.session.workspaces().delete(self.id()).await
    }
}
