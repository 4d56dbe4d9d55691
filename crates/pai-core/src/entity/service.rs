//! Inference service entity

use async_trait::async_trait;
use std::time::Duration;

use crate::api::service::{ServiceFilter, ServiceRecord};
use crate::error::Result;
use crate::pagination::{ListOptions, PaginatedResult};
use crate::progress::{ProgressCallback, ServiceStatus, StatusSource, wait_for_status};
use crate::service_config::ServiceConfig;
use crate::session::Session;

/// Statuses that end a deployment wait early
pub const DEPLOY_UNEXPECTED: [ServiceStatus; 2] =
    [ServiceStatus::Failed, ServiceStatus::DeleteFailed];

/// An EAS service bound to a session
#[derive(Debug, Clone)]
pub struct Service {
    session: Session,
    record: ServiceRecord,
}

impl Service {
    pub fn from_record(session: Session, record: ServiceRecord) -> Self {
        Self { session, record }
    }

    /// Fetch a service in the session's region
    pub async fn get(session: &Session, name: &str) -> Result<Self> {
        let record = session.services().get(session.region_id(), name).await?;
        Ok(Self::from_record(session.clone(), record))
    }

    pub async fn list(
        session: &Session,
        filter: &ServiceFilter,
        options: &ListOptions,
    ) -> Result<PaginatedResult<Service>> {
        let page = session.services().list(filter, options).await?;
        Ok(page.map(|record| Self::from_record(session.clone(), record)))
    }

    /// Submit `config` and return the new service without waiting
    pub async fn create(session: &Session, config: &ServiceConfig) -> Result<Self> {
        let config = with_default_workspace(session, config);
        let created = session.services().create(&config).await?;
        tracing::info!("Created service {}", created.service_name);

        let cluster_id = created
            .region
            .clone()
            .unwrap_or_else(|| session.region_id().to_string());
        let record = session
            .services()
            .get(&cluster_id, &created.service_name)
            .await?;
        Ok(Self::from_record(session.clone(), record))
    }

    /// Create a service and wait until it is running
    ///
    /// A service that fails to deploy is left in place for inspection.
    pub async fn deploy(
        session: &Session,
        config: &ServiceConfig,
        timeout: Duration,
        interval: Duration,
        on_progress: Option<ProgressCallback>,
    ) -> Result<Self> {
        let mut service = Self::create(session, config).await?;
        service
            .wait_for_status(
                ServiceStatus::Running,
                &DEPLOY_UNEXPECTED,
                timeout,
                interval,
                on_progress,
            )
            .await?;
        Ok(service)
    }

    pub fn record(&self) -> &ServiceRecord {
        &self.record
    }

    pub fn name(&self) -> &str {
        &self.record.service_name
    }

    /// Region the service runs in, used as its cluster id
    pub fn cluster_id(&self) -> &str {
        self.record
            .region
            .as_deref()
            .unwrap_or_else(|| self.session.region_id())
    }

    /// Status as of the last fetch
    pub fn status(&self) -> ServiceStatus {
        self.record.status()
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.record.internet_endpoint.as_deref()
    }

    pub fn intranet_endpoint(&self) -> Option<&str> {
        self.record.intranet_endpoint.as_deref()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.record.access_token.as_deref()
    }

    pub fn config(&self) -> Result<Option<ServiceConfig>> {
        self.record.config()
    }

    /// Re-fetch the service record
    pub async fn refresh(&mut self) -> Result<()> {
        let record = self
            .session
            .services()
            .get(self.cluster_id(), self.name())
            .await?;
        self.record = record;
        Ok(())
    }

    pub async fn start(&self) -> Result<()> {
        tracing::info!("Starting service {}", self.name());
        self.session
            .services()
            .start(self.cluster_id(), self.name())
            .await
    }

    pub async fn stop(&self) -> Result<()> {
        tracing::info!("Stopping service {}", self.name());
        self.session
            .services()
            .stop(self.cluster_id(), self.name())
            .await
    }

    pub async fn delete(&self) -> Result<()> {
        tracing::info!("Deleting service {}", self.name());
        self.session
            .services()
            .delete(self.cluster_id(), self.name())
            .await
    }

    pub async fn update(&self, config: &ServiceConfig) -> Result<()> {
        self.session
            .services()
            .update(self.cluster_id(), self.name(), config)
            .await
    }

    pub async fn scale(&self, instances: u32) -> Result<()> {
        self.session
            .services()
            .scale(self.cluster_id(), self.name(), instances)
            .await
    }

    /// Poll until the service reaches `target`, then refresh the record
    pub async fn wait_for_status(
        &mut self,
        target: ServiceStatus,
        unexpected: &[ServiceStatus],
        timeout: Duration,
        interval: Duration,
        on_progress: Option<ProgressCallback>,
    ) -> Result<()> {
        let unexpected: Vec<&str> = unexpected.iter().map(ServiceStatus::as_str).collect();
        wait_for_status(
            &*self,
            target.as_str(),
            &unexpected,
            timeout,
            interval,
            on_progress,
        )
        .await?;
        self.refresh().await
    }
}

#[async_trait]
impl StatusSource for Service {
    fn resource_name(&self) -> String {
        format!("service {}", self.name())
    }

    async fn fetch_status(&self) -> Result<String> {
        let record = self
            .session
            .services()
            .get(self.cluster_id(), self.name())
            .await?;
        Ok(record.status().as_str().to_string())
    }
}

/// Fill `metadata.workspace_id` from the session when the config leaves it out
fn with_default_workspace(session: &Session, config: &ServiceConfig) -> ServiceConfig {
    match session.workspace_id() {
        Some(workspace_id)
            if config
                .metadata
                .as_ref()
                .is_none_or(|m| m.workspace_id.is_none()) =>
        {
            config.clone().with_workspace_id(workspace_id)
        }
        _ => config.clone(),
    }
}
