//! Model and model version entities

use std::time::Duration;

use super::Service;
use crate::api::model::{
    CreateModelRequest, CreateModelVersionRequest, ModelFilter, ModelRecord, ModelVersionFilter,
    ModelVersionRecord,
};
use crate::error::{PaiError, Result};
use crate::pagination::{ListOptions, PaginatedResult};
use crate::progress::ProgressCallback;
use crate::service_config::ServiceConfig;
use crate::session::Session;

/// A registered model bound to a session
#[derive(Debug, Clone)]
pub struct Model {
    session: Session,
    record: ModelRecord,
}

impl Model {
    pub fn from_record(session: Session, record: ModelRecord) -> Self {
        Self { session, record }
    }

    pub async fn get(session: &Session, model_id: &str) -> Result<Self> {
        let record = session.models().get(model_id).await?;
        Ok(Self::from_record(session.clone(), record))
    }

    pub async fn list(
        session: &Session,
        filter: &ModelFilter,
        options: &ListOptions,
    ) -> Result<PaginatedResult<Model>> {
        let page = session.models().list(filter, options).await?;
        Ok(page.map(|record| Self::from_record(session.clone(), record)))
    }

    /// Register a model in the session's workspace and fetch it back
    pub async fn create(session: &Session, request: &CreateModelRequest) -> Result<Self> {
        let request = with_default_workspace(session, request);
        let model_id = session.models().create(&request).await?;
        tracing::info!("Created model {}", model_id);
        Self::get(session, &model_id).await
    }

    /// Register a model together with its first version
    ///
    /// Steps run in order: create the model, create the version, re-fetch both.
    /// If the version can not be created the model stays registered; removing it
    /// is up to the caller.
    pub async fn create_with_version(
        session: &Session,
        model: &CreateModelRequest,
        version: &CreateModelVersionRequest,
    ) -> Result<(Model, ModelVersion)> {
        let request = with_default_workspace(session, model);
        let model_id = session.models().create(&request).await?;
        tracing::info!("Created model {}", model_id);

        let version_name = session.models().create_version(&model_id, version).await?;
        tracing::info!("Created version {} of model {}", version_name, model_id);

        let model = Self::get(session, &model_id).await?;
        let version = ModelVersion::get(session, &model_id, &version_name).await?;
        Ok((model, version))
    }

    pub fn record(&self) -> &ModelRecord {
        &self.record
    }

    pub fn id(&self) -> &str {
        &self.record.model_id
    }

    pub fn name(&self) -> Option<&str> {
        self.record.model_name.as_deref()
    }

    pub async fn refresh(&mut self) -> Result<()> {
        let record = self.session.models().get(self.id()).await?;
        self.record = record;
        Ok(())
    }

    pub async fn versions(
        &self,
        filter: &ModelVersionFilter,
        options: &ListOptions,
    ) -> Result<PaginatedResult<ModelVersion>> {
        let page = self
            .session
            .models()
            .list_versions(self.id(), filter, options)
            .await?;
        Ok(page.map(|record| ModelVersion::from_record(self.session.clone(), self.id(), record)))
    }

    /// Latest version as reported with the model record
    pub fn latest_version(&self) -> Option<ModelVersion> {
        self.record
            .latest_version
            .clone()
            .map(|record| ModelVersion::from_record(self.session.clone(), self.id(), record))
    }

    pub async fn create_version(&self, request: &CreateModelVersionRequest) -> Result<ModelVersion> {
        let version_name = self
            .session
            .models()
            .create_version(self.id(), request)
            .await?;
        ModelVersion::get(&self.session, self.id(), &version_name).await
    }

    pub async fn delete(self) -> Result<()> {
        self.session.models().delete(self.id()).await
    }
}

/// One version of a model, bound to a session
#[derive(Debug, Clone)]
pub struct ModelVersion {
    session: Session,
    model_id: String,
    record: ModelVersionRecord,
}

impl ModelVersion {
    pub fn from_record(session: Session, model_id: &str, record: ModelVersionRecord) -> Self {
        Self {
            session,
            model_id: model_id.to_string(),
            record,
        }
    }

    pub async fn get(session: &Session, model_id: &str, version_name: &str) -> Result<Self> {
        let record = session.models().get_version(model_id, version_name).await?;
        Ok(Self::from_record(session.clone(), model_id, record))
    }

    pub fn record(&self) -> &ModelVersionRecord {
        &self.record
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn version_name(&self) -> &str {
        &self.record.version_name
    }

    pub fn uri(&self) -> Option<&str> {
        self.record.uri.as_deref()
    }

    pub async fn refresh(&mut self) -> Result<()> {
        let record = self
            .session
            .models()
            .get_version(&self.model_id, self.version_name())
            .await?;
        self.record = record;
        Ok(())
    }

    /// Service config for serving this version
    ///
    /// Starts from the version's inference spec, names the service and points
    /// `model_path` at the version's artifacts unless the spec already does.
    pub fn deploy_config(&self, service_name: &str) -> Result<ServiceConfig> {
        let config = match &self.record.inference_spec {
            Some(spec) => ServiceConfig::from_value(spec.clone())?,
            None => ServiceConfig::default(),
        };
        let mut config = config.with_name(service_name);
        if config.model_path.is_none()
            && let Some(uri) = self.uri()
        {
            config.model_path = Some(uri.to_string());
        }
        if config.processor.is_none() {
            return Err(PaiError::Validation(format!(
                "model {} version {} has no processor in its inference spec",
                self.model_id,
                self.version_name()
            )));
        }
        Ok(config)
    }

    /// Deploy this version as a new service and wait for it to run
    pub async fn deploy(
        &self,
        service_name: &str,
        timeout: Duration,
        interval: Duration,
        on_progress: Option<ProgressCallback>,
    ) -> Result<Service> {
        let config = self.deploy_config(service_name)?;
        Service::deploy(&self.session, &config, timeout, interval, on_progress).await
    }

    pub async fn delete(self) -> Result<()> {
        self.session
            .models()
            .delete_version(&self.model_id, self.version_name())
            .await
    }
}

fn with_default_workspace(session: &Session, request: &CreateModelRequest) -> CreateModelRequest {
    let mut request = request.clone();
    if request.workspace_id.is_none() {
        request.workspace_id = session.workspace_id().map(str::to_string);
    }
    request
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Credentials;
    use crate::service_config::Processor;
    use serde_json::json;

    fn session() -> Session {
        Session::builder()
            .credentials(Credentials::new("id", "secret"))
            .workspace_id("ws-1")
            .build()
            .unwrap()
    }

    fn version(spec: Option<serde_json::Value>) -> ModelVersion {
        let mut record = json!({"VersionName": "1", "Uri": "oss://bucket/model/1/"});
        if let Some(spec) = spec {
            record["InferenceSpec"] = spec;
        }
        ModelVersion::from_record(session(), "model-1", serde_json::from_value(record).unwrap())
    }

    #[test]
    fn test_deploy_config_from_inference_spec() {
        let v = version(Some(json!({
            "processor": "pytorch_cpu_1.10",
            "metadata": {"instance": 1, "cpu": 2}
        })));
        let config = v.deploy_config("resnet_svc").unwrap();
        assert_eq!(config.name(), Some("resnet_svc"));
        assert_eq!(config.model_path.as_deref(), Some("oss://bucket/model/1/"));
        assert_eq!(
            config.processor,
            Some(Processor::BuiltIn("pytorch_cpu_1.10".to_string()))
        );
        assert_eq!(config.metadata.unwrap().cpu, Some(2));
    }

    #[test]
    fn test_deploy_config_keeps_spec_model_path() {
        let v = version(Some(json!({
            "processor": "pmml",
            "model_path": "oss://bucket/other/"
        })));
        let config = v.deploy_config("svc").unwrap();
        assert_eq!(config.model_path.as_deref(), Some("oss://bucket/other/"));
    }

    #[test]
    fn test_deploy_config_needs_processor() {
        let err = version(None).deploy_config("svc").unwrap_err();
        assert!(err.is_bad_request());
    }

    #[test]
    fn test_default_workspace() {
        let request = CreateModelRequest {
            model_name: "m".to_string(),
            ..CreateModelRequest::default()
        };
        assert_eq!(
            with_default_workspace(&session(), &request).workspace_id.as_deref(),
            Some("ws-1")
        );
    }
}
