//! Sessions: one configured client per PAI product
//!
//! A [`Session`] is the handle every facade and entity works through. It owns a
//! [`PaiClient`] for each product, all sharing one set of credentials and one
//! region, plus the default workspace id. Sessions are cheap to clone and never
//! change after construction.
//!
//! ```rust,ignore
//! use pai_core::Session;
//!
//! // From ALIBABA_CLOUD_* environment variables
//! let session = Session::from_env()?;
//!
//! // From a named profile in ~/.config/paictl/config.toml
//! let config = pai_core::Config::load()?;
//! let session = Session::from_config(&config, Some("prod"))?;
//!
//! let models = session.models().list(&Default::default(), &Default::default()).await?;
//! ```

use std::env;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crate::api::{
    DatasetApi, ImageApi, ModelApi, PipelineApi, PipelineRunApi, ServiceApi, TrainingJobApi,
    WorkspaceApi,
};
use crate::client::{Credentials, DEFAULT_TIMEOUT, PaiClient, Product};
use crate::config::{
    Config, ConfigError, DEFAULT_REGION, ENV_ACCESS_KEY_ID, ENV_ACCESS_KEY_SECRET, ENV_REGION_ID,
    ENV_SECURITY_TOKEN, ENV_WORKSPACE_ID, EndpointOverrides, Profile,
};
use crate::error::{PaiError, Result};

static DEFAULT_SESSION: OnceLock<Session> = OnceLock::new();

/// Shared handle to the product clients
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    region_id: String,
    workspace_id: Option<String>,
    aiworkspace: PaiClient,
    dlc: PaiClient,
    paiflow: PaiClient,
    eas: PaiClient,
}

/// Builder for [`Session`]
#[derive(Debug, Default)]
pub struct SessionBuilder {
    credentials: Option<Credentials>,
    region_id: Option<String>,
    workspace_id: Option<String>,
    endpoints: EndpointOverrides,
    timeout: Option<Duration>,
}

impl SessionBuilder {
    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    #[must_use]
    pub fn region_id(mut self, region_id: impl Into<String>) -> Self {
        self.region_id = Some(region_id.into());
        self
    }

    #[must_use]
    pub fn workspace_id(mut self, workspace_id: impl Into<String>) -> Self {
        self.workspace_id = Some(workspace_id.into());
        self
    }

    /// Send requests for `product` to `endpoint` instead of the regional default
    #[must_use]
    pub fn endpoint(mut self, product: Product, endpoint: impl Into<String>) -> Self {
        self.endpoints.set(product, endpoint);
        self
    }

    #[must_use]
    pub fn endpoints(mut self, endpoints: EndpointOverrides) -> Self {
        self.endpoints = endpoints;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<Session> {
        let credentials = self.credentials.ok_or_else(|| {
            PaiError::Validation("a session needs credentials".to_string())
        })?;
        let region_id = self.region_id.unwrap_or_else(|| DEFAULT_REGION.to_string());
        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);

        let client = |product: Product| -> Result<PaiClient> {
            let mut builder = PaiClient::builder(product)
                .region_id(region_id.clone())
                .credentials(credentials.clone())
                .timeout(timeout);
            if let Some(endpoint) = self.endpoints.get(product) {
                builder = builder.endpoint(endpoint);
            }
            builder.build()
        };

        let inner = SessionInner {
            aiworkspace: client(Product::AiWorkspace)?,
            dlc: client(Product::Dlc)?,
            paiflow: client(Product::PaiFlow)?,
            eas: client(Product::Eas)?,
            workspace_id: self.workspace_id,
            region_id,
        };
        tracing::debug!(
            "Session ready for region {} (workspace {:?})",
            inner.region_id,
            inner.workspace_id
        );

        Ok(Session {
            inner: Arc::new(inner),
        })
    }
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    /// Build a session from a profile, applying environment overrides
    pub fn from_profile(profile: &Profile) -> Result<Self> {
        let mut builder = Self::builder()
            .credentials(profile.resolve_credentials()?)
            .region_id(profile.resolve_region())
            .endpoints(profile.endpoints.clone());
        if let Some(workspace_id) = profile.resolve_workspace_id() {
            builder = builder.workspace_id(workspace_id);
        }
        if let Some(secs) = profile.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        builder.build()
    }

    /// Build a session from a profile in `config`
    ///
    /// Uses `profile_name` when given, otherwise the config's default profile.
    pub fn from_config(config: &Config, profile_name: Option<&str>) -> Result<Self> {
        let (name, profile) = config.get_profile(profile_name)?;
        tracing::debug!("Using profile '{}'", name);
        Self::from_profile(profile)
    }

    /// Build a session from `ALIBABA_CLOUD_*` and `PAI_WORKSPACE_ID` variables
    pub fn from_env() -> Result<Self> {
        let access_key_id = required_env("access key id", ENV_ACCESS_KEY_ID)?;
        let access_key_secret = required_env("access key secret", ENV_ACCESS_KEY_SECRET)?;

        let mut credentials = Credentials::new(access_key_id, access_key_secret);
        if let Ok(token) = env::var(ENV_SECURITY_TOKEN) {
            credentials = credentials.with_security_token(token);
        }

        let mut builder = Self::builder().credentials(credentials);
        if let Ok(region) = env::var(ENV_REGION_ID) {
            builder = builder.region_id(region);
        }
        if let Ok(workspace_id) = env::var(ENV_WORKSPACE_ID) {
            builder = builder.workspace_id(workspace_id);
        }
        builder.build()
    }

    /// The process-wide session, created on first use
    ///
    /// Environment credentials take precedence; otherwise the default profile of
    /// the standard config file is used. Once a session has been created it is
    /// returned by every later call.
    pub fn default_session() -> Result<Session> {
        if let Some(session) = DEFAULT_SESSION.get() {
            return Ok(session.clone());
        }

        let session = if env::var(ENV_ACCESS_KEY_ID).is_ok() {
            Self::from_env()?
        } else {
            Self::from_config(&Config::load()?, None)?
        };
        Ok(DEFAULT_SESSION.get_or_init(|| session).clone())
    }

    /// Install `session` as the process-wide default
    ///
    /// Returns the session back if a default was already set.
    pub fn set_default(session: Session) -> std::result::Result<(), Session> {
        DEFAULT_SESSION.set(session)
    }

    pub fn region_id(&self) -> &str {
        &self.inner.region_id
    }

    pub fn workspace_id(&self) -> Option<&str> {
        self.inner.workspace_id.as_deref()
    }

    /// The default workspace, or a validation error naming what needs it
    pub fn require_workspace_id(&self, purpose: &str) -> Result<&str> {
        self.workspace_id().ok_or_else(|| {
            PaiError::Validation(format!(
                "{} needs a workspace id; set one in the profile or via {}",
                purpose, ENV_WORKSPACE_ID
            ))
        })
    }

    pub fn client(&self, product: Product) -> &PaiClient {
        match product {
            Product::AiWorkspace => &self.inner.aiworkspace,
            Product::Dlc => &self.inner.dlc,
            Product::PaiFlow => &self.inner.paiflow,
            Product::Eas => &self.inner.eas,
        }
    }

    pub fn datasets(&self) -> DatasetApi {
        DatasetApi::new(self.inner.aiworkspace.clone())
    }

    pub fn models(&self) -> ModelApi {
        ModelApi::new(self.inner.aiworkspace.clone())
    }

    pub fn images(&self) -> ImageApi {
        ImageApi::new(self.inner.aiworkspace.clone())
    }

    pub fn workspaces(&self) -> WorkspaceApi {
        WorkspaceApi::new(self.inner.aiworkspace.clone())
    }

    pub fn pipelines(&self) -> PipelineApi {
        PipelineApi::new(self.inner.paiflow.clone())
    }

    pub fn pipeline_runs(&self) -> PipelineRunApi {
        PipelineRunApi::new(self.inner.paiflow.clone())
    }

    pub fn training_jobs(&self) -> TrainingJobApi {
        TrainingJobApi::new(self.inner.dlc.clone())
    }

    pub fn services(&self) -> ServiceApi {
        ServiceApi::new(self.inner.eas.clone())
    }
}

fn required_env(field: &str, var: &str) -> Result<String> {
    env::var(var).map_err(|_| {
        PaiError::Config(ConfigError::MissingField {
            field: field.to_string(),
            env_var: var.to_string(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for var in [
            ENV_ACCESS_KEY_ID,
            ENV_ACCESS_KEY_SECRET,
            ENV_SECURITY_TOKEN,
            ENV_REGION_ID,
            ENV_WORKSPACE_ID,
        ] {
            unsafe { env::remove_var(var) };
        }
    }

    #[test]
    fn test_builder_uses_region_and_overrides() {
        let session = Session::builder()
            .credentials(Credentials::new("id", "secret"))
            .region_id("cn-shanghai")
            .endpoint(Product::Eas, "http://127.0.0.1:8080")
            .build()
            .unwrap();

        assert_eq!(session.region_id(), "cn-shanghai");
        assert_eq!(
            session.client(Product::Dlc).endpoint(),
            "https://pai-dlc.cn-shanghai.aliyuncs.com/"
        );
        assert_eq!(session.client(Product::Eas).endpoint(), "http://127.0.0.1:8080/");
        assert!(session.workspace_id().is_none());
        assert!(session.require_workspace_id("listing models").is_err());
    }

    #[test]
    fn test_builder_requires_credentials() {
        assert!(Session::builder().build().is_err());
    }

    #[test]
    #[serial]
    fn test_from_env() {
        clear_env();
        unsafe {
            env::set_var(ENV_ACCESS_KEY_ID, "env-id");
            env::set_var(ENV_ACCESS_KEY_SECRET, "env-secret");
            env::set_var(ENV_REGION_ID, "cn-beijing");
            env::set_var(ENV_WORKSPACE_ID, "ws-42");
        }

        let session = Session::from_env().unwrap();
        assert_eq!(session.region_id(), "cn-beijing");
        assert_eq!(session.workspace_id(), Some("ws-42"));
        assert_eq!(
            session.client(Product::AiWorkspace).endpoint(),
            "https://aiworkspace.cn-beijing.aliyuncs.com/"
        );

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_missing_secret() {
        clear_env();
        unsafe { env::set_var(ENV_ACCESS_KEY_ID, "env-id") };

        let err = Session::from_env().unwrap_err();
        assert!(err.to_string().contains(ENV_ACCESS_KEY_SECRET));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_profile() {
        clear_env();
        let mut profile = Profile::new("id", "secret");
        profile.region_id = "cn-shenzhen".to_string();
        profile.workspace_id = Some("ws-1".to_string());
        profile.endpoints.set(Product::PaiFlow, "http://localhost:9000");

        let session = Session::from_profile(&profile).unwrap();
        assert_eq!(session.region_id(), "cn-shenzhen");
        assert_eq!(session.workspace_id(), Some("ws-1"));
        assert_eq!(
            session.client(Product::PaiFlow).endpoint(),
            "http://localhost:9000/"
        );
    }
}
