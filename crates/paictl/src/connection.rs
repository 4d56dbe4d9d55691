//! Session management for PAI commands

use std::path::PathBuf;

use pai_core::config::{ENV_ACCESS_KEY_ID, ENV_ACCESS_KEY_SECRET};
use pai_core::{Config, Session};
use tracing::{debug, info};

use crate::error::{PaictlError, Result};

/// Holds the loaded configuration and turns it into sessions
#[derive(Clone)]
pub struct ConnectionManager {
    pub config: Config,
    pub config_path: Option<PathBuf>,
}

impl ConnectionManager {
    pub fn with_config_path(config: Config, config_path: Option<PathBuf>) -> Self {
        Self {
            config,
            config_path,
        }
    }

    /// Save the configuration to where it was loaded from
    pub fn save_config(&self) -> Result<()> {
        match &self.config_path {
            Some(path) => self.config.save_to_path(path)?,
            None => self.config.save()?,
        }
        Ok(())
    }

    /// Path of the configuration file in use
    pub fn config_file(&self) -> Result<PathBuf> {
        match &self.config_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Config::config_path()?),
        }
    }

    /// Build a session for `profile_name`
    ///
    /// Without an explicit profile or `--config-file`, a complete AccessKey pair in
    /// the environment wins over the config file. An explicit config file never
    /// falls back to environment-only credentials.
    pub fn session(&self, profile_name: Option<&str>) -> Result<Session> {
        let env_credentials =
            std::env::var(ENV_ACCESS_KEY_ID).is_ok() && std::env::var(ENV_ACCESS_KEY_SECRET).is_ok();

        if profile_name.is_none() && self.config_path.is_none() && env_credentials {
            info!("Using credentials from environment variables");
            return Ok(Session::from_env()?);
        }

        if self.config.profiles.is_empty() && profile_name.is_none() {
            return Err(PaictlError::NoProfileConfigured);
        }

        let session = Session::from_config(&self.config, profile_name)?;
        debug!(
            "Session for region {} (workspace {:?})",
            session.region_id(),
            session.workspace_id()
        );
        Ok(session)
    }
}

/// Pick an explicit workspace or fall back to the session's
pub fn workspace_or_default(session: &Session, explicit: Option<&String>) -> Option<String> {
    explicit
        .cloned()
        .or_else(|| session.workspace_id().map(str::to_string))
}
