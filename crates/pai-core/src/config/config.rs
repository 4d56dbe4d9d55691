//! Configuration management for PAI clients
//!
//! Handles configuration loading from files and environment variables.
//! Configuration is stored in TOML format with support for multiple named profiles.

#[cfg(target_os = "macos")]
use directories::BaseDirs;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::credential::CredentialStore;
use super::error::{ConfigError, Result};
use crate::client::{Credentials, Product};

/// Environment variable holding the access key id
pub const ENV_ACCESS_KEY_ID: &str = "ALIBABA_CLOUD_ACCESS_KEY_ID";
/// Environment variable holding the access key secret
pub const ENV_ACCESS_KEY_SECRET: &str = "ALIBABA_CLOUD_ACCESS_KEY_SECRET";
/// Environment variable holding an STS security token
pub const ENV_SECURITY_TOKEN: &str = "ALIBABA_CLOUD_SECURITY_TOKEN";
/// Environment variable holding the region id
pub const ENV_REGION_ID: &str = "ALIBABA_CLOUD_REGION_ID";
/// Environment variable holding the default workspace id
pub const ENV_WORKSPACE_ID: &str = "PAI_WORKSPACE_ID";

/// Region used when neither profile nor environment names one
pub const DEFAULT_REGION: &str = "cn-hangzhou";

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    /// Profile used when none is given explicitly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,
    /// Map of profile name -> profile configuration
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

/// Individual profile configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Profile {
    /// AccessKey id; supports `keyring:` references
    pub access_key_id: String,
    /// AccessKey secret; supports `keyring:` references
    pub access_key_secret: String,
    /// STS token for temporary credentials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_token: Option<String>,
    /// Region all product endpoints are derived from
    #[serde(default = "default_region")]
    pub region_id: String,
    /// Workspace used by commands that need one and were not given one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    /// Per-product endpoint overrides (VPC endpoints, proxies, tests)
    #[serde(default, skip_serializing_if = "EndpointOverrides::is_empty")]
    pub endpoints: EndpointOverrides,
    /// HTTP request timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Explicit endpoint URLs per product
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct EndpointOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aiworkspace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dlc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paiflow: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eas: Option<String>,
}

impl EndpointOverrides {
    pub fn is_empty(&self) -> bool {
        self.aiworkspace.is_none()
            && self.dlc.is_none()
            && self.paiflow.is_none()
            && self.eas.is_none()
    }

    /// Override configured for `product`, if any
    pub fn get(&self, product: Product) -> Option<&str> {
        match product {
            Product::AiWorkspace => self.aiworkspace.as_deref(),
            Product::Dlc => self.dlc.as_deref(),
            Product::PaiFlow => self.paiflow.as_deref(),
            Product::Eas => self.eas.as_deref(),
        }
    }

    pub fn set(&mut self, product: Product, url: impl Into<String>) {
        let slot = match product {
            Product::AiWorkspace => &mut self.aiworkspace,
            Product::Dlc => &mut self.dlc,
            Product::PaiFlow => &mut self.paiflow,
            Product::Eas => &mut self.eas,
        };
        *slot = Some(url.into());
    }
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

impl Profile {
    /// Create a profile with the required credential fields
    pub fn new(access_key_id: impl Into<String>, access_key_secret: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            access_key_secret: access_key_secret.into(),
            security_token: None,
            region_id: default_region(),
            workspace_id: None,
            endpoints: EndpointOverrides::default(),
            timeout_secs: None,
        }
    }

    /// Get resolved credentials (environment overrides, keyring lookup)
    pub fn resolve_credentials(&self) -> Result<Credentials> {
        let store = CredentialStore::new();

        let access_key_id = store
            .get_credential(&self.access_key_id, Some(ENV_ACCESS_KEY_ID))
            .map_err(|e| {
                ConfigError::CredentialError(format!("Failed to resolve access key id: {}", e))
            })?;
        let access_key_secret = store
            .get_credential(&self.access_key_secret, Some(ENV_ACCESS_KEY_SECRET))
            .map_err(|e| {
                ConfigError::CredentialError(format!(
                    "Failed to resolve access key secret: {}",
                    e
                ))
            })?;
        let security_token = match (&self.security_token, std::env::var(ENV_SECURITY_TOKEN)) {
            (_, Ok(token)) => Some(token),
            (Some(token), Err(_)) => Some(store.get_credential(token, None).map_err(|e| {
                ConfigError::CredentialError(format!("Failed to resolve security token: {}", e))
            })?),
            (None, Err(_)) => None,
        };

        Ok(Credentials {
            access_key_id,
            access_key_secret,
            security_token,
        })
    }

    /// Region after applying the environment override
    pub fn resolve_region(&self) -> String {
        std::env::var(ENV_REGION_ID).unwrap_or_else(|_| self.region_id.clone())
    }

    /// Workspace after applying the environment override
    pub fn resolve_workspace_id(&self) -> Option<String> {
        std::env::var(ENV_WORKSPACE_ID)
            .ok()
            .or_else(|| self.workspace_id.clone())
    }
}

impl Config {
    /// Resolve the profile name to use
    ///
    /// Resolution order: explicit name, `default_profile`, first profile by name.
    pub fn resolve_profile(&self, explicit_profile: Option<&str>) -> Result<String> {
        if let Some(profile_name) = explicit_profile {
            return Ok(profile_name.to_string());
        }

        if let Some(ref default) = self.default_profile {
            return Ok(default.clone());
        }

        let mut names: Vec<_> = self.profiles.keys().collect();
        names.sort();
        names
            .first()
            .map(|name| (*name).clone())
            .ok_or_else(|| ConfigError::NoProfiles {
                suggestion: "Use 'paictl profile set' to create a profile.".to_string(),
            })
    }

    /// Look up a resolved profile
    pub fn get_profile(&self, explicit_profile: Option<&str>) -> Result<(String, &Profile)> {
        let name = self.resolve_profile(explicit_profile)?;
        let profile = self
            .profiles
            .get(&name)
            .ok_or_else(|| ConfigError::ProfileNotFound { name: name.clone() })?;
        Ok((name, profile))
    }

    /// Load configuration from the standard location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path; a missing file yields the default
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::LoadError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        let expanded_content = Self::expand_env_vars(&content);
        let config: Config = toml::from_str(&expanded_content)?;

        Ok(config)
    }

    /// Save configuration to the standard location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to_path(&config_path)
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::SaveError {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let content = toml::to_string_pretty(self)?;

        fs::write(config_path, content).map_err(|e| ConfigError::SaveError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        Ok(())
    }

    /// Set or update a profile
    pub fn set_profile(&mut self, name: String, profile: Profile) {
        self.profiles.insert(name, profile);
    }

    /// Remove a profile by name, clearing the default if it pointed there
    pub fn remove_profile(&mut self, name: &str) -> Option<Profile> {
        if self.default_profile.as_deref() == Some(name) {
            self.default_profile = None;
        }
        self.profiles.remove(name)
    }

    /// List all profiles sorted by name
    pub fn list_profiles(&self) -> Vec<(&String, &Profile)> {
        let mut profiles: Vec<_> = self.profiles.iter().collect();
        profiles.sort_by_key(|(name, _)| *name);
        profiles
    }

    /// Get the path to the configuration file
    ///
    /// On macOS, `~/.config/paictl/config.toml` is preferred when it (or its
    /// directory) exists, falling back to the platform location.
    /// On Linux: `~/.config/paictl/config.toml`
    pub fn config_path() -> Result<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            if let Some(base_dirs) = BaseDirs::new() {
                let linux_style_path = base_dirs
                    .home_dir()
                    .join(".config")
                    .join("paictl")
                    .join("config.toml");

                if linux_style_path.exists()
                    || linux_style_path.parent().is_some_and(|p| p.exists())
                {
                    return Ok(linux_style_path);
                }
            }
        }

        let proj_dirs =
            ProjectDirs::from("com", "aliyun", "paictl").ok_or(ConfigError::ConfigDirError)?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Expand `${VAR}` and `${VAR:-default}` references
    ///
    /// Unset variables without a default are left as written so that profiles
    /// which are never used do not fail to load.
    fn expand_env_vars(content: &str) -> String {
        shellexpand::env_with_context_no_errors(content, |var| std::env::var(var).ok())
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_profile(region: &str) -> Profile {
        let mut profile = Profile::new("LTAI-test", "secret");
        profile.region_id = region.to_string();
        profile
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::default();
        let mut profile = make_profile("cn-shanghai");
        profile.workspace_id = Some("12345".to_string());
        profile.endpoints.set(Product::Eas, "http://localhost:8080");

        config.set_profile("dev".to_string(), profile);
        config.default_profile = Some("dev".to_string());

        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();

        assert_eq!(config.default_profile, deserialized.default_profile);
        let dev = &deserialized.profiles["dev"];
        assert_eq!(dev.region_id, "cn-shanghai");
        assert_eq!(dev.workspace_id.as_deref(), Some("12345"));
        assert_eq!(dev.endpoints.get(Product::Eas), Some("http://localhost:8080"));
        assert_eq!(dev.endpoints.get(Product::Dlc), None);
    }

    #[test]
    fn test_profile_defaults() {
        let content = r#"
[profiles.minimal]
access_key_id = "id"
access_key_secret = "secret"
"#;
        let config: Config = toml::from_str(content).unwrap();
        let profile = &config.profiles["minimal"];
        assert_eq!(profile.region_id, DEFAULT_REGION);
        assert!(profile.security_token.is_none());
        assert!(profile.endpoints.is_empty());
    }

    #[test]
    fn test_profile_resolution() {
        let mut config = Config::default();
        config.set_profile("zeta".to_string(), make_profile("cn-hangzhou"));
        config.set_profile("alpha".to_string(), make_profile("cn-beijing"));

        assert_eq!(config.resolve_profile(Some("zeta")).unwrap(), "zeta");
        assert_eq!(config.resolve_profile(None).unwrap(), "alpha");

        config.default_profile = Some("zeta".to_string());
        assert_eq!(config.resolve_profile(None).unwrap(), "zeta");

        let (name, profile) = config.get_profile(None).unwrap();
        assert_eq!(name, "zeta");
        assert_eq!(profile.region_id, "cn-hangzhou");
    }

    #[test]
    fn test_no_profile_errors() {
        let config = Config::default();
        let err = config.resolve_profile(None).unwrap_err();
        assert!(err.to_string().contains("No profiles configured"));

        let err = config.get_profile(Some("ghost")).unwrap_err();
        assert!(err.to_string().contains("'ghost' not found"));
    }

    #[test]
    fn test_remove_profile_clears_default() {
        let mut config = Config::default();
        config.set_profile("dev".to_string(), make_profile("cn-hangzhou"));
        config.default_profile = Some("dev".to_string());

        assert!(config.remove_profile("dev").is_some());
        assert!(config.default_profile.is_none());
        assert!(config.remove_profile("dev").is_none());
    }

    #[test]
    #[serial_test::serial]
    fn test_env_var_expansion_with_defaults() {
        unsafe {
            std::env::set_var("PAI_TEST_AK", "expanded-id");
            std::env::remove_var("PAI_TEST_MISSING_REGION");
        }

        let content = r#"
[profiles.test]
access_key_id = "${PAI_TEST_AK}"
access_key_secret = "static"
region_id = "${PAI_TEST_MISSING_REGION:-cn-shenzhen}"
"#;

        let expanded = Config::expand_env_vars(content);
        let config: Config = toml::from_str(&expanded).unwrap();
        let profile = &config.profiles["test"];
        assert_eq!(profile.access_key_id, "expanded-id");
        assert_eq!(profile.region_id, "cn-shenzhen");

        unsafe {
            std::env::remove_var("PAI_TEST_AK");
        }
    }

    #[test]
    #[serial_test::serial]
    fn test_resolve_credentials_env_override() {
        unsafe {
            std::env::remove_var(ENV_ACCESS_KEY_ID);
            std::env::set_var(ENV_ACCESS_KEY_SECRET, "from-env");
            std::env::remove_var(ENV_SECURITY_TOKEN);
        }

        let mut profile = make_profile("cn-hangzhou");
        profile.security_token = Some("sts-token".to_string());
        let creds = profile.resolve_credentials().unwrap();
        assert_eq!(creds.access_key_id, "LTAI-test");
        assert_eq!(creds.access_key_secret, "from-env");
        assert_eq!(creds.security_token.as_deref(), Some("sts-token"));

        unsafe {
            std::env::remove_var(ENV_ACCESS_KEY_SECRET);
        }
    }
}
