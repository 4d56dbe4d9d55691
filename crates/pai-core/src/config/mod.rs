//! Configuration and profile management for PAI clients
//!
//! # Features
//!
//! - Multiple named profiles (credentials, region, default workspace)
//! - Secure credential storage using OS keyring (optional)
//! - Environment variable expansion in config files
//! - Per-product endpoint overrides

#![allow(clippy::module_inception)]

pub mod config;
pub mod credential;
pub mod error;

pub use config::{
    Config, DEFAULT_REGION, ENV_ACCESS_KEY_ID, ENV_ACCESS_KEY_SECRET, ENV_REGION_ID,
    ENV_SECURITY_TOKEN, ENV_WORKSPACE_ID, EndpointOverrides, Profile,
};
pub use credential::{CredentialStorage, CredentialStore};
pub use error::{ConfigError, Result};
