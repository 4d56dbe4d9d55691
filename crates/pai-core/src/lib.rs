//! # pai-core
//!
//! Client library for Alibaba Cloud Platform for AI (PAI): workspaces, datasets,
//! models and images (AIWorkspace), training jobs (DLC), pipelines (PAIFlow) and
//! online inference services (EAS).
//!
//! ## Layers
//!
//! - [`client`] - signed HTTP transport, one [`PaiClient`] per product
//! - [`api`] - one facade per resource kind with list/get/create/update/delete
//! - [`entity`] - records bound to a [`Session`], with multi-step workflows
//!
//! Around them:
//!
//! - [`pagination`] - paged results and lazy page streams
//! - [`progress`] - status polling with progress callbacks
//! - [`service_config`] - typed, round-trip-preserving EAS service documents
//! - [`config`] - profiles, credentials and the config file
//! - [`oss`] - `oss://` URI handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use pai_core::{Session, entity::Service, service_config::{Processor, ServiceConfig}};
//! use std::time::Duration;
//!
//! let session = Session::from_env()?;
//! let config = ServiceConfig::new("iris_demo")
//!     .with_instance_count(1)
//!     .with_resource(1, 2000)
//!     .with_processor(Processor::BuiltIn("pmml".to_string()))
//!     .with_model_path("oss://bucket/iris.pmml");
//!
//! let service = Service::deploy(
//!     &session,
//!     &config,
//!     Duration::from_secs(600),
//!     Duration::from_secs(5),
//!     None,
//! )
//! .await?;
//! println!("{:?}", service.endpoint());
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod entity;
pub mod error;
pub mod oss;
pub mod pagination;
pub mod progress;
pub mod service_config;
pub mod session;

pub use client::{ApiRequest, Credentials, PaiClient, Product};
pub use config::{Config, ConfigError, CredentialStore, Profile};
pub use error::{PaiError, Result};
pub use pagination::{ListOptions, PaginatedResult, SortOrder, paginate};
pub use progress::{
    ProgressCallback, ProgressEvent, ServiceStatus, StatusSource, wait_for_status,
};
pub use service_config::ServiceConfig;
pub use session::{Session, SessionBuilder};
