//! Entity objects
//!
//! Entities pair a fetched record with the [`Session`](crate::Session) it came
//! from and add the multi-step workflows: deploying a service and waiting for it,
//! registering a model with its first version, refreshing, and lifecycle actions.
//! Records are never cached beyond the entity itself; `refresh` re-fetches.

mod model;
mod service;
mod workspace;

pub use model::{Model, ModelVersion};
pub use service::{DEPLOY_UNEXPECTED, Service};
pub use workspace::Workspace;
