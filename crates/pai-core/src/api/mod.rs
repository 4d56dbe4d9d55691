//! Resource API facades
//!
//! One facade per resource kind, each wrapping the [`PaiClient`] of the product
//! that serves it. Every method is a single round trip: list calls return one
//! [`PaginatedResult`], `get` returns the record, `create` returns the new id, and
//! `update`/`delete` return nothing. Nothing is cached and nothing is retried.
//!
//! [`PaiClient`]: crate::client::PaiClient

pub mod dataset;
pub mod image;
pub mod model;
pub mod pipeline;
pub mod pipeline_run;
pub mod service;
pub mod training_job;
pub mod workspace;

pub use dataset::DatasetApi;
pub use image::ImageApi;
pub use model::ModelApi;
pub use pipeline::PipelineApi;
pub use pipeline_run::PipelineRunApi;
pub use service::ServiceApi;
pub use training_job::TrainingJobApi;
pub use workspace::WorkspaceApi;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::{ApiRequest, PaiClient};
use crate::error::Result;
use crate::pagination::{ListOptions, PaginatedResult};

/// Key/value label attached to datasets, models, images and versions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Label {
    pub key: String,
    pub value: String,
}

impl Label {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Add paging and ordering parameters; `sort_key` is the product's name for the
/// sort field parameter
pub(crate) fn with_list_options(
    request: ApiRequest,
    options: &ListOptions,
    sort_key: &str,
) -> ApiRequest {
    request
        .query_param("PageNumber", options.page_number)
        .query_param("PageSize", options.page_size)
        .query_opt(sort_key, options.sort_by.as_deref())
        .query_opt("Order", options.order)
}

/// Run a list request and decode the page found under `items_key`
pub(crate) async fn fetch_page<T, F>(
    client: &PaiClient,
    request: ApiRequest,
    filter: &F,
    options: &ListOptions,
    items_key: &str,
) -> Result<PaginatedResult<T>>
where
    T: DeserializeOwned,
    F: Serialize,
{
    let request = with_list_options(request.query_struct(filter)?, options, "SortBy");
    let body = client.execute_value(request).await?;
    page_from_body(body, items_key, options)
}

/// Pull items and `TotalCount` out of a list response body
///
/// A missing item array is an empty page. `TotalCount` may come as a number or a
/// numeric string.
pub(crate) fn page_from_body<T: DeserializeOwned>(
    mut body: Value,
    items_key: &str,
    options: &ListOptions,
) -> Result<PaginatedResult<T>> {
    let items: Vec<T> = match body.get_mut(items_key).map(Value::take) {
        Some(Value::Null) | None => Vec::new(),
        Some(items) => serde_json::from_value(items)?,
    };

    let total_count = match body.get("TotalCount") {
        Some(Value::Number(n)) => n.as_u64().unwrap_or_default(),
        Some(Value::String(s)) => s.parse().unwrap_or_default(),
        _ => items.len() as u64,
    };

    Ok(PaginatedResult::new(
        items,
        total_count,
        options.page_number,
        options.page_size,
    ))
}

/// Read the id a create call returned under `key`
pub(crate) fn id_from_body(body: &Value, key: &'static str) -> Result<String> {
    match body.get(key) {
        Some(Value::String(id)) => Ok(id.clone()),
        Some(Value::Number(id)) => Ok(id.to_string()),
        _ => Err(serde_json::Error::missing_field(key).into()),
    }
}
