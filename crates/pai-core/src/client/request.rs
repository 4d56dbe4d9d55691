//! Typed request building
//!
//! An [`ApiRequest`] carries everything the transport needs for one call: the API
//! action name, HTTP method, a path with `{Name}` placeholders, query pairs built
//! from non-null fields, and an optional JSON body.

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use super::signer::percent_encode;
use crate::error::{PaiError, Result};

/// A single API call, ready to be signed and sent
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub(crate) action: String,
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, action: impl Into<String>, path_template: &str) -> Self {
        Self {
            action: action.into(),
            method,
            path: path_template.to_string(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(action: impl Into<String>, path_template: &str) -> Self {
        Self::new(Method::GET, action, path_template)
    }

    pub fn post(action: impl Into<String>, path_template: &str) -> Self {
        Self::new(Method::POST, action, path_template)
    }

    pub fn put(action: impl Into<String>, path_template: &str) -> Self {
        Self::new(Method::PUT, action, path_template)
    }

    pub fn delete(action: impl Into<String>, path_template: &str) -> Self {
        Self::new(Method::DELETE, action, path_template)
    }

    /// Substitute `{name}` in the path with the URL-encoded `value`
    #[must_use]
    pub fn path_param(mut self, name: &str, value: &str) -> Self {
        self.path = self
            .path
            .replace(&format!("{{{}}}", name), &percent_encode(value));
        self
    }

    #[must_use]
    pub fn query_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Add a query pair only when `value` is present
    #[must_use]
    pub fn query_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.query_param(key, v),
            None => self,
        }
    }

    /// Add every non-null field of a serializable struct as query pairs
    ///
    /// Scalars are sent as-is, arrays of scalars are comma-joined, nested objects
    /// are sent as compact JSON.
    pub fn query_struct<S: Serialize>(mut self, params: &S) -> Result<Self> {
        match serde_json::to_value(params)? {
            Value::Object(map) => {
                for (key, value) in map {
                    if let Some(rendered) = render_query_value(&value) {
                        self.query.push((key, rendered));
                    }
                }
                Ok(self)
            }
            Value::Null => Ok(self),
            other => Err(PaiError::Validation(format!(
                "query parameters must serialize to an object, got {}",
                other
            ))),
        }
    }

    /// Attach a JSON body
    pub fn json_body<S: Serialize>(mut self, body: &S) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    #[must_use]
    pub fn body_value(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Fail if any `{placeholder}` was left unsubstituted
    pub(crate) fn check_path(&self) -> Result<()> {
        if let Some(start) = self.path.find('{') {
            let rest = &self.path[start..];
            let end = rest.find('}').map_or(rest.len(), |i| i + 1);
            return Err(PaiError::Validation(format!(
                "{}: missing path parameter {}",
                self.action,
                &rest[..end]
            )));
        }
        Ok(())
    }
}

fn render_query_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) if items.is_empty() => None,
        Value::Array(items) if items.iter().all(|v| !v.is_object() && !v.is_array()) => Some(
            items
                .iter()
                .filter_map(render_query_value)
                .collect::<Vec<_>>()
                .join(","),
        ),
        other => Some(other.to_string()),
    }
}
