//! Signed HTTP transport for PAI products
//!
//! One [`PaiClient`] talks to one product endpoint. It signs each [`ApiRequest`],
//! sends it, and decodes the JSON response. Service errors, whether reported through
//! the HTTP status or through an embedded `Code` field, become [`PaiError`]s.
//!
//! ```rust,ignore
//! use pai_core::client::{ApiRequest, Credentials, PaiClient, Product};
//!
//! let client = PaiClient::builder(Product::Eas)
//!     .region_id("cn-hangzhou")
//!     .credentials(Credentials::new("LTAI...", "secret"))
//!     .build()?;
//!
//! let services: serde_json::Value = client
//!     .execute(ApiRequest::get("ListServices", "/api/v2/services"))
//!     .await?;
//! ```

pub mod endpoint;
pub mod request;
pub mod signer;

pub use endpoint::Product;
pub use request::ApiRequest;
pub use signer::Credentials;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

use crate::error::{PaiError, Result};

/// User agent string for SDK HTTP requests
pub const USER_AGENT: &str = concat!("pai-core/", env!("CARGO_PKG_VERSION"));

/// Default HTTP request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for a single PAI product endpoint
///
/// Cheap to clone; clones share the underlying connection pool and are never
/// mutated after construction.
#[derive(Clone, Debug)]
pub struct PaiClient {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
struct ClientInner {
    http: reqwest::Client,
    product: Product,
    endpoint: url::Url,
    credentials: Credentials,
}

/// Builder for [`PaiClient`]
#[derive(Debug)]
pub struct PaiClientBuilder {
    product: Product,
    region_id: Option<String>,
    endpoint: Option<String>,
    credentials: Option<Credentials>,
    timeout: Duration,
    user_agent: String,
}

impl PaiClientBuilder {
    /// Region used to derive the default endpoint
    #[must_use]
    pub fn region_id(mut self, region_id: impl Into<String>) -> Self {
        self.region_id = Some(region_id.into());
        self
    }

    /// Explicit endpoint URL, overriding the region-derived one
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn build(self) -> Result<PaiClient> {
        let credentials = self.credentials.ok_or_else(|| {
            PaiError::Validation(format!("{}: credentials are required", self.product))
        })?;

        let endpoint = match (self.endpoint, self.region_id) {
            (Some(endpoint), _) => endpoint,
            (None, Some(region)) => self.product.default_endpoint(&region),
            (None, None) => {
                return Err(PaiError::Validation(format!(
                    "{}: either an endpoint or a region id is required",
                    self.product
                )));
            }
        };
        let endpoint = url::Url::parse(endpoint.trim_end_matches('/')).map_err(|e| {
            PaiError::Validation(format!("invalid endpoint '{}': {}", endpoint, e))
        })?;

        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .build()?;

        debug!("Created {} client for {}", self.product, endpoint);

        Ok(PaiClient {
            inner: Arc::new(ClientInner {
                http,
                product: self.product,
                endpoint,
                credentials,
            }),
        })
    }
}

/// Error fields PAI services put in failed response bodies
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default, alias = "code")]
    #[serde(rename = "Code")]
    code: Option<Value>,
    #[serde(default, alias = "message")]
    #[serde(rename = "Message")]
    message: Option<String>,
    #[serde(default, alias = "requestId")]
    #[serde(rename = "RequestId")]
    request_id: Option<String>,
}

impl PaiClient {
    pub fn builder(product: Product) -> PaiClientBuilder {
        PaiClientBuilder {
            product,
            region_id: None,
            endpoint: None,
            credentials: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: USER_AGENT.to_string(),
        }
    }

    pub fn product(&self) -> Product {
        self.inner.product
    }

    pub fn endpoint(&self) -> &str {
        self.inner.endpoint.as_str()
    }

    /// Send a request and decode the response body into `T`
    pub async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let value = self.execute_value(request).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Send a request whose response body carries nothing of interest
    pub async fn execute_unit(&self, request: ApiRequest) -> Result<()> {
        self.execute_value(request).await.map(|_| ())
    }

    /// Send a request and return the raw JSON response body
    pub async fn execute_value(&self, request: ApiRequest) -> Result<Value> {
        request.check_path()?;
        let inner = &self.inner;

        let payload = match &request.body {
            Some(body) => serde_json::to_vec(body)?,
            None => Vec::new(),
        };
        let payload_hash = signer::hash_hex(&payload);

        let mut signed: BTreeMap<String, String> = BTreeMap::new();
        signed.insert("host".to_string(), host_header(&inner.endpoint));
        signed.insert("x-acs-action".to_string(), request.action.clone());
        signed.insert(
            "x-acs-version".to_string(),
            inner.product.api_version().to_string(),
        );
        signed.insert(
            "x-acs-date".to_string(),
            chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        );
        signed.insert(
            "x-acs-signature-nonce".to_string(),
            uuid::Uuid::new_v4().to_string(),
        );
        signed.insert("x-acs-content-sha256".to_string(), payload_hash.clone());
        if let Some(token) = &inner.credentials.security_token {
            signed.insert("x-acs-security-token".to_string(), token.clone());
        }
        if request.body.is_some() {
            signed.insert(
                CONTENT_TYPE.as_str().to_string(),
                "application/json; charset=utf-8".to_string(),
            );
        }

        let authorization = signer::authorization(
            &inner.credentials,
            request.method.as_str(),
            &request.path,
            &request.query,
            &signed,
            &payload_hash,
        )?;

        let mut headers = HeaderMap::new();
        for (name, value) in signed.iter().filter(|(name, _)| name.as_str() != "host") {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| PaiError::Validation(format!("invalid header name: {}", e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| PaiError::Validation(format!("invalid header value: {}", e)))?;
            headers.insert(name, value);
        }
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&authorization)
                .map_err(|e| PaiError::Validation(format!("invalid authorization: {}", e)))?,
        );

        let url = self.request_url(&request);
        debug!(
            "{} {} {} ({})",
            inner.product, request.method, request.path, request.action
        );
        trace!("Request URL: {}", url);
        if let Some(body) = &request.body {
            trace!("Request body: {}", body);
        }

        let response = inner
            .http
            .request(request.method.clone(), url)
            .headers(headers)
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        let header_request_id = response
            .headers()
            .get("x-acs-request-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;
        trace!(
            "Response {} body: {}",
            status,
            String::from_utf8_lossy(&bytes)
        );

        if !status.is_success() {
            let body: ErrorBody = serde_json::from_slice(&bytes).unwrap_or_default();
            debug!("{} failed with HTTP {}", request.action, status);
            return Err(PaiError::from_service(
                &request.action,
                status.as_u16(),
                body.code.as_ref().map(code_string),
                body.message,
                body.request_id.or(header_request_id),
            ));
        }

        let value: Value = if bytes.is_empty() {
            Value::Object(serde_json::Map::new())
        } else {
            serde_json::from_slice(&bytes)?
        };

        if let Some(code) = value.get("Code")
            && !is_success_code(code)
        {
            let body: ErrorBody = serde_json::from_value(value.clone()).unwrap_or_default();
            return Err(PaiError::from_service(
                &request.action,
                status.as_u16(),
                Some(code_string(code)),
                body.message,
                body.request_id.or(header_request_id),
            ));
        }

        Ok(value)
    }

    fn request_url(&self, request: &ApiRequest) -> String {
        let base = self.inner.endpoint.as_str().trim_end_matches('/');
        let query = signer::canonical_query(&request.query);
        if query.is_empty() {
            format!("{}{}", base, request.path)
        } else {
            format!("{}{}?{}", base, request.path, query)
        }
    }
}

fn host_header(endpoint: &url::Url) -> String {
    let host = endpoint.host_str().unwrap_or_default();
    match endpoint.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

fn code_string(code: &Value) -> String {
    match code {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_success_code(code: &Value) -> bool {
    match code {
        Value::String(s) => s == "200",
        Value::Number(n) => n.as_u64() == Some(200),
        Value::Null => true,
        _ => false,
    }
}
