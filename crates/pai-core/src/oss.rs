//! `oss://` URIs
//!
//! Model artifacts, datasets and processor packages are addressed as
//! `oss://bucket[.endpoint]/key`. The endpoint part is optional; when it is left
//! out the region's public endpoint applies.

use std::fmt;
use std::str::FromStr;

use crate::error::PaiError;

const SCHEME: &str = "oss://";

/// A parsed `oss://` URI
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OssUri {
    pub bucket: String,
    pub endpoint: Option<String>,
    /// Object key or prefix, without a leading `/`
    pub key: String,
}

impl OssUri {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            endpoint: None,
            key: key.into().trim_start_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// True for keys naming a directory-like prefix
    pub fn is_dir(&self) -> bool {
        self.key.is_empty() || self.key.ends_with('/')
    }

    /// Append path segments to the key
    #[must_use]
    pub fn join(&self, path: &str) -> Self {
        let path = path.trim_start_matches('/');
        let key = if self.key.is_empty() || self.key.ends_with('/') {
            format!("{}{}", self.key, path)
        } else {
            format!("{}/{}", self.key, path)
        };
        Self {
            key,
            ..self.clone()
        }
    }

    /// Same location with the endpoint dropped
    #[must_use]
    pub fn without_endpoint(&self) -> Self {
        Self {
            endpoint: None,
            ..self.clone()
        }
    }
}

impl FromStr for OssUri {
    type Err = PaiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix(SCHEME)
            .ok_or_else(|| PaiError::Validation(format!("not an oss:// URI: '{}'", s)))?;
        let (host, key) = rest.split_once('/').unwrap_or((rest, ""));

        let (bucket, endpoint) = match host.split_once('.') {
            Some((bucket, endpoint)) if !endpoint.is_empty() => {
                (bucket, Some(endpoint.to_string()))
            }
            _ => (host.trim_end_matches('.'), None),
        };
        if bucket.is_empty() {
            return Err(PaiError::Validation(format!(
                "oss:// URI has no bucket: '{}'",
                s
            )));
        }

        Ok(Self {
            bucket: bucket.to_string(),
            endpoint,
            key: key.to_string(),
        })
    }
}

impl fmt::Display for OssUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.endpoint {
            Some(endpoint) => write!(f, "{}{}.{}/{}", SCHEME, self.bucket, endpoint, self.key),
            None => write!(f, "{}{}/{}", SCHEME, self.bucket, self.key),
        }
    }
}

/// Public OSS endpoint of a region
pub fn default_endpoint(region_id: &str) -> String {
    format!("oss-{}.aliyuncs.com", region_id)
}

/// Endpoint reachable from inside the region's VPCs
pub fn internal_endpoint(region_id: &str) -> String {
    format!("oss-{}-internal.aliyuncs.com", region_id)
}

/// True for `oss://` URIs
pub fn is_oss_uri(s: &str) -> bool {
    s.starts_with(SCHEME)
}
