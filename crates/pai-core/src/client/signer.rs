//! ACS3-HMAC-SHA256 request signing
//!
//! Builds the canonical request from method, path, sorted query pairs, the signed
//! headers and the payload hash, then signs its digest with the access key secret.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{PaiError, Result};

/// Signature algorithm name used in the `Authorization` header
pub const SIGNATURE_ALGORITHM: &str = "ACS3-HMAC-SHA256";

type HmacSha256 = Hmac<Sha256>;

/// Alibaba Cloud access credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub access_key_secret: String,
    /// STS token, present for temporary credentials
    pub security_token: Option<String>,
}

impl Credentials {
    pub fn new(access_key_id: impl Into<String>, access_key_secret: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            access_key_secret: access_key_secret.into(),
            security_token: None,
        }
    }

    #[must_use]
    pub fn with_security_token(mut self, token: impl Into<String>) -> Self {
        self.security_token = Some(token.into());
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"***")
            .field(
                "security_token",
                &self.security_token.as_ref().map(|_| "***"),
            )
            .finish()
    }
}

/// RFC 3986 encoding: everything except `A-Z a-z 0-9 - _ . ~`
pub fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Sorted, encoded `k=v&k=v` form used both on the wire and in the signature
pub fn canonical_query(pairs: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = pairs
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();
    encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Lowercase hex SHA-256 of `payload`
pub fn hash_hex(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}

/// Compute the `Authorization` header value
///
/// `headers` must already contain every header to be signed, keyed by lowercase
/// name; `path` must be the already-encoded request path.
pub fn authorization(
    credentials: &Credentials,
    method: &str,
    path: &str,
    query: &[(String, String)],
    headers: &BTreeMap<String, String>,
    payload_hash: &str,
) -> Result<String> {
    let canonical_headers: String = headers
        .iter()
        .map(|(k, v)| format!("{}:{}\n", k, v.trim()))
        .collect();
    let signed_headers = headers.keys().cloned().collect::<Vec<_>>().join(";");

    let canonical_request = format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        method,
        path,
        canonical_query(query),
        canonical_headers,
        signed_headers,
        payload_hash
    );
    tracing::trace!("Canonical request:\n{}", canonical_request);

    let string_to_sign = format!(
        "{}\n{}",
        SIGNATURE_ALGORITHM,
        hash_hex(canonical_request.as_bytes())
    );

    let mut mac = HmacSha256::new_from_slice(credentials.access_key_secret.as_bytes())
        .map_err(|e| PaiError::Validation(format!("invalid access key secret: {}", e)))?;
    mac.update(string_to_sign.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    Ok(format!(
        "{} Credential={},SignedHeaders={},Signature={}",
        SIGNATURE_ALGORITHM, credentials.access_key_id, signed_headers, signature
    ))
}
