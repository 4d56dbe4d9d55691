//! Storage mounts of a service
//!
//! Each entry of the `storage` list mounts one source at `mount_path`. The kind of
//! source is given by which of the `image`, `oss` or `nfs` keys the entry carries.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

const MOUNT_PATH: &str = "mount_path";

/// Source keys in dispatch order
const SOURCE_KEYS: [&str; 3] = ["image", "oss", "nfs"];

/// One entry of the `storage` list
#[derive(Debug, Clone, PartialEq)]
pub enum StorageConfig {
    /// Files copied out of another container image
    Image(StorageMount<ImageSource>),
    /// An OSS bucket path
    Oss(StorageMount<OssSource>),
    /// An NAS file system
    Nfs(StorageMount<NfsSource>),
    /// Any other entry, kept verbatim
    Other(Value),
}

/// A source mounted at a path, plus whatever else the entry carried
#[derive(Debug, Clone, PartialEq)]
pub struct StorageMount<S> {
    pub mount_path: Option<String>,
    pub source: S,
    pub extra: Map<String, Value>,
}

impl<S> StorageMount<S> {
    pub fn new(mount_path: impl Into<String>, source: S) -> Self {
        Self {
            mount_path: Some(mount_path.into()),
            source,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OssSource {
    /// `oss://bucket/path/`
    pub path: String,

    #[serde(
        rename = "readOnly",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub read_only: Option<bool>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NfsSource {
    /// Mount target address of the file system
    pub server: String,

    pub path: String,

    #[serde(
        rename = "readOnly",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub read_only: Option<bool>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageSource {
    pub image: String,

    /// Path inside the image to copy from
    pub path: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StorageConfig {
    pub fn oss(mount_path: impl Into<String>, oss_path: impl Into<String>) -> Self {
        StorageConfig::Oss(StorageMount::new(
            mount_path,
            OssSource {
                path: oss_path.into(),
                ..OssSource::default()
            },
        ))
    }

    pub fn nfs(
        mount_path: impl Into<String>,
        server: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        StorageConfig::Nfs(StorageMount::new(
            mount_path,
            NfsSource {
                server: server.into(),
                path: path.into(),
                ..NfsSource::default()
            },
        ))
    }

    pub fn image(
        mount_path: impl Into<String>,
        image: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        StorageConfig::Image(StorageMount::new(
            mount_path,
            ImageSource {
                image: image.into(),
                path: path.into(),
                ..ImageSource::default()
            },
        ))
    }

    pub fn mount_path(&self) -> Option<&str> {
        match self {
            StorageConfig::Image(m) => m.mount_path.as_deref(),
            StorageConfig::Oss(m) => m.mount_path.as_deref(),
            StorageConfig::Nfs(m) => m.mount_path.as_deref(),
            StorageConfig::Other(v) => v.get(MOUNT_PATH).and_then(Value::as_str),
        }
    }

    /// Decode one list entry
    ///
    /// Dispatches on the first of `image`, `oss`, `nfs` present. Further source keys
    /// stay in the entry's extra map.
    pub fn from_value(value: Value) -> Result<StorageConfig> {
        let Value::Object(mut entry) = value else {
            return Ok(StorageConfig::Other(value));
        };

        let present: Vec<&str> = SOURCE_KEYS
            .iter()
            .copied()
            .filter(|key| entry.contains_key(*key))
            .collect();
        if present.len() > 1 {
            tracing::warn!(
                "Storage entry has several sources ({}); using '{}'",
                present.join(", "),
                present[0]
            );
        }

        let Some(&key) = present.first() else {
            return Ok(StorageConfig::Other(Value::Object(entry)));
        };

        Ok(match key {
            "image" => StorageConfig::Image(take_mount(&mut entry, key)?),
            "oss" => StorageConfig::Oss(take_mount(&mut entry, key)?),
            _ => StorageConfig::Nfs(take_mount(&mut entry, key)?),
        })
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(match self {
            StorageConfig::Image(m) => put_mount(m, "image")?,
            StorageConfig::Oss(m) => put_mount(m, "oss")?,
            StorageConfig::Nfs(m) => put_mount(m, "nfs")?,
            StorageConfig::Other(v) => v.clone(),
        })
    }
}

fn take_mount<S: DeserializeOwned>(
    entry: &mut Map<String, Value>,
    key: &str,
) -> Result<StorageMount<S>> {
    let source = entry.remove(key).unwrap_or(Value::Null);
    let source: S = serde_json::from_value(source)?;
    let mount_path = match entry.remove(MOUNT_PATH) {
        Some(v) => serde_json::from_value(v)?,
        None => None,
    };
    Ok(StorageMount {
        mount_path,
        source,
        extra: std::mem::take(entry),
    })
}

fn put_mount<S: Serialize>(mount: &StorageMount<S>, key: &str) -> Result<Value> {
    let mut entry = mount.extra.clone();
    if let Some(path) = &mount.mount_path {
        entry.insert(MOUNT_PATH.to_string(), Value::String(path.clone()));
    }
    entry.insert(key.to_string(), serde_json::to_value(&mount.source)?);
    Ok(Value::Object(entry))
}
