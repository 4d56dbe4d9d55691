//! Typed model of an EAS service configuration document
//!
//! A service is described by a JSON document whose well-known parts are typed
//! here: `metadata` (with its `rpc.*` tuning keys), `cloud.computing`,
//! `cloud.networking`, `storage` and the processor. Every key that is not
//! understood is carried along untouched, so decoding a document and encoding it
//! again gives back the same document.
//!
//! ```rust
//! use pai_core::service_config::{Processor, ServiceConfig, StorageConfig};
//!
//! let config = ServiceConfig::new("demo")
//!     .with_instance_count(2)
//!     .with_resource(4, 8000)
//!     .with_processor(Processor::BuiltIn("pmml".to_string()))
//!     .with_storage(StorageConfig::oss("/models", "oss://bucket/model/"));
//!
//! let doc = config.to_value().unwrap();
//! assert_eq!(doc["metadata"]["instance"], 2);
//! assert_eq!(doc["processor"], "pmml");
//! ```

mod processor;
mod sections;
mod storage;

pub use processor::{ContainerSpec, CustomProcessor, EnvVar, Processor};
pub use sections::{ComputingConfig, Metadata, NetworkingConfig, RpcConfig};
pub use storage::{ImageSource, NfsSource, OssSource, StorageConfig, StorageMount};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{PaiError, Result};

const METADATA: &str = "metadata";
const CLOUD: &str = "cloud";
const COMPUTING: &str = "computing";
const NETWORKING: &str = "networking";
const STORAGE: &str = "storage";
const MODEL_PATH: &str = "model_path";

/// An EAS service configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceConfig {
    pub metadata: Option<Metadata>,
    pub rpc: Option<RpcConfig>,
    pub computing: Option<ComputingConfig>,
    pub networking: Option<NetworkingConfig>,
    pub storage: Option<Vec<StorageConfig>>,
    pub processor: Option<Processor>,
    /// Model location, usually an `oss://` URI
    pub model_path: Option<String>,
    /// Keys not modelled above, re-emitted as-is
    pub extra: Map<String, Value>,
}

impl ServiceConfig {
    /// A config with only `metadata.name` set
    pub fn new(name: impl Into<String>) -> Self {
        Self::default().with_name(name)
    }

    /// Decode a service document
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut doc) = value else {
            return Err(PaiError::Validation(
                "service config must be a JSON object".to_string(),
            ));
        };

        let (metadata, rpc) = match doc.remove(METADATA) {
            Some(Value::Object(map)) => {
                let (plain, rpc) = sections::split_rpc(map);
                let metadata: Metadata = serde_json::from_value(Value::Object(plain))?;
                let rpc = if rpc.is_empty() {
                    None
                } else {
                    Some(serde_json::from_value(Value::Object(rpc))?)
                };
                (Some(metadata), rpc)
            }
            Some(other) => {
                doc.insert(METADATA.to_string(), other);
                (None, None)
            }
            None => (None, None),
        };

        let (computing, networking) = match doc.get_mut(CLOUD) {
            Some(Value::Object(cloud)) => {
                let computing = take_section(cloud, COMPUTING)?;
                let networking = take_section(cloud, NETWORKING)?;
                (computing, networking)
            }
            _ => (None, None),
        };

        let storage = match doc.remove(STORAGE) {
            Some(Value::Array(entries)) => Some(
                entries
                    .into_iter()
                    .map(StorageConfig::from_value)
                    .collect::<Result<Vec<_>>>()?,
            ),
            Some(other) => {
                doc.insert(STORAGE.to_string(), other);
                None
            }
            None => None,
        };

        let processor = Processor::take_from(&mut doc)?;

        let model_path = match doc.get(MODEL_PATH) {
            Some(Value::String(path)) => {
                let path = path.clone();
                doc.remove(MODEL_PATH);
                Some(path)
            }
            _ => None,
        };

        Ok(Self {
            metadata,
            rpc,
            computing,
            networking,
            storage,
            processor,
            model_path,
            extra: doc,
        })
    }

    /// Encode back into a service document
    ///
    /// Starts from the unknown keys and writes each typed part at its own path.
    pub fn to_value(&self) -> Result<Value> {
        let mut doc = self.extra.clone();

        if self.metadata.is_some() || self.rpc.is_some() {
            let mut metadata = match &self.metadata {
                Some(m) => into_object(serde_json::to_value(m)?),
                None => Map::new(),
            };
            if let Some(rpc) = &self.rpc {
                metadata.extend(into_object(serde_json::to_value(rpc)?));
            }
            doc.insert(METADATA.to_string(), Value::Object(metadata));
        }

        if self.computing.is_some() || self.networking.is_some() {
            let cloud = doc
                .entry(CLOUD)
                .or_insert_with(|| Value::Object(Map::new()));
            if !cloud.is_object() {
                *cloud = Value::Object(Map::new());
            }
            if let Value::Object(cloud) = cloud {
                if let Some(computing) = &self.computing {
                    cloud.insert(COMPUTING.to_string(), serde_json::to_value(computing)?);
                }
                if let Some(networking) = &self.networking {
                    cloud.insert(NETWORKING.to_string(), serde_json::to_value(networking)?);
                }
            }
        }

        if let Some(storage) = &self.storage {
            let entries = storage
                .iter()
                .map(StorageConfig::to_value)
                .collect::<Result<Vec<_>>>()?;
            doc.insert(STORAGE.to_string(), Value::Array(entries));
        }

        if let Some(processor) = &self.processor {
            processor.put_into(&mut doc)?;
        }

        if let Some(path) = &self.model_path {
            doc.insert(MODEL_PATH.to_string(), Value::String(path.clone()));
        }

        Ok(Value::Object(doc))
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(s)?)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(s)
            .map_err(|e| PaiError::Validation(format!("invalid YAML service config: {}", e)))?;
        Self::from_value(value)
    }

    /// Pretty-printed JSON document
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_value()?)?)
    }

    /// Service name from `metadata.name`
    pub fn name(&self) -> Option<&str> {
        self.metadata.as_ref()?.name.as_deref()
    }

    pub fn storage(&self) -> &[StorageConfig] {
        self.storage.as_deref().unwrap_or_default()
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        self.metadata.get_or_insert_with(Metadata::default)
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.metadata_mut().name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_instance_count(mut self, instances: u32) -> Self {
        self.metadata_mut().instance = Some(instances);
        self
    }

    /// Cores and memory (MB) per instance
    #[must_use]
    pub fn with_resource(mut self, cpu: u32, memory_mb: u64) -> Self {
        let metadata = self.metadata_mut();
        metadata.cpu = Some(cpu);
        metadata.memory = Some(memory_mb);
        self
    }

    #[must_use]
    pub fn with_gpu(mut self, gpu: u32) -> Self {
        self.metadata_mut().gpu = Some(gpu);
        self
    }

    /// Run in a dedicated resource group
    #[must_use]
    pub fn with_resource_group(mut self, resource_id: impl Into<String>) -> Self {
        self.metadata_mut().resource = Some(resource_id.into());
        self
    }

    #[must_use]
    pub fn with_workspace_id(mut self, workspace_id: impl Into<String>) -> Self {
        self.metadata_mut().workspace_id = Some(workspace_id.into());
        self
    }

    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.metadata_mut().group = Some(group.into());
        self
    }

    #[must_use]
    pub fn with_rpc(mut self, rpc: RpcConfig) -> Self {
        self.rpc = Some(rpc);
        self
    }

    /// Pick an ECS instance type instead of cpu/memory sizing
    #[must_use]
    pub fn with_instance_type(mut self, instance_type: impl Into<String>) -> Self {
        self.computing
            .get_or_insert_with(ComputingConfig::default)
            .instance_type = Some(instance_type.into());
        self
    }

    #[must_use]
    pub fn with_vpc(
        mut self,
        vpc_id: impl Into<String>,
        vswitch_id: impl Into<String>,
        security_group_id: impl Into<String>,
    ) -> Self {
        let networking = self
            .networking
            .get_or_insert_with(NetworkingConfig::default);
        networking.vpc_id = Some(vpc_id.into());
        networking.vswitch_id = Some(vswitch_id.into());
        networking.security_group_id = Some(security_group_id.into());
        self
    }

    /// Append a storage mount
    #[must_use]
    pub fn with_storage(mut self, storage: StorageConfig) -> Self {
        self.storage.get_or_insert_with(Vec::new).push(storage);
        self
    }

    /// Replace the processor
    ///
    /// Processor keys of other representations kept from a decoded document are
    /// dropped, so the encoded document carries only `processor`.
    #[must_use]
    pub fn with_processor(mut self, processor: Processor) -> Self {
        Processor::clear_from(&mut self.extra);
        self.processor = Some(processor);
        self
    }

    #[must_use]
    pub fn with_model_path(mut self, model_path: impl Into<String>) -> Self {
        self.model_path = Some(model_path.into());
        self
    }
}

impl Serialize for ServiceConfig {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        self.to_value()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ServiceConfig {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        ServiceConfig::from_value(value).map_err(serde::de::Error::custom)
    }
}

/// Decode and remove a `cloud` subsection; a `null` one reads as absent and stays put
fn take_section<T: serde::de::DeserializeOwned>(
    cloud: &mut Map<String, Value>,
    key: &str,
) -> Result<Option<T>> {
    match cloud.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => match cloud.remove(key) {
            Some(v) => Ok(Some(serde_json::from_value(v)?)),
            None => Ok(None),
        },
    }
}

fn into_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn full_document() -> Value {
        json!({
            "metadata": {
                "name": "fraud_detect",
                "instance": 2,
                "cpu": 4,
                "memory": 8000,
                "workspace_id": "1234",
                "qos": "BestEffort",
                "rpc.batching": true,
                "rpc.max_batch_size": 16,
                "rpc.keepalive": 5000,
                "rpc.decompressor": "gzip"
            },
            "cloud": {
                "computing": {"instance_type": "ecs.c6.xlarge", "instances_limit": 4},
                "networking": {
                    "vpc_id": "vpc-1",
                    "vswitch_id": "vsw-1",
                    "security_group_id": "sg-1"
                },
                "region": "cn-hangzhou"
            },
            "storage": [
                {"mount_path": "/models", "oss": {"path": "oss://bucket/m/", "readOnly": true}},
                {"mount_path": "/mnt/nas", "nfs": {"server": "nas.example.com", "path": "/"}},
                {"mount_path": "/tmp", "empty_dir": {"medium": "memory"}}
            ],
            "processor": "tensorflow_cpu_1.15",
            "model_path": "oss://bucket/m/",
            "warm_up_data_path": "oss://bucket/warmup.bin",
            "labels": {"team": "risk"}
        })
    }

    #[test]
    fn test_round_trip_preserves_document() {
        let doc = full_document();
        let config = ServiceConfig::from_value(doc.clone()).unwrap();

        assert_eq!(config.name(), Some("fraud_detect"));
        assert_eq!(config.metadata.as_ref().unwrap().instance, Some(2));
        assert_eq!(config.rpc.as_ref().unwrap().max_batch_size, Some(16));
        assert_eq!(
            config.computing.as_ref().unwrap().instance_type.as_deref(),
            Some("ecs.c6.xlarge")
        );
        assert_eq!(config.storage().len(), 3);
        assert_eq!(
            config.processor,
            Some(Processor::BuiltIn("tensorflow_cpu_1.15".to_string()))
        );
        assert!(config.extra.contains_key("warm_up_data_path"));

        assert_eq!(config.to_value().unwrap(), doc);
    }

    #[test]
    fn test_encode_is_idempotent() {
        let config = ServiceConfig::from_value(full_document()).unwrap();
        let once = config.to_value().unwrap();
        let twice = ServiceConfig::from_value(once.clone())
            .unwrap()
            .to_value()
            .unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_containers_and_processor_type_round_trip() {
        let doc = json!({
            "metadata": {"name": "web", "instance": 1},
            "containers": [
                {"image": "registry/app:1", "command": "python app.py", "port": 8000}
            ],
            "processor_type": "python",
            "processor_entry": "app.py"
        });
        let config = ServiceConfig::from_value(doc.clone()).unwrap();

        assert!(matches!(config.processor, Some(Processor::Container(_))));
        assert_eq!(config.extra.get("processor_type"), Some(&json!("python")));
        assert_eq!(config.to_value().unwrap(), doc);
    }

    #[test]
    fn test_empty_document() {
        let config = ServiceConfig::from_value(json!({})).unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.to_value().unwrap(), json!({}));
    }

    #[test]
    fn test_metadata_with_only_rpc_keys() {
        let doc = json!({"metadata": {"rpc.worker_threads": 8}});
        let config = ServiceConfig::from_value(doc.clone()).unwrap();
        assert_eq!(config.metadata, Some(Metadata::default()));
        assert_eq!(config.rpc.as_ref().unwrap().worker_threads, Some(8));
        assert_eq!(config.to_value().unwrap(), doc);
    }

    #[test]
    fn test_builder_document() {
        let config = ServiceConfig::new("demo")
            .with_instance_count(1)
            .with_instance_type("ecs.gn6i-c4g1.xlarge")
            .with_vpc("vpc-1", "vsw-1", "sg-1")
            .with_rpc(RpcConfig::default().with_keepalive(60000))
            .with_processor(Processor::Container(vec![
                ContainerSpec::new("registry/app:1").with_port(8000),
            ]))
            .with_storage(StorageConfig::oss("/models", "oss://bucket/model/"));

        assert_eq!(
            config.to_value().unwrap(),
            json!({
                "metadata": {"name": "demo", "instance": 1, "rpc.keepalive": 60000},
                "cloud": {
                    "computing": {"instance_type": "ecs.gn6i-c4g1.xlarge"},
                    "networking": {
                        "vpc_id": "vpc-1",
                        "vswitch_id": "vsw-1",
                        "security_group_id": "sg-1"
                    }
                },
                "containers": [{"image": "registry/app:1", "port": 8000}],
                "storage": [{"mount_path": "/models", "oss": {"path": "oss://bucket/model/"}}]
            })
        );
    }

    #[test]
    fn test_replacing_processor_replaces_keys() {
        let config = ServiceConfig::from_value(json!({"processor": "pmml"}))
            .unwrap()
            .with_processor(Processor::Custom(CustomProcessor {
                processor_type: "cpp".to_string(),
                processor_path: Some("oss://bucket/libproc.so".to_string()),
                ..CustomProcessor::default()
            }));
        assert_eq!(
            config.to_value().unwrap(),
            json!({"processor_type": "cpp", "processor_path": "oss://bucket/libproc.so"})
        );
    }

    #[test]
    fn test_replacing_processor_drops_losing_forms() {
        let decoded = ServiceConfig::from_value(json!({
            "processor": "pmml",
            "containers": [{"image": "old:1"}],
            "metadata": {"name": "demo"}
        }))
        .unwrap();
        // Unchanged round trip keeps the losing form
        assert_eq!(
            decoded.to_value().unwrap(),
            json!({
                "processor": "pmml",
                "containers": [{"image": "old:1"}],
                "metadata": {"name": "demo"}
            })
        );

        let replaced = decoded.with_processor(Processor::Custom(CustomProcessor {
            processor_type: "python".to_string(),
            processor_entry: Some("app.py".to_string()),
            ..CustomProcessor::default()
        }));
        let encoded = replaced.to_value().unwrap();
        assert_eq!(
            encoded,
            json!({
                "processor_type": "python",
                "processor_entry": "app.py",
                "metadata": {"name": "demo"}
            })
        );

        let redecoded = ServiceConfig::from_value(encoded).unwrap();
        assert!(matches!(redecoded.processor, Some(Processor::Custom(_))));
    }

    #[test]
    fn test_null_cloud_sections_read_as_absent() {
        let doc = json!({
            "metadata": {"name": "demo"},
            "cloud": {"computing": null, "networking": null}
        });
        let config = ServiceConfig::from_value(doc.clone()).unwrap();
        assert!(config.computing.is_none());
        assert!(config.networking.is_none());
        assert_eq!(config.to_value().unwrap(), doc);

        let filled = config.with_instance_type("ecs.gn6i-c4g1.xlarge");
        let encoded = filled.to_value().unwrap();
        assert_eq!(encoded["cloud"]["networking"], Value::Null);
        assert_eq!(
            encoded["cloud"]["computing"],
            json!({"instance_type": "ecs.gn6i-c4g1.xlarge"})
        );
    }

    #[test]
    fn test_yaml_input() {
        let yaml = r#"
metadata:
  name: from_yaml
  instance: 3
processor: pmml
"#;
        let config = ServiceConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.name(), Some("from_yaml"));
        assert_eq!(config.metadata.unwrap().instance, Some(3));
    }

    #[test]
    fn test_non_object_rejected() {
        let err = ServiceConfig::from_value(json!([1, 2])).unwrap_err();
        assert!(err.is_bad_request());
    }

    #[test]
    fn test_serde_impls_use_document_form() {
        let config: ServiceConfig =
            serde_json::from_value(json!({"metadata": {"name": "x"}, "token": "t"})).unwrap();
        assert_eq!(
            serde_json::to_value(&config).unwrap(),
            json!({"metadata": {"name": "x"}, "token": "t"})
        );
    }
}
