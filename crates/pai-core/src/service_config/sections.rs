//! Typed sections of an EAS service document

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Prefix of rpc tuning keys inside `metadata`
pub(crate) const RPC_PREFIX: &str = "rpc.";

/// The `metadata` section: naming, instance count and per-instance sizing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Number of instances
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<u32>,

    /// Cores per instance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<u32>,

    /// Memory per instance in MB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu: Option<u32>,

    /// GPU memory per instance in GB, for shared GPU scheduling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu_memory: Option<u32>,

    /// Dedicated resource group id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,

    /// Service group used for traffic routing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_webservice: Option<bool>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Request-serving tuning, stored as `rpc.*` keys inside `metadata`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RpcConfig {
    #[serde(
        rename = "rpc.batching",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub batching: Option<bool>,

    /// Request timeout in milliseconds
    #[serde(
        rename = "rpc.keepalive",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub keepalive: Option<u64>,

    #[serde(
        rename = "rpc.max_queue_size",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub max_queue_size: Option<u32>,

    #[serde(
        rename = "rpc.worker_threads",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub worker_threads: Option<u32>,

    #[serde(
        rename = "rpc.max_batch_size",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub max_batch_size: Option<u32>,

    /// Milliseconds to wait while filling a batch
    #[serde(
        rename = "rpc.max_batch_timeout",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub max_batch_timeout: Option<u64>,

    /// Other `rpc.*` keys, kept with their prefix
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RpcConfig {
    #[must_use]
    pub fn with_batching(mut self, max_batch_size: u32, max_batch_timeout_ms: u64) -> Self {
        self.batching = Some(true);
        self.max_batch_size = Some(max_batch_size);
        self.max_batch_timeout = Some(max_batch_timeout_ms);
        self
    }

    #[must_use]
    pub fn with_keepalive(mut self, millis: u64) -> Self {
        self.keepalive = Some(millis);
        self
    }

    #[must_use]
    pub fn with_worker_threads(mut self, threads: u32) -> Self {
        self.worker_threads = Some(threads);
        self
    }
}

/// `cloud.computing`: instance type selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComputingConfig {
    /// ECS instance type, e.g. `ecs.gn6i-c4g1.xlarge`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_type: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `cloud.networking`: VPC attachment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpc_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vswitch_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_group_id: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Split a `metadata` object into its plain keys and its `rpc.*` keys
pub(crate) fn split_rpc(metadata: Map<String, Value>) -> (Map<String, Value>, Map<String, Value>) {
    metadata
        .into_iter()
        .partition(|(key, _)| !key.starts_with(RPC_PREFIX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_rpc() {
        let Value::Object(map) = json!({
            "instance": 2,
            "rpc.batching": true,
            "rpc.custom": 1,
            "rpcx": "not rpc"
        }) else {
            unreachable!()
        };
        let (plain, rpc) = split_rpc(map);
        assert_eq!(plain.len(), 2);
        assert!(plain.contains_key("rpcx"));
        assert_eq!(rpc.len(), 2);
    }

    #[test]
    fn test_rpc_unknown_keys_keep_prefix() {
        let rpc: RpcConfig = serde_json::from_value(json!({
            "rpc.batching": true,
            "rpc.max_batch_size": 16,
            "rpc.decompressor": "gzip"
        }))
        .unwrap();
        assert_eq!(rpc.batching, Some(true));
        assert_eq!(rpc.max_batch_size, Some(16));
        assert_eq!(rpc.extra.get("rpc.decompressor"), Some(&json!("gzip")));

        let back = serde_json::to_value(&rpc).unwrap();
        assert_eq!(
            back,
            json!({
                "rpc.batching": true,
                "rpc.max_batch_size": 16,
                "rpc.decompressor": "gzip"
            })
        );
    }

    #[test]
    fn test_metadata_keeps_unknown_keys() {
        let metadata: Metadata = serde_json::from_value(json!({
            "instance": 1,
            "cpu": 2,
            "memory": 4000,
            "qos": "BestEffort"
        }))
        .unwrap();
        assert_eq!(metadata.instance, Some(1));
        assert_eq!(metadata.memory, Some(4000));
        assert_eq!(metadata.extra.get("qos"), Some(&json!("BestEffort")));
    }
}
