//! How a service turns requests into responses

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

const PROCESSOR: &str = "processor";
const CONTAINERS: &str = "containers";
const PROCESSOR_TYPE: &str = "processor_type";
const PROCESSOR_PATH: &str = "processor_path";
const PROCESSOR_ENTRY: &str = "processor_entry";
const PROCESSOR_MAINCLASS: &str = "processor_mainclass";

/// The processor of a service; a document carries at most one
#[derive(Debug, Clone, PartialEq)]
pub enum Processor {
    /// A processor provided by EAS, named by its identifier
    /// (e.g. `tensorflow_cpu_1.15`, `pmml`)
    BuiltIn(String),
    /// One or more custom containers
    Container(Vec<ContainerSpec>),
    /// A processor code package
    Custom(CustomProcessor),
}

/// One container of a container-based service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerSpec {
    pub image: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<Vec<EnvVar>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContainerSpec {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    #[must_use]
    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.get_or_insert_with(Vec::new).push(EnvVar {
            name: name.into(),
            value: value.into(),
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

/// A processor shipped as a code package
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomProcessor {
    /// Language of the package: `cpp`, `java` or `python`
    pub processor_type: String,
    /// Package location, usually an `oss://` URI
    pub processor_path: Option<String>,
    pub processor_entry: Option<String>,
    /// Entry class for java processors
    pub processor_mainclass: Option<String>,
}

impl Processor {
    /// Remove the winning processor's keys from `doc` and return it
    ///
    /// Precedence: a string `processor`, then `containers`, then `processor_type`.
    /// Keys of the losing representations stay in `doc`.
    pub(crate) fn take_from(doc: &mut Map<String, Value>) -> Result<Option<Processor>> {
        if let Some(Value::String(name)) = doc.get(PROCESSOR) {
            let name = name.clone();
            doc.remove(PROCESSOR);
            return Ok(Some(Processor::BuiltIn(name)));
        }

        if let Some(containers) = doc.remove(CONTAINERS) {
            let containers: Vec<ContainerSpec> = serde_json::from_value(containers)?;
            return Ok(Some(Processor::Container(containers)));
        }

        if let Some(processor_type) = doc.remove(PROCESSOR_TYPE) {
            let processor_type: String = serde_json::from_value(processor_type)?;
            return Ok(Some(Processor::Custom(CustomProcessor {
                processor_type,
                processor_path: take_string(doc, PROCESSOR_PATH)?,
                processor_entry: take_string(doc, PROCESSOR_ENTRY)?,
                processor_mainclass: take_string(doc, PROCESSOR_MAINCLASS)?,
            })));
        }

        Ok(None)
    }

    /// Remove every processor key, whichever representation it belongs to
    pub(crate) fn clear_from(doc: &mut Map<String, Value>) {
        for key in [
            PROCESSOR,
            CONTAINERS,
            PROCESSOR_TYPE,
            PROCESSOR_PATH,
            PROCESSOR_ENTRY,
            PROCESSOR_MAINCLASS,
        ] {
            doc.remove(key);
        }
    }

    /// Write this processor's keys into `doc`
    pub(crate) fn put_into(&self, doc: &mut Map<String, Value>) -> Result<()> {
        match self {
            Processor::BuiltIn(name) => {
                doc.insert(PROCESSOR.to_string(), Value::String(name.clone()));
            }
            Processor::Container(containers) => {
                doc.insert(CONTAINERS.to_string(), serde_json::to_value(containers)?);
            }
            Processor::Custom(custom) => {
                doc.insert(
                    PROCESSOR_TYPE.to_string(),
                    Value::String(custom.processor_type.clone()),
                );
                put_string(doc, PROCESSOR_PATH, &custom.processor_path);
                put_string(doc, PROCESSOR_ENTRY, &custom.processor_entry);
                put_string(doc, PROCESSOR_MAINCLASS, &custom.processor_mainclass);
            }
        }
        Ok(())
    }
}

fn take_string(doc: &mut Map<String, Value>, key: &str) -> Result<Option<String>> {
    match doc.remove(key) {
        Some(value) => Ok(serde_json::from_value(value)?),
        None => Ok(None),
    }
}

fn put_string(doc: &mut Map<String, Value>, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        doc.insert(key.to_string(), Value::String(v.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_string_processor_wins() {
        let mut doc = object(json!({
            "processor": "tensorflow_cpu_1.15",
            "containers": [{"image": "img"}]
        }));
        let processor = Processor::take_from(&mut doc).unwrap();
        assert_eq!(
            processor,
            Some(Processor::BuiltIn("tensorflow_cpu_1.15".to_string()))
        );
        assert!(doc.contains_key("containers"));
    }

    #[test]
    fn test_containers_beat_processor_type() {
        let mut doc = object(json!({
            "containers": [{"image": "registry/app:1", "port": 8000}],
            "processor_type": "python",
            "processor_entry": "app.py"
        }));
        let processor = Processor::take_from(&mut doc).unwrap();
        match processor {
            Some(Processor::Container(containers)) => {
                assert_eq!(containers.len(), 1);
                assert_eq!(containers[0].image, "registry/app:1");
                assert_eq!(containers[0].port, Some(8000));
            }
            other => panic!("expected container processor, got {:?}", other),
        }
        assert_eq!(doc.get("processor_type"), Some(&json!("python")));
        assert_eq!(doc.get("processor_entry"), Some(&json!("app.py")));
    }

    #[test]
    fn test_custom_processor() {
        let mut doc = object(json!({
            "processor_type": "java",
            "processor_path": "oss://bucket/proc.tar.gz",
            "processor_mainclass": "com.example.Main",
            "model_path": "oss://bucket/model/"
        }));
        let processor = Processor::take_from(&mut doc).unwrap().unwrap();
        let Processor::Custom(custom) = &processor else {
            panic!("expected custom processor");
        };
        assert_eq!(custom.processor_type, "java");
        assert_eq!(custom.processor_entry, None);
        assert_eq!(doc.len(), 1);

        let mut out = Map::new();
        processor.put_into(&mut out).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out.get("processor_mainclass"), Some(&json!("com.example.Main")));
    }

    #[test]
    fn test_non_string_processor_is_not_builtin() {
        let mut doc = object(json!({"processor": {"kind": "odd"}}));
        assert_eq!(Processor::take_from(&mut doc).unwrap(), None);
        assert!(doc.contains_key("processor"));
    }
}
