//! The kernel spec document written into the registry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// How a front-end should interrupt the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InterruptMode {
    #[default]
    Signal,
    Message,
}

/// A kernel specification as stored in a kernel file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct KernelSpec {
    #[serde(default)]
    pub argv: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub interrupt_mode: InterruptMode,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl KernelSpec {
    /// The default spec as a JSON object, used as the base for merging.
    pub fn default_document() -> Map<String, Value> {
        match serde_json::to_value(KernelSpec::default()) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Lay `document` over the default spec at the top level.
    ///
    /// Fields in `document` win; defaults it omits are kept, and fields the
    /// default does not know about are carried through.
    pub fn merge_over_defaults(document: Map<String, Value>) -> Map<String, Value> {
        let mut merged = Self::default_document();
        merged.extend(document);
        merged
    }

    /// `metadata.lifecycle_manager.class_name`, if present.
    pub fn lifecycle_manager_class(&self) -> Option<&str> {
        self.metadata
            .get("lifecycle_manager")?
            .get("class_name")?
            .as_str()
    }

    /// A field of `metadata.lifecycle_manager.config`, if it is a string.
    pub fn lifecycle_manager_config(&self, key: &str) -> Option<&str> {
        self.metadata
            .get("lifecycle_manager")?
            .get("config")?
            .get(key)?
            .as_str()
    }
}
