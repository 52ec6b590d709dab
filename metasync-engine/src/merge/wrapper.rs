use std::fmt;

use metasync_model::SystemBlock;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// Key under which a stored metafield snapshot carries its system block.
pub const SNAPSHOT_SYSTEM_KEY: &str = "___system";

/// Key some older snapshots store their system block under.
pub const LEGACY_SYSTEM_KEY: &str = "_system";

/// Key the system block is embedded under in a wrapper's `value`.
pub const EMBEDDED_SYSTEM_KEY: &str = "system";

/// One merged metafield value.
///
/// All forms are computed at construction:
/// - `value`: the merged value, with `system` embedded when it is an object
/// - `json`: the serialized form, which is what `Serialize` emits
/// - `system`: the identity block, carried over or synthesized
/// - `items`: the element wrappers of list-shaped fields (blocks, references)
/// - `text`: the string form of scalar values
#[derive(Debug, Clone, PartialEq)]
pub struct ValueWrapper {
    pub value: Value,
    pub json: Value,
    pub system: Option<SystemBlock>,
    pub items: Vec<ValueWrapper>,
    pub text: Option<String>,
}

impl ValueWrapper {
    /// A wrapper whose `value` is `raw` with `system` embedded and whose
    /// serialized form is `json`.
    pub(crate) fn embedded(raw: &Value, json: Value, system: Option<SystemBlock>) -> Self {
        Self {
            value: embed_system(raw, system.as_ref()),
            json,
            system,
            items: Vec::new(),
            text: None,
        }
    }

    /// A list wrapper over element wrappers.
    pub(crate) fn list(items: Vec<ValueWrapper>, system: SystemBlock) -> Self {
        Self {
            value: Value::Array(items.iter().map(|item| item.value.clone()).collect()),
            json: Value::Array(items.iter().map(|item| item.json.clone()).collect()),
            system: Some(system),
            items,
            text: None,
        }
    }

    #[must_use]
    pub(crate) fn with_text(mut self, text: Option<String>) -> Self {
        self.text = text;
        self
    }
}

impl Serialize for ValueWrapper {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.json.serialize(serializer)
    }
}

impl fmt::Display for ValueWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.text {
            Some(text) => f.write_str(text),
            None => write!(f, "{}", self.json),
        }
    }
}

/// Copies `raw`, adding `system` to it when it is an object. Other shapes
/// are returned unchanged.
pub(crate) fn embed_system(raw: &Value, system: Option<&SystemBlock>) -> Value {
    match (raw, system) {
        (Value::Object(fields), Some(system)) => {
            let mut fields = fields.clone();
            fields.insert(EMBEDDED_SYSTEM_KEY.to_string(), system.to_value());
            Value::Object(fields)
        }
        _ => raw.clone(),
    }
}

/// The system block stored on a snapshot element, if any. Keys are tried
/// in order: `___system`, `_system`, `system`.
pub(crate) fn snapshot_system(element: &Value) -> Option<SystemBlock> {
    [SNAPSHOT_SYSTEM_KEY, LEGACY_SYSTEM_KEY, EMBEDDED_SYSTEM_KEY]
        .into_iter()
        .find_map(|key| element.get(key))
        .and_then(SystemBlock::from_value)
}

/// String form of scalars; composites have none.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}
