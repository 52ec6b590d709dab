use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::key_guard::sanitize_key;

/// Key of the storefront asset id inside an asset's extension metadata.
/// The spelling is the extension's own.
pub const ASSET_GID_KEY: &str = "shophify_asset_gid";

/// A CMS entry: field uid to a value whose shape depends on the field's
/// data type.
///
/// Field access goes through the key guard, so reserved keys always read
/// as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entry(Map<String, Value>);

impl Entry {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Wraps a JSON object. Any other value yields `None`.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// The entry's own `uid`.
    pub fn uid(&self) -> Option<&str> {
        self.0.get("uid").and_then(Value::as_str)
    }

    /// `_metadata.uid`, the stable per-entry id carried by nested entries
    /// (group items, blocks).
    pub fn metadata_uid(&self) -> Option<&str> {
        self.0
            .get("_metadata")
            .and_then(|m| m.get("uid"))
            .and_then(Value::as_str)
    }

    /// `_content_type_uid`, set on reference pointers and fetched entries.
    pub fn content_type_uid(&self) -> Option<&str> {
        self.0.get("_content_type_uid").and_then(Value::as_str)
    }

    pub fn field(&self, uid: &str) -> Option<&Value> {
        sanitize_key(uid).and_then(|uid| self.0.get(uid))
    }

    /// The non-empty `data-cslp` editing tag of a field (`$.<uid>.data-cslp`).
    pub fn cslp_tag(&self, uid: &str) -> Option<&str> {
        let uid = sanitize_key(uid)?;
        self.0
            .get("$")
            .and_then(|tags| tags.get(uid))
            .and_then(|tag| tag.get("data-cslp"))
            .and_then(Value::as_str)
            .filter(|tag| !tag.is_empty())
    }
}

impl From<Map<String, Value>> for Entry {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// A CMS asset, fetched with `include_metadata=true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, rename = "_metadata", skip_serializing_if = "Option::is_none")]
    pub metadata: Option<AssetMetadata>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetMetadata {
    /// Extension uid to a list of metadata objects.
    #[serde(default)]
    pub extensions: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Asset {
    /// The storefront asset id recorded by the storefront extension, if any.
    ///
    /// Every extension's metadata list is scanned; the last non-empty id
    /// found wins.
    pub fn storefront_gid(&self) -> Option<&str> {
        let extensions = &self.metadata.as_ref()?.extensions;
        let mut gid = None;
        for items in extensions.values() {
            let Some(items) = items.as_array() else {
                continue;
            };
            let found = items.iter().find_map(|item| {
                item.get(ASSET_GID_KEY)
                    .and_then(Value::as_str)
                    .filter(|gid| !gid.is_empty())
            });
            if found.is_some() {
                gid = found;
            }
        }
        gid
    }
}
