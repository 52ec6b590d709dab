use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::key_guard::sanitize_key;
use crate::schema::{ContentType, FieldSchema};

/// A content type schema reindexed by field uid.
///
/// Declaration order is kept for iteration; lookups are by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyBasedContentType(IndexMap<String, FieldSchema>);

impl KeyBasedContentType {
    /// Indexes `schema` by uid. Reserved uids are skipped; a duplicate uid
    /// replaces the earlier field.
    pub fn from_schema(schema: &[FieldSchema]) -> Self {
        let mut fields = IndexMap::with_capacity(schema.len());
        for field in schema {
            match sanitize_key(&field.uid) {
                Some(uid) => {
                    fields.insert(uid.to_string(), field.clone());
                }
                None => warn!("Skipping schema field with reserved uid {:?}", field.uid),
            }
        }
        Self(fields)
    }

    pub fn get(&self, uid: &str) -> Option<&FieldSchema> {
        sanitize_key(uid).and_then(|uid| self.0.get(uid))
    }

    pub fn contains(&self, uid: &str) -> bool {
        self.get(uid).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &FieldSchema> {
        self.0.values()
    }

    /// Rebuilds an ordered content type named `uid` from the indexed fields.
    pub fn to_content_type(&self, uid: &str) -> ContentType {
        ContentType::new(uid, self.0.values().cloned().collect())
    }
}

/// Converts an ordered field list into a [`KeyBasedContentType`].
pub fn create_content_type_key_based(schema: &[FieldSchema]) -> KeyBasedContentType {
    KeyBasedContentType::from_schema(schema)
}
