use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::key_guard::sanitize_key;

/// Maps live-preview edit tags to dotted paths into the metaobject tree
/// (`<type>.<path>.$.<field>`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CslpMapping(IndexMap<String, String>);

impl CslpMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the location of `field_key` for the edit tag `tag`.
    ///
    /// The first `.` of the tag becomes `_`. Empty and reserved keys are
    /// ignored.
    pub fn record(&mut self, tag: &str, kind: &str, path: &str, field_key: &str) {
        if tag.is_empty() {
            return;
        }
        let key = tag.replacen('.', "_", 1);
        if sanitize_key(&key).is_none() {
            return;
        }
        self.0.insert(key, format!("{kind}.{path}.$.{field_key}"));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_first_dot_is_replaced() {
        let mut map = CslpMapping::new();
        map.record("product.blt1.en-us.title", "product", "blt1", "title");
        assert_eq!(
            map.get("product_blt1.en-us.title"),
            Some("product.blt1.$.title")
        );
    }

    #[test]
    fn empty_tag_is_ignored() {
        let mut map = CslpMapping::new();
        map.record("", "product", "blt1", "title");
        assert!(map.is_empty());
    }
}
