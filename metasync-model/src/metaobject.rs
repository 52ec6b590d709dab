use indexmap::IndexMap;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::key_guard::sanitize_key;

/// Bucket key marking the kind of nested field a type bucket came from.
pub const FIELD_TYPE_KEY: &str = "_field_type";

/// Bucket key holding the plain form of every record in the bucket.
pub const VALUES_KEY: &str = "values";

/// Identity and addressing metadata attached to every produced record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemBlock {
    #[serde(rename = "type")]
    pub kind: String,
    pub handle: String,
    pub id: Option<String>,
    pub url: Option<String>,
}

impl SystemBlock {
    pub fn new(kind: impl Into<String>, handle: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            handle: handle.into(),
            id: None,
            url: None,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: Option<String>) -> Self {
        self.id = id;
        self
    }

    /// Reads a system block stored in a JSON snapshot. Missing string
    /// members read as empty.
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        let text = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
        Some(Self {
            kind: text("type").unwrap_or_default(),
            handle: text("handle").unwrap_or_default(),
            id: text("id"),
            url: text("url"),
        })
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "type": self.kind,
            "handle": self.handle,
            "id": self.id,
            "url": self.url,
        })
    }
}

/// The fields recorded for one position (`type` + `path`) of the entry tree.
///
/// `value` is the same field map as the record itself, and
/// `system.handle` always equals the path the record is stored under.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRecord {
    fields: Map<String, Value>,
    system: SystemBlock,
}

impl FieldRecord {
    pub fn new(kind: &str, path: &str) -> Self {
        Self {
            fields: Map::new(),
            system: SystemBlock::new(kind, path),
        }
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        if let Some(key) = sanitize_key(key) {
            self.fields.insert(key.to_string(), value.into());
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Alias of [`FieldRecord::fields`], mirroring the `value` member of
    /// the serialized form.
    pub fn value(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn system(&self) -> &SystemBlock {
        &self.system
    }

    /// The plain JSON form: the fields and nothing else.
    pub fn to_plain(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

impl Serialize for FieldRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 2))?;
        for (key, value) in &self.fields {
            if key != "value" && key != "system" {
                map.serialize_entry(key, value)?;
            }
        }
        map.serialize_entry("value", &self.fields)?;
        map.serialize_entry("system", &self.system)?;
        map.end()
    }
}

/// All records sharing one composite `type`, keyed by path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeBucket {
    field_type: Option<String>,
    records: IndexMap<String, FieldRecord>,
    values: Vec<Value>,
}

impl TypeBucket {
    pub fn field_type(&self) -> Option<&str> {
        self.field_type.as_deref()
    }

    pub fn record(&self, path: &str) -> Option<&FieldRecord> {
        self.records.get(path)
    }

    pub fn records(&self) -> impl Iterator<Item = (&str, &FieldRecord)> {
        self.records.iter().map(|(path, record)| (path.as_str(), record))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Appends the plain form of every record to `values`.
    pub fn collect_values(&mut self) {
        let plain: Vec<Value> = self.records.values().map(FieldRecord::to_plain).collect();
        self.values.extend(plain);
    }
}

impl Serialize for TypeBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(field_type) = &self.field_type {
            map.serialize_entry(FIELD_TYPE_KEY, field_type)?;
        }
        for (path, record) in &self.records {
            map.serialize_entry(path, record)?;
        }
        map.serialize_entry(VALUES_KEY, &self.values)?;
        map.end()
    }
}

/// The metaobject accumulator: composite type to path to record.
///
/// Allocated by the caller and filled in place by the transformer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MetaobjectEntries(IndexMap<String, TypeBucket>);

impl MetaobjectEntries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `key = value` at `type`/`path`, merging into an existing
    /// record. `field_type` tags the bucket (e.g. `"block"`).
    ///
    /// Reserved keys and the bucket sentinels are rejected with a warning.
    pub fn save_field(
        &mut self,
        kind: &str,
        path: &str,
        key: &str,
        value: impl Into<Value>,
        field_type: Option<&str>,
    ) {
        let (Some(kind), Some(path)) = (sanitize_key(kind), sanitize_key(path)) else {
            warn!("Skipping record with reserved type/path {:?}/{:?}", kind, path);
            return;
        };
        if path == FIELD_TYPE_KEY || path == VALUES_KEY {
            warn!("Skipping record whose path collides with a bucket key: {}", path);
            return;
        }

        let bucket = self.0.entry(kind.to_string()).or_default();
        if let Some(field_type) = field_type {
            bucket.field_type = Some(field_type.to_string());
        }
        bucket
            .records
            .entry(path.to_string())
            .or_insert_with(|| FieldRecord::new(kind, path))
            .set(key, value);
    }

    pub fn bucket(&self, kind: &str) -> Option<&TypeBucket> {
        self.0.get(kind)
    }

    pub fn record(&self, kind: &str, path: &str) -> Option<&FieldRecord> {
        self.bucket(kind).and_then(|bucket| bucket.record(path))
    }

    pub fn buckets(&self) -> impl Iterator<Item = (&str, &TypeBucket)> {
        self.0.iter().map(|(kind, bucket)| (kind.as_str(), bucket))
    }

    pub fn buckets_mut(&mut self) -> impl Iterator<Item = (&str, &mut TypeBucket)> {
        self.0.iter_mut().map(|(kind, bucket)| (kind.as_str(), bucket))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for MetaobjectEntries {
    type Item = (String, TypeBucket);
    type IntoIter = indexmap::map::IntoIter<String, TypeBucket>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn save_field_merges_into_existing_record() {
        let mut entries = MetaobjectEntries::new();
        entries.save_field("product", "p1", "title", "Shirt", None);
        entries.save_field("product", "p1", "sku", "S-1", None);

        let record = entries.record("product", "p1").unwrap();
        assert_eq!(record.to_plain(), json!({"title": "Shirt", "sku": "S-1"}));
        assert_eq!(record.system().handle, "p1");
        assert_eq!(record.system().kind, "product");
        assert_eq!(record.system().id, None);
    }

    #[test]
    fn save_field_rejects_sentinel_paths() {
        let mut entries = MetaobjectEntries::new();
        entries.save_field("product", VALUES_KEY, "title", "x", None);
        entries.save_field("product", "__proto__", "title", "x", None);
        assert!(entries.is_empty());
    }

    #[test]
    fn bucket_serializes_with_field_type_and_values() {
        let mut entries = MetaobjectEntries::new();
        entries.save_field("page-hero", "p1-hero-b1", "heading", "Hi", Some("block"));
        for (_, bucket) in entries.buckets_mut() {
            bucket.collect_values();
        }

        let json = serde_json::to_value(&entries).unwrap();
        assert_eq!(json["page-hero"]["_field_type"], "block");
        assert_eq!(json["page-hero"]["p1-hero-b1"]["heading"], "Hi");
        assert_eq!(json["page-hero"]["p1-hero-b1"]["value"], json!({"heading": "Hi"}));
        assert_eq!(json["page-hero"]["p1-hero-b1"]["system"]["handle"], "p1-hero-b1");
        assert_eq!(json["page-hero"]["values"], json!([{"heading": "Hi"}]));
    }
}
