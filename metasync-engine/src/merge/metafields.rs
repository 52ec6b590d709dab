use indexmap::IndexMap;
use metasync_cms::{CmsError, CmsPort};
use metasync_model::{key_guard, Entry, FieldKind, KeyBasedContentType, SystemBlock};
use serde_json::Value;
use tracing::{debug, info};

use super::wrapper::{embed_system, scalar_text, snapshot_system, ValueWrapper};
use super::MergeEngine;
use crate::error::EngineResult;
use crate::values::reference_pointer;

/// Identity of the product whose metafields are merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetafieldOptions {
    pub content_type_uid: String,
    pub entry_uid: String,
    pub hash: String,
}

impl MetafieldOptions {
    pub fn new(
        content_type_uid: impl Into<String>,
        entry_uid: impl Into<String>,
        hash: impl Into<String>,
    ) -> Self {
        Self {
            content_type_uid: content_type_uid.into(),
            entry_uid: entry_uid.into(),
            hash: hash.into(),
        }
    }

    /// `{ct}-{key}` / `{entry}-{key}`: the identity of a whole field.
    fn field_system(&self, key: &str) -> SystemBlock {
        SystemBlock::new(
            format!("{}-{}", self.content_type_uid, key),
            format!("{}-{}", self.entry_uid, key),
        )
    }
}

/// Elements of a stored list-shaped metafield.
fn stored_items(stored: &Value) -> &[Value] {
    stored.as_array().map(Vec::as_slice).unwrap_or_default()
}

/// The stored system block of the first element whose handle contains
/// `needle`.
fn find_by_handle(items: &[Value], needle: &str) -> Option<SystemBlock> {
    items
        .iter()
        .filter_map(snapshot_system)
        .find(|system| system.handle.contains(needle))
}

impl<P: CmsPort + ?Sized> MergeEngine<'_, P> {
    /// Merges `entry` into the product metafield snapshot `current`.
    ///
    /// Every key of `current` yields one wrapper; keys the entry's schema
    /// does not own are passed through. A plain owned field the entry has
    /// no value for is left out. Reference shape follows the field's own
    /// `multiple` flag. Returns `None` when `current` is not an object.
    pub async fn get_updated_product_metafields(
        &self,
        current: &Value,
        key_based: &KeyBasedContentType,
        entry: &Entry,
        options: &MetafieldOptions,
    ) -> EngineResult<Option<IndexMap<String, ValueWrapper>>> {
        let Some(current) = current.as_object() else {
            debug!("Current metafields are not an object, nothing to merge");
            return Ok(None);
        };
        let current = key_guard::sanitized_copy(current);

        let mut merged = IndexMap::with_capacity(current.len());
        for (key, stored) in &current {
            let wrapper = match key_based.get(key).map(|field| field.kind()) {
                None => unowned(key, stored, entry, options),
                Some(FieldKind::Blocks { .. }) => blocks(key, stored, entry, options),
                Some(FieldKind::File { .. }) => files(entry.field(key)),
                Some(FieldKind::Reference { multiple: true, .. }) => {
                    self.references(key, stored, entry, options).await?
                }
                Some(FieldKind::Reference { multiple: false, .. }) => {
                    self.reference(key, stored, entry, &options.hash).await?
                }
                Some(_) => match entry.field(key) {
                    Some(value) => carried(stored, value),
                    None => {
                        debug!("Entry has no value for {}, dropping it", key);
                        continue;
                    }
                },
            };
            merged.insert(key.clone(), wrapper);
        }

        info!(
            "Merged {} metafields for {}/{}",
            merged.len(),
            options.content_type_uid,
            options.entry_uid
        );
        Ok(Some(merged))
    }

    /// Multiple references: each referenced entry is fetched in turn and
    /// keeps the stored identity whose handle contains its uid.
    async fn references(
        &self,
        key: &str,
        stored: &Value,
        entry: &Entry,
        options: &MetafieldOptions,
    ) -> EngineResult<ValueWrapper> {
        let pointers: &[Value] = entry
            .field(key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let mut items = Vec::with_capacity(pointers.len());
        for pointer in pointers {
            let (content_type_uid, uid) = reference_pointer(pointer);
            if content_type_uid.is_empty() || uid.is_empty() {
                return Err(CmsError::entry_not_found(content_type_uid, uid).into());
            }
            let referenced = self
                .port
                .get_entry(content_type_uid, uid, &options.hash)
                .await?;

            let referenced_uid = referenced.uid().unwrap_or(uid);
            let system = find_by_handle(stored_items(stored), referenced_uid).unwrap_or_else(|| {
                SystemBlock::new(
                    referenced.content_type_uid().unwrap_or(content_type_uid),
                    referenced_uid,
                )
            });
            let raw = referenced.into_value();
            items.push(ValueWrapper::embedded(&raw, raw.clone(), Some(system)));
        }
        Ok(ValueWrapper::list(items, options.field_system(key)))
    }

    /// Single reference: the stored identity is kept as is. It is read from
    /// `___system`, then `_system`, then `system` on the stored value.
    async fn reference(
        &self,
        key: &str,
        stored: &Value,
        entry: &Entry,
        hash: &str,
    ) -> EngineResult<ValueWrapper> {
        let pointer = match entry.field(key) {
            Some(Value::Array(pointers)) => pointers.first(),
            Some(pointer @ Value::Object(_)) => Some(pointer),
            _ => None,
        };
        let (content_type_uid, uid) = pointer.map(reference_pointer).unwrap_or_default();
        if content_type_uid.is_empty() || uid.is_empty() {
            return Err(CmsError::entry_not_found(content_type_uid, uid).into());
        }

        let raw = self
            .port
            .get_entry(content_type_uid, uid, hash)
            .await?
            .into_value();
        Ok(ValueWrapper::embedded(&raw, raw.clone(), snapshot_system(stored)))
    }
}

/// A key the schema does not own: the entry's value when it has one,
/// otherwise the stored value.
fn unowned(key: &str, stored: &Value, entry: &Entry, options: &MetafieldOptions) -> ValueWrapper {
    let clean = entry
        .field(key)
        .filter(|value| !value.is_null())
        .unwrap_or(stored);
    let system = snapshot_system(stored).unwrap_or_else(|| options.field_system(key));

    let text = scalar_text(clean).unwrap_or_else(|| clean.to_string());
    let json = embed_system(clean, Some(&system));
    ValueWrapper::embedded(clean, json, Some(system)).with_text(Some(text))
}

/// Modular blocks: one wrapper per block payload, keeping the stored
/// identity whose handle contains `-<block _metadata.uid>`.
fn blocks(key: &str, stored: &Value, entry: &Entry, options: &MetafieldOptions) -> ValueWrapper {
    let blocks: &[Value] = entry
        .field(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut items = Vec::new();
    for block in blocks.iter().filter_map(Value::as_object) {
        for (block_key, payload) in key_guard::sanitized_copy(block) {
            let block_uid = payload
                .get("_metadata")
                .and_then(|metadata| metadata.get("uid"))
                .and_then(Value::as_str)
                .filter(|uid| !uid.is_empty());

            let carried = block_uid
                .and_then(|uid| find_by_handle(stored_items(stored), &format!("-{uid}")));
            let system = carried.unwrap_or_else(|| {
                let base = format!("{}-{}-{}", options.entry_uid, key, block_key);
                let handle = match block_uid {
                    Some(uid) => format!("{base}-{uid}"),
                    None => base,
                };
                SystemBlock::new(
                    format!("{}-{}-{}", options.content_type_uid, key, block_key),
                    handle,
                )
                .with_id(block_uid.map(str::to_string))
            });

            let json = embed_system(&payload, Some(&system));
            items.push(ValueWrapper::embedded(&payload, json, Some(system)));
        }
    }

    if items.is_empty() {
        items.push(ValueWrapper::embedded(
            &Value::Null,
            Value::Null,
            Some(options.field_system(key)),
        ));
    }
    ValueWrapper::list(items, options.field_system(key))
}

/// Files serialize as their URL list.
fn files(value: Option<&Value>) -> ValueWrapper {
    let raw = value.cloned().unwrap_or(Value::Null);
    let urls = match &raw {
        Value::Array(assets) => Value::Array(
            assets
                .iter()
                .map(|asset| asset.get("url").cloned().unwrap_or(Value::Null))
                .collect(),
        ),
        _ => Value::Null,
    };
    ValueWrapper::embedded(&raw, urls, None)
}

/// Any other owned field: the entry's value under the stored identity.
fn carried(stored: &Value, value: &Value) -> ValueWrapper {
    let text = scalar_text(value);
    ValueWrapper::embedded(value, value.clone(), snapshot_system(stored)).with_text(text)
}
