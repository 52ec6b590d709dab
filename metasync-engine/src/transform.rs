//! The field transformer.
//!
//! Walks a schema together with its entries and produces one
//! [`MetaobjectDraft`] per entry, recursing into groups, blocks, global
//! fields and references. Scalar fields are additionally recorded in the
//! caller's [`MetaobjectEntries`] accumulator under a composite `type` and
//! `path`:
//!
//! - `type` = `<type prefix>-<schema uid>`, or the schema uid at the root
//!   and below a global field
//! - `path` = `<path prefix>-<entry _metadata.uid>`, or the entry's own uid
//!   at the root
//!
//! CMS fetches are awaited one at a time; only the asset lookups of a
//! multiple `file` field are issued together.

use futures::future::{try_join_all, BoxFuture};
use metasync_cms::{CmsError, CmsPort};
use metasync_model::{
    key_guard, BlockSchema, CslpMapping, Entry, FieldKind, FieldSchema, MetaobjectEntries,
    SchemaView,
};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::error::{EngineError, EngineResult};
use crate::values::{
    bracket_list, coerce_string, is_blank, is_truthy, link_value, quoted_id_list,
    reference_pointer, to_iso_timestamp,
};

/// Field type tag given to buckets produced from `blocks` fields.
pub const BLOCK_FIELD_TYPE: &str = "block";

/// Per-traversal settings passed unchanged down the recursion, except for
/// `field_type`, which is set once a `blocks` field is entered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformOptions {
    pub hash: String,
    pub field_type: Option<String>,
}

impl TransformOptions {
    pub fn new(hash: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            field_type: None,
        }
    }

    fn for_blocks(&self) -> Self {
        Self {
            hash: self.hash.clone(),
            field_type: Some(BLOCK_FIELD_TYPE.to_string()),
        }
    }
}

/// The type and path prefixes of a recursive call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position<'a> {
    pub kind: &'a str,
    pub path: &'a str,
}

impl<'a> Position<'a> {
    pub fn new(kind: &'a str, path: &'a str) -> Self {
        Self { kind, path }
    }

    pub fn root() -> Self {
        Self::default()
    }
}

/// The accumulators one traversal writes into.
pub struct TransformState<'s> {
    pub metaobjects: &'s mut MetaobjectEntries,
    pub cslp: &'s mut CslpMapping,
}

impl<'s> TransformState<'s> {
    pub fn new(metaobjects: &'s mut MetaobjectEntries, cslp: &'s mut CslpMapping) -> Self {
        Self { metaobjects, cslp }
    }
}

/// One field of a draft metaobject. `None` marks an empty reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftField {
    pub key: String,
    pub value: Option<String>,
}

/// The flattened fields produced for one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaobjectDraft {
    pub handle: String,
    pub fields: Vec<DraftField>,
}

impl MetaobjectDraft {
    /// The id parents use to point at this draft: its handle.
    pub fn id(&self) -> &str {
        &self.handle
    }

    pub fn field(&self, key: &str) -> Option<&DraftField> {
        self.fields.iter().find(|f| f.key == key)
    }
}

fn compose_type(prefix: &str, uid: &str) -> String {
    if prefix.is_empty() {
        uid.to_string()
    } else {
        format!("{prefix}-{uid}")
    }
}

fn compose_path(prefix: &str, entry: &Entry) -> String {
    if prefix.is_empty() {
        return entry.uid().unwrap_or_default().to_string();
    }
    match entry.metadata_uid().filter(|uid| !uid.is_empty()) {
        Some(uid) => format!("{prefix}-{uid}"),
        None => prefix.to_string(),
    }
}

fn object_entry(value: &Value) -> Option<Entry> {
    let entry = Entry::from_value(value.clone());
    if entry.is_none() && !value.is_null() {
        warn!("Skipping nested entry that is not an object");
    }
    entry
}

/// Items of a multiple group / global field. A lone object counts as one.
fn entry_list(value: &Value) -> Vec<Entry> {
    match value {
        Value::Array(items) => items.iter().filter_map(object_entry).collect(),
        other => object_entry(other).into_iter().collect(),
    }
}

/// The recursive transformation engine, reading through a [`CmsPort`].
pub struct FieldTransformer<'p, P: ?Sized> {
    port: &'p P,
}

impl<'p, P: CmsPort + ?Sized> FieldTransformer<'p, P> {
    pub fn new(port: &'p P) -> Self {
        Self { port }
    }

    /// Transforms `entries` into `state`.
    ///
    /// Top-level entry point: drafts are discarded, results are read from
    /// the accumulators. Failures are logged and returned unchanged.
    pub async fn create_metaobject_entries(
        &self,
        schema: SchemaView<'_>,
        entries: &[Entry],
        position: Position<'_>,
        mut state: TransformState<'_>,
        options: &TransformOptions,
    ) -> EngineResult<()> {
        match self
            .transform(schema, entries, position, &mut state, options)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                error!("Creating metaobject entries for {} failed: {}", schema.uid, e);
                Err(e)
            }
        }
    }

    /// Transforms `entries` and returns one draft per entry. Nested callers
    /// use the drafts' ids; the accumulators are filled as a side effect.
    pub fn transform<'a, 's>(
        &'a self,
        schema: SchemaView<'a>,
        entries: &'a [Entry],
        position: Position<'a>,
        state: &'a mut TransformState<'s>,
        options: &'a TransformOptions,
    ) -> BoxFuture<'a, EngineResult<Vec<MetaobjectDraft>>>
    where
        'p: 'a,
        's: 'a,
        P: 'a,
    {
        Box::pin(async move {
            let kind = compose_type(position.kind, schema.uid);
            let mut drafts = Vec::with_capacity(entries.len());

            for entry in entries {
                let path = compose_path(position.path, entry);
                debug!("Transforming {} at {}", kind, path);

                let mut fields = Vec::new();
                for field in schema.fields {
                    let Some(value) = entry.field(&field.uid) else {
                        continue;
                    };
                    let here = Position::new(&kind, &path);
                    if let Some(value) = self
                        .transform_field(field, value, entry, here, state, options)
                        .await?
                    {
                        fields.push(DraftField {
                            key: field.uid.clone(),
                            value,
                        });
                    }
                }
                drafts.push(MetaobjectDraft {
                    handle: path,
                    fields,
                });
            }
            Ok(drafts)
        })
    }

    /// Produces one field value. The outer `None` means the field is
    /// skipped entirely.
    async fn transform_field(
        &self,
        field: &FieldSchema,
        value: &Value,
        entry: &Entry,
        here: Position<'_>,
        state: &mut TransformState<'_>,
        options: &TransformOptions,
    ) -> EngineResult<Option<Option<String>>> {
        let hash = options.hash.as_str();
        let nested_path = format!("{}-{}", here.path, field.uid);

        let produced = match field.kind() {
            FieldKind::Group { schema, multiple } => {
                let nested = Position::new(here.kind, &nested_path);
                self.nested(schema, value, multiple, nested, state, options)
                    .await?
            }
            FieldKind::GlobalField {
                global_uid,
                multiple,
            } => {
                let global_uid = global_uid.ok_or_else(|| {
                    CmsError::NotFound(format!("global field reference of {}", field.uid))
                })?;
                let global = self.port.get_global_field(global_uid, hash).await?;
                let nested = Position::new("", &nested_path);
                self.nested(global.view(), value, multiple, nested, state, options)
                    .await?
            }
            FieldKind::Blocks { blocks } => Some(
                self.blocks(field, blocks, value, here, state, options)
                    .await?,
            ),
            FieldKind::Reference {
                targets,
                ref_multiple,
                ..
            } => {
                if ref_multiple {
                    Some(self.references(&targets, value, state, options).await?)
                } else {
                    self.reference(value, state, options).await?
                }
            }
            FieldKind::File { multiple } => {
                if !is_truthy(value) {
                    return Ok(None);
                }
                Some(self.files(value, multiple, hash).await?)
            }
            FieldKind::IsoDate {
                multiple,
                hide_time,
            } => Some(iso_dates(field, value, multiple, hide_time)?),
            FieldKind::Link { multiple } => Some(links(value, multiple)?),
            FieldKind::Json => Some(serde_json::to_string(value)?),
            FieldKind::Scalar => {
                let text = coerce_string(value);
                state.metaobjects.save_field(
                    here.kind,
                    here.path,
                    &field.uid,
                    text.clone(),
                    options.field_type.as_deref(),
                );
                if let Some(tag) = entry.cslp_tag(&field.uid) {
                    state.cslp.record(tag, here.kind, here.path, &field.uid);
                }
                Some(text)
            }
        };
        Ok(Some(produced))
    }

    /// Groups and global fields: a list of ids when `multiple`, otherwise
    /// the id of the single nested entry.
    async fn nested(
        &self,
        schema: SchemaView<'_>,
        value: &Value,
        multiple: bool,
        position: Position<'_>,
        state: &mut TransformState<'_>,
        options: &TransformOptions,
    ) -> EngineResult<Option<String>> {
        if multiple {
            let items = entry_list(value);
            let drafts = self
                .transform(schema, &items, position, state, options)
                .await?;
            Ok(Some(quoted_id_list(drafts.iter().map(MetaobjectDraft::id))))
        } else {
            let items: Vec<Entry> = object_entry(value).into_iter().collect();
            let drafts = self
                .transform(schema, &items, position, state, options)
                .await?;
            Ok(drafts.first().map(|d| d.id().to_string()))
        }
    }

    /// Modular blocks: every block definition gathers its payloads across
    /// the field's items and transforms them as one batch.
    async fn blocks(
        &self,
        field: &FieldSchema,
        blocks: &[BlockSchema],
        value: &Value,
        here: Position<'_>,
        state: &mut TransformState<'_>,
        options: &TransformOptions,
    ) -> EngineResult<String> {
        let items: &[Value] = value.as_array().map(Vec::as_slice).unwrap_or_default();
        let block_kind = format!("{}-{}", here.kind, field.uid);
        let block_options = options.for_blocks();
        let mut ids = Vec::new();

        for block in blocks {
            let Some(block_uid) = key_guard::sanitize_key(&block.uid) else {
                warn!("Skipping block with reserved uid {:?}", block.uid);
                continue;
            };
            let block_path = format!("{}-{}-{}", here.path, field.uid, block_uid);
            let global = match block.global_field_uid() {
                Some(uid) => Some(self.port.get_global_field(uid, &options.hash).await?),
                None => None,
            };

            let block_entries: Vec<Entry> = items
                .iter()
                .filter_map(|item| item.get(block_uid))
                .filter(|payload| is_truthy(payload))
                .filter_map(object_entry)
                .collect();
            if block_entries.is_empty() {
                continue;
            }

            let (schema, kind_prefix) = match &global {
                Some(global) => (global.view(), ""),
                None => (block.view(), block_kind.as_str()),
            };
            let drafts = self
                .transform(
                    schema,
                    &block_entries,
                    Position::new(kind_prefix, &block_path),
                    state,
                    &block_options,
                )
                .await?;
            ids.extend(drafts.into_iter().map(|d| d.handle));
        }
        Ok(quoted_id_list(ids))
    }

    /// Multiple references: entries are fetched per target content type and
    /// transformed as one batch per type.
    async fn references(
        &self,
        targets: &[&str],
        value: &Value,
        state: &mut TransformState<'_>,
        options: &TransformOptions,
    ) -> EngineResult<String> {
        let hash = options.hash.as_str();
        let pointers: &[Value] = value.as_array().map(Vec::as_slice).unwrap_or_default();
        let mut ids = Vec::new();

        for target in targets {
            let mut fetched = Vec::new();
            for pointer in pointers {
                let (content_type_uid, uid) = reference_pointer(pointer);
                if content_type_uid != *target {
                    continue;
                }
                if uid.is_empty() {
                    return Err(CmsError::entry_not_found(content_type_uid, uid).into());
                }
                fetched.push(self.port.get_entry(content_type_uid, uid, hash).await?);
            }
            if fetched.is_empty() {
                continue;
            }

            let content_type = self.port.get_content_type(target, hash).await?;
            let drafts = self
                .transform(
                    content_type.view(),
                    &fetched,
                    Position::root(),
                    state,
                    options,
                )
                .await?;
            ids.extend(drafts.into_iter().map(|d| d.handle));
        }
        Ok(quoted_id_list(ids))
    }

    /// Single reference: the first pointer is resolved and transformed on
    /// its own. A blank value yields an empty reference.
    async fn reference(
        &self,
        value: &Value,
        state: &mut TransformState<'_>,
        options: &TransformOptions,
    ) -> EngineResult<Option<String>> {
        if is_blank(value) {
            return Ok(None);
        }
        let hash = options.hash.as_str();
        let pointer = value.as_array().and_then(|p| p.first()).unwrap_or(value);
        let (content_type_uid, uid) = reference_pointer(pointer);
        if content_type_uid.is_empty() || uid.is_empty() {
            return Err(CmsError::entry_not_found(content_type_uid, uid).into());
        }

        let content_type = self.port.get_content_type(content_type_uid, hash).await?;
        let referenced = self.port.get_entry(content_type_uid, uid, hash).await?;
        let drafts = self
            .transform(
                content_type.view(),
                std::slice::from_ref(&referenced),
                Position::root(),
                state,
                options,
            )
            .await?;
        Ok(drafts.first().map(|d| d.id().to_string()))
    }

    /// Files resolve to storefront asset ids; the lookups of a multiple
    /// field run concurrently.
    async fn files(&self, value: &Value, multiple: bool, hash: &str) -> EngineResult<String> {
        let asset_uid = |file: &Value| {
            file.get("uid")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        if !multiple {
            return Ok(self.port.resolve_asset_gid(&asset_uid(value), hash).await?);
        }

        let uids: Vec<String> = match value {
            Value::Array(files) => files.iter().map(asset_uid).collect(),
            single => vec![asset_uid(single)],
        };
        let gids = try_join_all(
            uids.iter()
                .map(|uid| self.port.resolve_asset_gid(uid, hash)),
        )
        .await?;
        Ok(bracket_list(gids))
    }
}

fn iso_dates(
    field: &FieldSchema,
    value: &Value,
    multiple: bool,
    hide_time: bool,
) -> EngineResult<String> {
    if is_blank(value) {
        return Ok(String::new());
    }
    let convert = |raw: &Value| -> EngineResult<String> {
        if hide_time {
            return Ok(coerce_string(raw));
        }
        to_iso_timestamp(raw).ok_or_else(|| EngineError::InvalidDate {
            field: field.uid.clone(),
            value: coerce_string(raw),
        })
    };

    if multiple {
        let items: &[Value] = match value {
            Value::Array(items) => items,
            single => std::slice::from_ref(single),
        };
        let dates = items.iter().map(convert).collect::<EngineResult<Vec<_>>>()?;
        Ok(bracket_list(dates))
    } else {
        convert(value)
    }
}

fn links(value: &Value, multiple: bool) -> EngineResult<String> {
    if multiple {
        let links: Vec<_> = match value {
            Value::Array(items) => items.iter().filter_map(link_value).collect(),
            single => link_value(single).into_iter().collect(),
        };
        if links.is_empty() {
            return Ok(String::new());
        }
        Ok(serde_json::to_string(&links)?)
    } else {
        match link_value(value) {
            Some(link) => Ok(serde_json::to_string(&link)?),
            None => Ok(String::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_composition() {
        assert_eq!(compose_type("", "product"), "product");
        assert_eq!(compose_type("product-sections", "hero"), "product-sections-hero");
    }

    #[test]
    fn path_composition() {
        let nested = Entry::from_value(json!({"uid": "u1", "_metadata": {"uid": "m1"}})).unwrap();
        assert_eq!(compose_path("", &nested), "u1");
        assert_eq!(compose_path("p-seo", &nested), "p-seo-m1");

        let bare = Entry::from_value(json!({"title": "x"})).unwrap();
        assert_eq!(compose_path("p-seo", &bare), "p-seo");
        assert_eq!(compose_path("", &bare), "");
    }

    #[test]
    fn link_serialization() {
        assert_eq!(
            links(&json!({"title": "Shop", "href": "/shop"}), false).unwrap(),
            r#"{"text":"Shop","url":"/shop"}"#
        );
        assert_eq!(
            links(
                &json!([{"title": "A", "href": "/a"}, {"title": "", "href": "/b"}]),
                true
            )
            .unwrap(),
            r#"[{"text":"A","url":"/a"}]"#
        );
        assert_eq!(links(&json!([{"title": "A"}]), true).unwrap(), "");
    }
}
