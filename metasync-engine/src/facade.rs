//! The live-preview entry point used by storefront integrations.

use indexmap::IndexMap;
use metasync_cms::{CmsPort, ContentstackClient, ContentstackConfig};
use metasync_model::{
    CslpMapping, Entry, FieldSchema, KeyBasedContentType, MetaobjectEntries, SchemaView,
};
use serde_json::Value;
use tracing::debug;

use crate::error::EngineResult;
use crate::merge::{
    MergeEngine, MetafieldOptions, MetaobjectOptions, UpdatedMetaobject, ValueWrapper,
};
use crate::transform::{FieldTransformer, Position, TransformOptions, TransformState};

/// Owns a CMS port and exposes the transformation and merge operations
/// over it.
pub struct LivePreview<P> {
    port: P,
}

impl LivePreview<ContentstackClient> {
    /// Builds a preview session against the Contentstack delivery API.
    pub fn connect(config: ContentstackConfig) -> EngineResult<Self> {
        Ok(Self::new(ContentstackClient::new(config)?))
    }

    /// Fetches an entry with its content type schema, returning the raw
    /// response body.
    pub async fn fetch_data(
        &self,
        content_type_uid: &str,
        entry_uid: &str,
        hash: &str,
    ) -> EngineResult<Value> {
        debug!("Fetching {}/{} with schema", content_type_uid, entry_uid);
        Ok(self
            .port
            .fetch_entry_with_schema(content_type_uid, entry_uid, hash)
            .await?)
    }
}

impl<P: CmsPort> LivePreview<P> {
    pub fn new(port: P) -> Self {
        Self { port }
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    /// Transforms `entries` into the caller's accumulators.
    pub async fn create_metaobject_entries(
        &self,
        schema: SchemaView<'_>,
        entries: &[Entry],
        position: Position<'_>,
        metaobjects: &mut MetaobjectEntries,
        cslp: &mut CslpMapping,
        options: &TransformOptions,
    ) -> EngineResult<()> {
        FieldTransformer::new(&self.port)
            .create_metaobject_entries(
                schema,
                entries,
                position,
                TransformState::new(metaobjects, cslp),
                options,
            )
            .await
    }

    pub async fn get_updated_product_metafields(
        &self,
        current: &Value,
        key_based: &KeyBasedContentType,
        entry: &Entry,
        options: &MetafieldOptions,
    ) -> EngineResult<Option<IndexMap<String, ValueWrapper>>> {
        MergeEngine::new(&self.port)
            .get_updated_product_metafields(current, key_based, entry, options)
            .await
    }

    pub async fn get_updated_metaobject(
        &self,
        current: Value,
        key_based: &KeyBasedContentType,
        entry: &Entry,
        options: &MetaobjectOptions,
    ) -> EngineResult<Option<UpdatedMetaobject>> {
        MergeEngine::new(&self.port)
            .get_updated_metaobject(current, key_based, entry, options)
            .await
    }

    pub fn create_content_type_key_based(&self, schema: &[FieldSchema]) -> KeyBasedContentType {
        KeyBasedContentType::from_schema(schema)
    }
}
