use metasync_cms::CmsPort;
use metasync_model::{key_guard, CslpMapping, Entry, KeyBasedContentType, MetaobjectEntries};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::MergeEngine;
use crate::error::EngineResult;
use crate::transform::{FieldTransformer, Position, TransformOptions, TransformState};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaobjectOptions {
    pub content_type_uid: String,
    pub hash: String,
}

impl MetaobjectOptions {
    pub fn new(content_type_uid: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            content_type_uid: content_type_uid.into(),
            hash: hash.into(),
        }
    }
}

/// The refreshed metaobject snapshot and the edit-tag mapping built while
/// producing it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdatedMetaobject {
    #[serde(rename = "currentMetaobjects")]
    pub current_metaobjects: Map<String, Value>,
    #[serde(rename = "dataCSLPMapping")]
    pub data_cslp_mapping: CslpMapping,
}

impl<P: CmsPort + ?Sized> MergeEngine<'_, P> {
    /// Re-materializes `entry` and replaces the matching type buckets of
    /// `current`.
    ///
    /// Each produced bucket gains a `values` list of its records' plain
    /// forms and overwrites the snapshot's bucket of the same type; other
    /// buckets are left alone. Returns `None` when `current` is not an
    /// object.
    pub async fn get_updated_metaobject(
        &self,
        current: Value,
        key_based: &KeyBasedContentType,
        entry: &Entry,
        options: &MetaobjectOptions,
    ) -> EngineResult<Option<UpdatedMetaobject>> {
        let Value::Object(current) = current else {
            debug!("Current metaobjects are not an object, nothing to merge");
            return Ok(None);
        };
        let mut current_metaobjects = key_guard::sanitized_copy(&current);

        let content_type = key_based.to_content_type(&options.content_type_uid);
        let mut metaobjects = MetaobjectEntries::new();
        let mut data_cslp_mapping = CslpMapping::new();
        FieldTransformer::new(self.port)
            .create_metaobject_entries(
                content_type.view(),
                std::slice::from_ref(entry),
                Position::root(),
                TransformState::new(&mut metaobjects, &mut data_cslp_mapping),
                &TransformOptions::new(options.hash.as_str()),
            )
            .await?;

        let mut replaced = 0;
        for (kind, mut bucket) in metaobjects {
            bucket.collect_values();
            current_metaobjects.insert(kind, serde_json::to_value(&bucket)?);
            replaced += 1;
        }

        info!(
            "Replaced {} metaobject types for {}",
            replaced, options.content_type_uid
        );
        Ok(Some(UpdatedMetaobject {
            current_metaobjects,
            data_cslp_mapping,
        }))
    }
}
