//! Fixture-backed [`CmsPort`] for tests and offline rendering.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use metasync_model::{Asset, ContentType, Entry};

use crate::error::{CmsError, CmsResult};
use crate::port::CmsPort;

/// One recorded port call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CmsCall {
    Entry { content_type: String, uid: String },
    ContentType(String),
    Asset(String),
    GlobalField(String),
}

/// An in-memory CMS. Lookups that miss fail the same way the HTTP
/// client does; every call is logged.
#[derive(Debug, Default)]
pub struct InMemoryCms {
    entries: HashMap<(String, String), Entry>,
    content_types: HashMap<String, ContentType>,
    assets: HashMap<String, Asset>,
    global_fields: HashMap<String, ContentType>,
    calls: Mutex<Vec<CmsCall>>,
}

impl InMemoryCms {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_entry(mut self, content_type_uid: &str, entry: Entry) -> Self {
        let uid = entry.uid().unwrap_or_default().to_string();
        self.entries.insert((content_type_uid.to_string(), uid), entry);
        self
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_types
            .insert(content_type.uid.clone(), content_type);
        self
    }

    #[must_use]
    pub fn with_asset(mut self, asset: Asset) -> Self {
        self.assets.insert(asset.uid.clone(), asset);
        self
    }

    #[must_use]
    pub fn with_global_field(mut self, global_field: ContentType) -> Self {
        self.global_fields
            .insert(global_field.uid.clone(), global_field);
        self
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<CmsCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: CmsCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

#[async_trait]
impl CmsPort for InMemoryCms {
    async fn get_entry(
        &self,
        content_type_uid: &str,
        entry_uid: &str,
        _hash: &str,
    ) -> CmsResult<Entry> {
        self.record(CmsCall::Entry {
            content_type: content_type_uid.to_string(),
            uid: entry_uid.to_string(),
        });
        self.entries
            .get(&(content_type_uid.to_string(), entry_uid.to_string()))
            .cloned()
            .ok_or_else(|| CmsError::entry_not_found(content_type_uid, entry_uid))
    }

    async fn get_content_type(&self, content_type_uid: &str, _hash: &str) -> CmsResult<ContentType> {
        self.record(CmsCall::ContentType(content_type_uid.to_string()));
        self.content_types
            .get(content_type_uid)
            .cloned()
            .ok_or_else(|| CmsError::NotFound(format!("content type {content_type_uid}")))
    }

    async fn get_asset(&self, asset_uid: &str, _hash: &str) -> CmsResult<Asset> {
        self.record(CmsCall::Asset(asset_uid.to_string()));
        self.assets
            .get(asset_uid)
            .cloned()
            .ok_or_else(|| CmsError::NotFound(format!("asset {asset_uid}")))
    }

    async fn get_global_field(&self, uid: &str, _hash: &str) -> CmsResult<ContentType> {
        self.record(CmsCall::GlobalField(uid.to_string()));
        self.global_fields
            .get(uid)
            .cloned()
            .ok_or_else(|| CmsError::NotFound(format!("global field {uid}")))
    }
}
