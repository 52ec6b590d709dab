//! The CMS access port consumed by the transformation engine.

use async_trait::async_trait;
use metasync_model::{Asset, ContentType, Entry};
use tracing::debug;

use crate::error::CmsResult;

/// Read access to a live-preview CMS.
///
/// Every call carries the live-preview `hash` of the session being
/// previewed. Implementations do no business logic.
#[async_trait]
pub trait CmsPort: Send + Sync {
    /// Fetches one entry. Fails with `EntryNotFound` when the response has
    /// no entry and with `Api` when it carries an error code.
    async fn get_entry(&self, content_type_uid: &str, entry_uid: &str, hash: &str)
        -> CmsResult<Entry>;

    /// Fetches a content type with its full schema.
    async fn get_content_type(&self, content_type_uid: &str, hash: &str) -> CmsResult<ContentType>;

    /// Fetches an asset including its extension metadata.
    async fn get_asset(&self, asset_uid: &str, hash: &str) -> CmsResult<Asset>;

    /// Fetches a global field. Its `uid` and `schema` are walked like a
    /// content type.
    async fn get_global_field(&self, uid: &str, hash: &str) -> CmsResult<ContentType>;

    /// Resolves the storefront asset id of an asset. Empty when the asset
    /// has none.
    async fn resolve_asset_gid(&self, asset_uid: &str, hash: &str) -> CmsResult<String> {
        let asset = self.get_asset(asset_uid, hash).await?;
        let gid = asset.storefront_gid().unwrap_or_default().to_string();
        debug!("Resolved asset {} to {:?}", asset_uid, gid);
        Ok(gid)
    }
}
