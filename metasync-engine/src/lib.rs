//! Transformation engine for metasync.
//!
//! Turns live-preview CMS entries into storefront metaobjects:
//! - [`FieldTransformer`]: recursive, schema-driven flattening of entries
//!   into the caller's [`MetaobjectEntries`](metasync_model::MetaobjectEntries)
//! - [`MergeEngine`]: merges an entry into a stored metafield or
//!   metaobject snapshot, keeping recognized `system` identities
//! - [`LivePreview`]: both, over one owned [`CmsPort`](metasync_cms::CmsPort)
//!
//! CMS calls are awaited one after another; a failure anywhere aborts the
//! whole operation.

mod error;
mod facade;
pub mod merge;
mod transform;
mod values;

pub use error::{EngineError, EngineResult};
pub use facade::LivePreview;
pub use merge::{
    MergeEngine, MetafieldOptions, MetaobjectOptions, UpdatedMetaobject, ValueWrapper,
    SNAPSHOT_SYSTEM_KEY,
};
pub use metasync_model::create_content_type_key_based;
pub use transform::{
    DraftField, FieldTransformer, MetaobjectDraft, Position, TransformOptions, TransformState,
    BLOCK_FIELD_TYPE,
};
