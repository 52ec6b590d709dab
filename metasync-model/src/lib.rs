//! Content model for metasync.
//!
//! Defines the types shared by the CMS port and the transformation engine:
//! - [`FieldSchema`] / [`ContentType`]: the CMS schema tree, with [`FieldKind`]
//!   as the closed per-variant view the engine dispatches on
//! - [`Entry`] / [`Asset`]: dynamically shaped CMS payloads
//! - [`KeyBasedContentType`]: a schema reindexed by field uid
//! - [`MetaobjectEntries`] / [`CslpMapping`]: the accumulators filled in
//!   place during transformation
//! - [`key_guard`]: rejection of reserved map keys from untrusted input

mod cslp;
mod entry;
pub mod key_guard;
mod key_based;
mod metaobject;
mod schema;

pub use cslp::CslpMapping;
pub use entry::{Asset, AssetMetadata, Entry, ASSET_GID_KEY};
pub use key_based::{create_content_type_key_based, KeyBasedContentType};
pub use metaobject::{
    FieldRecord, MetaobjectEntries, SystemBlock, TypeBucket, FIELD_TYPE_KEY, VALUES_KEY,
};
pub use schema::{
    BlockSchema, ContentType, DataType, FieldKind, FieldMetadata, FieldSchema, ReferenceTo,
    SchemaView,
};
