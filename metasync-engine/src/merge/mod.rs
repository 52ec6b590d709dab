//! Identity-preserving merge of freshly previewed content into storefront
//! snapshots.
//!
//! The caller owns persistence: it passes in the `current` snapshot it
//! rendered last time, and every element whose identity can be recognized
//! keeps its stored `system` block. Recognition is a substring test of a
//! uid suffix against the stored handle, so it survives path prefix
//! changes between rebuilds. Numeric uids can collide (`"5"` is found in
//! `"125"`).

mod metafields;
mod metaobjects;
mod wrapper;

pub use metafields::MetafieldOptions;
pub use metaobjects::{MetaobjectOptions, UpdatedMetaobject};
pub use wrapper::{ValueWrapper, EMBEDDED_SYSTEM_KEY, LEGACY_SYSTEM_KEY, SNAPSHOT_SYSTEM_KEY};

/// Merges entries into metafield and metaobject snapshots, reading
/// referenced content through a [`CmsPort`](metasync_cms::CmsPort).
pub struct MergeEngine<'p, P: ?Sized> {
    port: &'p P,
}

impl<'p, P: ?Sized> MergeEngine<'p, P> {
    pub fn new(port: &'p P) -> Self {
        Self { port }
    }
}
