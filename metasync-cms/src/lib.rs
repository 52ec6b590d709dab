//! CMS access port for metasync.
//!
//! The transformation engine reads entries, content types, assets and
//! global fields exclusively through [`CmsPort`]:
//! - [`ContentstackClient`]: the live-preview delivery API over HTTP
//! - [`InMemoryCms`]: fixtures, for tests and offline rendering

mod contentstack;
mod error;
mod memory;
mod port;

pub use contentstack::{ContentstackClient, ContentstackConfig, DEFAULT_PREVIEW_URL};
pub use error::{CmsError, CmsResult};
pub use memory::{CmsCall, InMemoryCms};
pub use port::CmsPort;
