//! Reserved-key guard for maps built from untrusted CMS or caller input.
//!
//! Keys equal to one of [`RESERVED_KEYS`] are control identifiers in the
//! storefront's rendering layer and are never read from or written into
//! accumulators. Rejection is silent apart from a `warn!`.

use serde_json::{Map, Value};
use tracing::warn;

/// Keys that are never accepted as dynamic map keys.
pub const RESERVED_KEYS: [&str; 3] = ["__proto__", "prototype", "constructor"];

/// Returns `true` when `key` may be used as a dynamic map key.
pub fn is_safe_key(key: &str) -> bool {
    !RESERVED_KEYS.contains(&key)
}

/// Returns the key unchanged when it is safe, `None` otherwise.
pub fn sanitize_key(key: &str) -> Option<&str> {
    is_safe_key(key).then_some(key)
}

/// Shallow copy of `map` with every reserved key dropped.
///
/// Used before iterating any externally supplied mapping.
pub fn sanitized_copy(map: &Map<String, Value>) -> Map<String, Value> {
    let mut copy = Map::with_capacity(map.len());
    for (key, value) in map {
        if is_safe_key(key) {
            copy.insert(key.clone(), value.clone());
        } else {
            warn!("Dropping reserved key {:?} from external input", key);
        }
    }
    copy
}
