//! Deterministic task identifiers
//!
//! An id is a truncated blake3 digest of the task's identity fields
//! (title, tags, priority, stakeholders, due). Hashing a canonical JSON
//! form with sorted keys makes the id reproducible: the same identity
//! fields always yield the same id, and any change to one of them yields
//! a different id. Explicitly supplied ids are adopted verbatim and never
//! recomputed.

use indexmap::IndexMap;

use super::value::Value;

/// Default id length in hex characters
pub const DEFAULT_ID_LENGTH: usize = 8;

/// Fields that participate in id hashing, in canonical key order
const IDENTITY_FIELDS: [&str; 5] = ["due", "priority", "stakeholders", "tags", "title"];

/// Computes a deterministic id from the identity fields present in `data`.
/// Absent fields are omitted from the hashed form rather than encoded as
/// null, so adding a field always changes the id.
pub fn compute_id(data: &IndexMap<String, Value>, length: usize) -> String {
    let mut identity = serde_json::Map::new();
    for field in IDENTITY_FIELDS {
        if let Some(value) = data.get(field) {
            identity.insert(field.to_string(), value.to_json());
        }
    }
    let canonical = serde_json::Value::Object(identity).to_string();
    let hash = blake3::hash(canonical.as_bytes());
    let hex = hash.to_hex();
    hex[..length.min(hex.len())].to_string()
}
