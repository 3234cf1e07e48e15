// hasher.rs — Deterministic SHA-256 fingerprints for request parameters.
//
// Audit records never carry raw parameters; they carry a digest of the
// canonical JSON serialization. serde_json's object map is BTreeMap
// backed, so keys serialize in lexicographic order at every nesting
// level — the same logical mapping yields the same digest regardless of
// key order in the source text.

use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::warn;

/// Hash raw bytes to a lowercase 64-hex SHA-256 string.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    // `format!("{:x}", ...)` produces lowercase hex.
    format!("{:x}", hasher.finalize())
}

/// Hash a JSON value by its canonical serialization.
///
/// Never fails: on a serialization error the digest of the empty body is
/// returned and a warning is logged.
pub fn hash_value(value: &Value) -> String {
    match serde_json::to_string(value) {
        Ok(canonical) => hash_bytes(canonical.as_bytes()),
        Err(err) => {
            warn!(error = %err, "params serialization failed, hashing empty body");
            hash_bytes(b"")
        }
    }
}
