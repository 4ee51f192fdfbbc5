//! Canonical serialization and integrity verification of telemetry payloads.
//!
//! Every producer hashes a fixed projection of its payload and attaches the
//! digest under the `hash` key; the consumer recomputes the digest from the
//! received values and compares. The canonical form is the trust anchor of
//! the scheme: producers and the verifier must agree on it byte for byte, so
//! it is pinned down here as compact JSON with lexicographically sorted keys
//! and `serde_json`'s shortest-round-trip number formatting. Keys absent
//! from the payload are encoded as `null`, not treated as an error.
//!
//! The scheme is unkeyed. Anyone holding the canonicalization recipe can
//! forge a valid digest, so verification only detects *naive* tampering
//! where a field is altered without recomputing the hash. Resisting an
//! adversary who knows the recipe would require a keyed MAC or signature,
//! which this system does not provide.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// The payload fields covered by the digest, in wire naming.
///
/// `hash` itself and any extra keys a producer adds are never part of the
/// canonical form.
pub const HASH_FIELDS: [&str; 5] = ["device_id", "timestamp", "temperature", "pressure", "status"];

/// Produce the canonical byte encoding of a payload's hashed fields.
///
/// Deterministic: equal field values yield identical bytes regardless of the
/// payload's key order or any unrelated extra keys.
pub fn canonicalize(payload: &Map<String, Value>) -> Vec<u8> {
    let mut projection: BTreeMap<&str, &Value> = BTreeMap::new();
    for field in HASH_FIELDS {
        projection.insert(field, payload.get(field).unwrap_or(&Value::Null));
    }
    // A BTreeMap of JSON values always serializes.
    serde_json::to_vec(&projection).unwrap_or_default()
}

/// SHA-256 digest of the canonical form, as 64 lowercase hex characters.
pub fn digest(payload: &Map<String, Value>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonicalize(payload));
    format!("{:x}", hasher.finalize())
}

/// Check a payload's carried `hash` against the recomputed digest.
///
/// Returns `false` when the `hash` key is absent or not a string; a message
/// without tamper evidence is treated as a violation, not as unknown.
pub fn verify(payload: &Map<String, Value>) -> bool {
    match payload.get("hash").and_then(Value::as_str) {
        Some(carried) => digest(payload) == carried,
        None => false,
    }
}
