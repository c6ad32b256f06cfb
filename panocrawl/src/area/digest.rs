//! Stable content digest of an area geometry.
//!
//! The digest namespaces the processing ledger: the same geometry must always
//! hash to the same value regardless of key order or whitespace in the source
//! file, while any change to the coordinates starts a fresh namespace.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Returns the canonical JSON encoding of a value.
///
/// Object keys are sorted recursively and the output carries no incidental
/// whitespace (`,` and `:` separators only).
pub fn canonical_json(value: &Value) -> String {
    canonicalize(value).to_string()
}

/// Computes the lowercase hex SHA-256 of the canonical encoding.
pub fn area_digest(geometry: &Value) -> String {
    let canonical = canonical_json(geometry);
    format!("{:x}", Sha256::digest(canonical.as_bytes()))
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();

            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_json_sorts_keys_and_strips_whitespace() {
        let value: Value = serde_json::from_str(
            r#"{ "type" : "Polygon",
                 "coordinates" : [[[1, 2], [3, 4]]] }"#,
        )
        .unwrap();

        assert_eq!(
            canonical_json(&value),
            r#"{"coordinates":[[[1,2],[3,4]]],"type":"Polygon"}"#
        );
    }

    #[test]
    fn test_digest_is_hex_sha256() {
        let digest = area_digest(&json!({"type": "Polygon"}));
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_reordered_keys_hash_identically() {
        let a: Value = serde_json::from_str(
            r#"{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]],"crs":{"name":"x","type":"name"}}"#,
        )
        .unwrap();
        let b: Value = serde_json::from_str(
            r#"{"crs":{"type":"name","name":"x"},
                "coordinates":[[[0,0],[1,0],[1,1],[0,0]]],
                "type":"Polygon"}"#,
        )
        .unwrap();

        assert_eq!(area_digest(&a), area_digest(&b));
    }

    #[test]
    fn test_coordinate_change_changes_digest() {
        let a = json!({"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]});
        let b = json!({"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 2], [0, 0]]]});
        assert_ne!(area_digest(&a), area_digest(&b));
    }

    #[test]
    fn test_array_order_is_significant() {
        let a = json!({"coordinates": [1, 2]});
        let b = json!({"coordinates": [2, 1]});
        assert_ne!(area_digest(&a), area_digest(&b));
    }
}
