//! Content fingerprints of expanded requests
//!
//! A fingerprint identifies a request by content: it names log lines and
//! artifact files, and two equal requests always share one. It is a
//! truncated SHA-256 and is not meant to resist deliberate collisions.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::{RunnerError, RunnerResult};
use crate::types::ExpandedRequest;

/// Digest bytes kept in a fingerprint (rendered as twice as many hex chars)
const FINGERPRINT_BYTES: usize = 16;

/// Fingerprint of an expanded request
pub fn fingerprint(request: &ExpandedRequest) -> RunnerResult<String> {
    let text = canonical_text(&request.document)?;
    Ok(digest(text.as_bytes()))
}

/// Stable text form: keys sorted at every level, two-space indentation
pub fn canonical_text(value: &Value) -> RunnerResult<String> {
    serde_json::to_string_pretty(&canonicalize(value)).map_err(|e| RunnerError::Fingerprint {
        message: e.to_string(),
    })
}

/// Copy of `value` with every object's keys in sorted order
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();

            let mut sorted = Map::with_capacity(map.len());
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key.as_str()]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

fn digest(bytes: &[u8]) -> String {
    let hash = Sha256::digest(bytes);
    hex::encode(&hash[..FINGERPRINT_BYTES])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(document: Value) -> ExpandedRequest {
        ExpandedRequest {
            url: "http://localhost/search".to_string(),
            document,
        }
    }

    #[test]
    fn test_fingerprint_is_short_hex() {
        let fp = fingerprint(&request(json!({"body": {"query": "cats"}}))).unwrap();

        assert_eq!(fp.len(), FINGERPRINT_BYTES * 2);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let r = request(json!({"url": "http://localhost/search", "body": {"query": "cats", "rows": 10}}));
        assert_eq!(fingerprint(&r).unwrap(), fingerprint(&r.clone()).unwrap());
    }

    #[test]
    fn test_key_order_does_not_matter() {
        let a: Value = serde_json::from_str(r#"{"body": {"query": "cats", "rows": 10, "fl": ["id", "title"]}, "url": "u"}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"url": "u", "body": {"fl": ["id", "title"], "rows": 10, "query": "cats"}}"#).unwrap();

        assert_eq!(fingerprint(&request(a)).unwrap(), fingerprint(&request(b)).unwrap());
    }

    #[test]
    fn test_array_order_matters() {
        let a = request(json!({"fl": ["id", "title"]}));
        let b = request(json!({"fl": ["title", "id"]}));
        assert_ne!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
    }

    #[test]
    fn test_different_queries_differ() {
        let a = request(json!({"body": {"query": "cats"}}));
        let b = request(json!({"body": {"query": "dogs"}}));
        assert_ne!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
    }

    #[test]
    fn test_canonical_text_layout() {
        let text = canonical_text(&json!({"b": 1, "a": {"d": true, "c": null}})).unwrap();
        assert_eq!(text, "{\n  \"a\": {\n    \"c\": null,\n    \"d\": true\n  },\n  \"b\": 1\n}");
    }
}
