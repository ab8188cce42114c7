//! Deep merge of structured documents.
//!
//! Operates on `serde_json::Value` so any format with a codec into JSON
//! values (JSON itself, TOML) merges the same way.

use serde_json::Value;

/// Merge `overlay` into `base` in place.
///
/// Objects merge key by key, recursively. Every other overlay value, arrays
/// included, replaces the base value wholesale. Merging the same overlay twice
/// leaves the document unchanged after the first time.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Convenience: merge by value and return the result.
pub fn merged(mut base: Value, overlay: Value) -> Value {
    deep_merge(&mut base, overlay);
    base
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn disjoint_keys_combine() {
        let out = merged(json!({ "a": 1 }), json!({ "b": 2 }));
        assert_eq!(out, json!({ "a": 1, "b": 2 }));
    }

    #[test]
    fn nested_maps_merge_and_scalars_replace() {
        let base = json!({ "scripts": { "dev": "vite", "build": "vite build" }, "name": "app" });
        let overlay = json!({ "scripts": { "stripe": "stripe listen" }, "name": "shop" });

        let out = merged(base, overlay);
        assert_eq!(
            out,
            json!({
                "scripts": { "dev": "vite", "build": "vite build", "stripe": "stripe listen" },
                "name": "shop"
            })
        );
    }

    #[test]
    fn arrays_are_replaced_not_concatenated() {
        let out = merged(json!({ "list": [1, 2, 3] }), json!({ "list": [4] }));
        assert_eq!(out, json!({ "list": [4] }));
    }

    #[test]
    fn merging_twice_is_idempotent() {
        let overlay = json!({ "deps": { "stripe": "^14.0.0" }, "tags": ["pay"] });
        let once = merged(json!({ "deps": { "react": "^18" } }), overlay.clone());
        let twice = merged(once.clone(), overlay);
        assert_eq!(once, twice);
    }

    #[test]
    fn object_overlay_replaces_scalar_base() {
        let out = merged(json!({ "db": "sqlite" }), json!({ "db": { "url": "pg" } }));
        assert_eq!(out, json!({ "db": { "url": "pg" } }));
    }
}
