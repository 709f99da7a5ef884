//! Structural merge of layered content trees
//!
//! Two strategies, chosen by whether a layer is optional. Non-optional
//! layers overwrite; optional layers only fill gaps and never displace a
//! value that is already present, whoever put it there.

use serde_json::Value;

/// Merge `layer` into `base`, layer values winning.
///
/// Maps merge recursively key by key. Everything else, including arrays
/// and mismatched types, is replaced wholesale.
pub fn overlay(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base_map), Value::Object(layer_map)) => {
            for (key, layer_value) in layer_map {
                match base_map.get_mut(&key) {
                    Some(base_value) => overlay(base_value, layer_value),
                    None => {
                        base_map.insert(key, layer_value);
                    }
                }
            }
        }
        (base_slot, layer_value) => *base_slot = layer_value,
    }
}

/// Merge `layer` into `base`, only adding keys absent from `base`.
///
/// An existing key is never overwritten, not even by value of the same
/// type; nested maps are descended so deeper gaps still get filled. A
/// present key of any non-map type blocks the layer's subtree entirely.
pub fn fill_missing(base: &mut Value, layer: Value) {
    if let (Value::Object(base_map), Value::Object(layer_map)) = (base, layer) {
        for (key, layer_value) in layer_map {
            match base_map.get_mut(&key) {
                Some(base_value) => fill_missing(base_value, layer_value),
                None => {
                    base_map.insert(key, layer_value);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn overlay_replaces_scalars_and_merges_maps() {
        let mut base = json!({"a": 1, "nested": {"x": 1, "y": 2}});
        overlay(&mut base, json!({"a": 2, "nested": {"y": 3, "z": 4}}));
        assert_eq!(base, json!({"a": 2, "nested": {"x": 1, "y": 3, "z": 4}}));
    }

    #[test]
    fn overlay_replaces_arrays_wholesale() {
        let mut base = json!({"list": [1, 2, 3]});
        overlay(&mut base, json!({"list": [9]}));
        assert_eq!(base, json!({"list": [9]}));
    }

    #[test]
    fn overlay_replaces_mismatched_types() {
        let mut base = json!({"value": {"deep": true}});
        overlay(&mut base, json!({"value": 7}));
        assert_eq!(base, json!({"value": 7}));

        let mut base = json!({"value": 7});
        overlay(&mut base, json!({"value": {"deep": true}}));
        assert_eq!(base, json!({"value": {"deep": true}}));
    }

    #[test]
    fn fill_missing_never_overwrites() {
        let mut base = json!({"a": 1, "nested": {"x": 1}});
        fill_missing(&mut base, json!({"a": 99, "b": 2, "nested": {"x": 99, "y": 2}}));
        assert_eq!(base, json!({"a": 1, "b": 2, "nested": {"x": 1, "y": 2}}));
    }

    #[test]
    fn fill_missing_keeps_explicit_null() {
        let mut base = json!({"a": null});
        fill_missing(&mut base, json!({"a": 1}));
        assert_eq!(base, json!({"a": null}));
    }

    #[test]
    fn fill_missing_does_not_descend_into_scalars() {
        let mut base = json!({"a": "leaf"});
        fill_missing(&mut base, json!({"a": {"child": 1}}));
        assert_eq!(base, json!({"a": "leaf"}));
    }
}
