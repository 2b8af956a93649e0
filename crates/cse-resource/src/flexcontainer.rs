use serde_json::{Map, Value};

use crate::body::{FlexContainerBody, FlexContainerInstanceBody};

/// Attributes that are never copied into a FlexContainerInstance snapshot:
/// housekeeping fields the instance doesn't need, quota bookkeeping that
/// belongs to the parent, and announce state beyond a single CSI hop.
const RESERVED: &[&str] = &["cni", "cbs", "cnd", "cs", "mni", "mbs", "at", "aa", "acpi"];

/// `cs` is specified as the byte length of the canonical JSON encoding of a
/// FlexContainer's non-reserved attributes, rather than an in-memory object
/// size (which has no portable equivalent).
pub fn canonical_size(custom: &Map<String, Value>) -> u64 {
    let filtered: Map<String, Value> = custom
        .iter()
        .filter(|(k, _)| !RESERVED.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    serde_json::to_vec(&Value::Object(filtered))
        .map(|bytes| bytes.len() as u64)
        .unwrap_or(0)
}

/// Builds the FlexContainerInstance snapshot taken on every successful
/// UPDATE of a FlexContainer that has `mni` or `mbs` set.
pub fn snapshot_instance(fc: &FlexContainerBody) -> FlexContainerInstanceBody {
    let snapshot: Map<String, Value> = fc
        .custom
        .iter()
        .filter(|(k, _)| !RESERVED.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let cs = canonical_size(&fc.custom);
    FlexContainerInstanceBody { cs, snapshot }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reserved_attributes_are_not_copied() {
        let mut fc = FlexContainerBody::default();
        fc.custom.insert("temperature".into(), json!(21.5));
        fc.custom.insert("cni".into(), json!(4));
        let snap = snapshot_instance(&fc);
        assert!(snap.snapshot.contains_key("temperature"));
        assert!(!snap.snapshot.contains_key("cni"));
    }

    #[test]
    fn cs_is_byte_length_of_canonical_encoding() {
        let mut custom = Map::new();
        custom.insert("a".into(), json!(1));
        let expected = serde_json::to_vec(&json!({"a": 1})).unwrap().len() as u64;
        assert_eq!(canonical_size(&custom), expected);
    }
}
