//! Snapshot serialization and change detection.
//!
//! The serialized form is a compact JSON object with one entry per id,
//! in id order, with null/cleared entitlements omitted -- small enough to
//! embed in an externally signed token. `diff` exists so token issuers
//! renew only on detected change, never unconditionally.

use serde_json::Map;
use tierkit_core::Value;

use crate::entitlement::Snapshot;

/// Serialize a snapshot into its compact byte form.
pub fn serialize(snapshot: &Snapshot) -> Vec<u8> {
    let mut obj = Map::new();
    for (id, value) in snapshot.entries() {
        if matches!(value, Value::Null) {
            continue;
        }
        obj.insert(id.to_string(), value_to_json(value));
    }
    // Object keys come from a BTreeMap, so the bytes are deterministic.
    serde_json::to_vec(&serde_json::Value::Object(obj))
        .unwrap_or_else(|_| b"{}".to_vec())
}

/// True iff the two snapshots differ in their non-null (id, value) pairs.
pub fn diff(a: &Snapshot, b: &Snapshot) -> bool {
    let pairs = |s: &Snapshot| -> Vec<(String, serde_json::Value)> {
        s.entries()
            .filter(|(_, v)| !matches!(v, Value::Null))
            .map(|(id, v)| (id.to_string(), value_to_json(v)))
            .collect()
    };
    pairs(a) != pairs(b)
}

/// Numbers serialize as normalized decimal strings (`"2.50"` and `"2.5"`
/// produce identical output), keeping equality and bytes in agreement.
fn value_to_json(v: &Value) -> serde_json::Value {
    match v {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(d) => serde_json::Value::String(d.normalize().to_string()),
        Value::Text(t) => serde_json::Value::String(t.clone()),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rust_decimal::Decimal;

    use super::*;
    use crate::entitlement::snapshot_from_entries;

    fn snap(pairs: &[(&str, Value)]) -> Snapshot {
        snapshot_from_entries(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    #[test]
    fn null_entries_are_omitted() {
        let s = snap(&[
            ("haveCalendar", Value::Bool(false)),
            ("maxPets", Value::Null),
        ]);
        assert_eq!(serialize(&s), br#"{"haveCalendar":false}"#.to_vec());
    }

    #[test]
    fn serialization_is_order_independent_and_deterministic() {
        let a = snap(&[
            ("a", Value::Number(Decimal::from(1))),
            ("b", Value::Text("x".into())),
        ]);
        let b = snap(&[
            ("b", Value::Text("x".into())),
            ("a", Value::Number(Decimal::from(1))),
        ]);
        assert_eq!(serialize(&a), serialize(&b));
    }

    #[test]
    fn equal_decimals_with_different_scales_serialize_identically() {
        let a = snap(&[("n", Value::Number("2.50".parse().unwrap()))]);
        let b = snap(&[("n", Value::Number("2.5".parse().unwrap()))]);
        assert_eq!(serialize(&a), serialize(&b));
        assert!(!diff(&a, &b));
    }

    #[test]
    fn diff_of_a_snapshot_with_itself_is_no_change() {
        let s = snap(&[("haveCalendar", Value::Bool(true))]);
        assert!(!diff(&s, &s));
    }

    #[test]
    fn changing_one_effective_value_is_detected() {
        let a = snap(&[("maxPets", Value::Number(Decimal::from(2)))]);
        let b = snap(&[("maxPets", Value::Number(Decimal::from(6)))]);
        assert!(diff(&a, &b));
    }

    #[test]
    fn clearing_an_entitlement_is_detected() {
        let a = snap(&[("maxPets", Value::Number(Decimal::from(2)))]);
        let b = snap(&[("maxPets", Value::Null)]);
        assert!(diff(&a, &b));
    }
}
