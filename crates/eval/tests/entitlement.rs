//! Entitlement engine integration tests: parse a document, evaluate
//! snapshots, and exercise the serializer/differ contract.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tierkit_core::{parse, Doc, Value};
use tierkit_eval::{diff, evaluate_entitlement, serialize, EvalError};

fn manager() -> tierkit_core::PricingManager {
    parse(Doc::from_json(serde_json::json!({
        "version": "2.0",
        "saasName": "petclinic",
        "currency": "EUR",
        "createdAt": "2024-08-30",
        "features": {
            "haveCalendar": {
                "type": "CAPABILITY",
                "valueType": "BOOLEAN",
                "defaultValue": false
            },
            "maxSeats": {
                "type": "INFORMATION",
                "valueType": "NUMERIC",
                "defaultValue": 1,
                "expression": "users * 2",
                "variables": { "users": 5 }
            },
            "supportTier": {
                "type": "SUPPORT",
                "valueType": "TEXT",
                "defaultValue": "community"
            }
        },
        "usageLimits": {
            "maxVisits": {
                "type": "RENEWABLE",
                "unit": "visit/month",
                "defaultValue": 10
            }
        },
        "plans": {
            "BASIC": {
                "price": 0
            },
            "PRO": {
                "price": 15.99,
                "features": {
                    "haveCalendar": { "value": true },
                    "supportTier": { "value": "priority" }
                },
                "usageLimits": {
                    "maxVisits": { "value": 40 }
                }
            }
        },
        "addOns": {
            "calendarPack": {
                "price": 2.5,
                "availableFor": ["BASIC"],
                "features": {
                    "haveCalendar": { "value": true }
                }
            },
            "visitBoost": {
                "price": 5,
                "usageLimits": {
                    "maxVisits": { "value": 100 }
                }
            }
        }
    })))
    .unwrap()
}

fn no_vars() -> BTreeMap<String, Value> {
    BTreeMap::new()
}

#[test]
fn basic_plan_without_overrides_uses_catalog_defaults() {
    let pm = manager();
    let snap = evaluate_entitlement(&pm, "BASIC", &[], &no_vars()).unwrap();
    assert_eq!(snap.require("haveCalendar").unwrap(), &Value::Bool(false));
    assert_eq!(snap.require("maxVisits").unwrap(), &Value::Number(Decimal::from(10)));
}

#[test]
fn feature_formula_resolves_with_declared_variables() {
    let pm = manager();
    let snap = evaluate_entitlement(&pm, "BASIC", &[], &no_vars()).unwrap();
    assert_eq!(snap.require("maxSeats").unwrap(), &Value::Number(Decimal::from(10)));
}

#[test]
fn request_variables_shadow_declared_ones() {
    let pm = manager();
    let vars: BTreeMap<String, Value> =
        [("users".to_string(), Value::Number(Decimal::from(7)))].into();
    let snap = evaluate_entitlement(&pm, "BASIC", &[], &vars).unwrap();
    assert_eq!(snap.require("maxSeats").unwrap(), &Value::Number(Decimal::from(14)));
}

#[test]
fn text_request_variable_in_arithmetic_is_an_expression_error() {
    let pm = manager();
    let vars: BTreeMap<String, Value> =
        [("users".to_string(), Value::Text("ten".into()))].into();
    let err = evaluate_entitlement(&pm, "BASIC", &[], &vars).unwrap_err();
    assert_eq!(
        err.to_string(),
        "operator '*' is not supported between Text and Numeric"
    );
}

#[test]
fn plan_override_beats_default_and_add_on_beats_plan() {
    let pm = manager();

    let pro = evaluate_entitlement(&pm, "PRO", &[], &no_vars()).unwrap();
    assert_eq!(pro.require("maxVisits").unwrap(), &Value::Number(Decimal::from(40)));

    let boosted = evaluate_entitlement(
        &pm,
        "PRO",
        &["visitBoost".to_string()],
        &no_vars(),
    )
    .unwrap();
    assert_eq!(
        boosted.require("maxVisits").unwrap(),
        &Value::Number(Decimal::from(100))
    );
}

#[test]
fn unknown_plan_and_add_on_are_distinct_errors() {
    let pm = manager();
    assert_eq!(
        evaluate_entitlement(&pm, "ENTERPRISE", &[], &no_vars()).unwrap_err(),
        EvalError::UnknownPlan { name: "ENTERPRISE".into() }
    );
    assert_eq!(
        evaluate_entitlement(&pm, "BASIC", &["turbo".to_string()], &no_vars()).unwrap_err(),
        EvalError::UnknownAddOn { name: "turbo".into() }
    );
}

#[test]
fn incompatible_add_on_is_rejected() {
    let pm = manager();
    let err = evaluate_entitlement(
        &pm,
        "PRO",
        &["calendarPack".to_string()],
        &no_vars(),
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "add-on 'calendarPack' is not available for plan 'PRO'"
    );
}

#[test]
fn unknown_entitlement_lookup_fails_closed() {
    let pm = manager();
    let snap = evaluate_entitlement(&pm, "BASIC", &[], &no_vars()).unwrap();
    assert_eq!(
        snap.require("nonExistentFeature").unwrap_err(),
        EvalError::UnknownEntitlement { id: "nonExistentFeature".into() }
    );
    // Present-but-disabled is a value, not an error.
    assert_eq!(snap.require("haveCalendar").unwrap(), &Value::Bool(false));
}

#[test]
fn evaluation_is_deterministic_in_snapshots_and_bytes() {
    let pm = manager();
    let a = evaluate_entitlement(&pm, "PRO", &["visitBoost".to_string()], &no_vars()).unwrap();
    let b = evaluate_entitlement(&pm, "PRO", &["visitBoost".to_string()], &no_vars()).unwrap();
    assert_eq!(a, b);
    assert_eq!(serialize(&a), serialize(&b));
    assert!(!diff(&a, &b));
}

#[test]
fn snapshot_covers_the_whole_catalog() {
    let pm = manager();
    let snap = evaluate_entitlement(&pm, "BASIC", &[], &no_vars()).unwrap();
    assert_eq!(snap.len(), pm.features.len() + pm.usage_limits.len());
}

#[test]
fn changed_plan_changes_the_diff() {
    let pm = manager();
    let basic = evaluate_entitlement(&pm, "BASIC", &[], &no_vars()).unwrap();
    let pro = evaluate_entitlement(&pm, "PRO", &[], &no_vars()).unwrap();
    assert!(diff(&basic, &pro));
}

#[test]
fn serialized_snapshot_is_compact_ordered_json() {
    let pm = manager();
    let snap = evaluate_entitlement(&pm, "PRO", &[], &no_vars()).unwrap();
    let bytes = serialize(&snap);
    let text = String::from_utf8(bytes).unwrap();
    assert_eq!(
        text,
        r#"{"haveCalendar":true,"maxSeats":"10","maxVisits":"40","supportTier":"priority"}"#
    );
}
