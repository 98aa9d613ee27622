//! Phase 4: plans -- price resolution and sparse catalog overrides.

use std::collections::BTreeMap;

use crate::document::Doc;
use crate::error::ConfigError;
use crate::expr;
use crate::model::{Feature, Plan, Price, UsageLimit, Value};

use super::{parse_variables, scalar_value};

const DEFAULT_UNIT: &str = "user/month";

pub fn parse_plans(
    doc: &Doc,
    features: &BTreeMap<String, Feature>,
    usage_limits: &BTreeMap<String, UsageLimit>,
) -> Result<BTreeMap<String, Plan>, ConfigError> {
    let raw = match doc.get("plans") {
        Some(d) => d,
        None => return Ok(BTreeMap::new()),
    };

    let mut plans = BTreeMap::new();
    for (name, node) in raw.as_map("plans")? {
        let path = format!("plans.{}", name);
        node.as_map(&path)?;
        plans.insert(
            name.clone(),
            parse_plan(name, node, &path, features, usage_limits)?,
        );
    }
    Ok(plans)
}

fn parse_plan(
    name: &str,
    node: &Doc,
    path: &str,
    features: &BTreeMap<String, Feature>,
    usage_limits: &BTreeMap<String, UsageLimit>,
) -> Result<Plan, ConfigError> {
    let description = match node.get("description") {
        Some(d) => Some(d.as_str(&format!("{}.description", path))?.to_string()),
        None => None,
    };

    let price = parse_price(node, path)?;

    let unit = match node.get("unit") {
        Some(d) => d.as_str(&format!("{}.unit", path))?.to_string(),
        None => DEFAULT_UNIT.to_string(),
    };

    let private = match node.get("private") {
        Some(d) => d.as_bool(&format!("{}.private", path))?,
        None => false,
    };

    let referrer = format!("plan '{}'", name);
    let feature_overrides = parse_feature_overrides(node, path, &referrer, features)?;
    let usage_limit_overrides = parse_usage_limit_overrides(node, path, &referrer, usage_limits)?;

    Ok(Plan {
        name: name.to_string(),
        description,
        price,
        unit,
        private,
        feature_overrides,
        usage_limit_overrides,
    })
}

/// Price is a literal number, a formula string plus declared variables,
/// or absent. Formulas are resolved here, at parse time, so a bad price
/// expression fails the parse instead of a later request.
pub(super) fn parse_price(node: &Doc, path: &str) -> Result<Price, ConfigError> {
    let field = format!("{}.price", path);
    match node.get("price") {
        None => Ok(Price::None),
        Some(d @ (Doc::Int(_) | Doc::Float(_))) => Ok(Price::Amount(d.as_decimal(&field)?)),
        Some(Doc::Str(expression)) => {
            let variables = parse_variables(node, path)?;
            let amount = match expr::evaluate(expression, &variables)? {
                Value::Number(d) => d,
                other => {
                    return Err(ConfigError::TypeMismatch {
                        field,
                        expected: "Numeric".into(),
                        got: other.type_name().into(),
                    })
                }
            };
            Ok(Price::Formula {
                expression: expression.clone(),
                variables,
                amount,
            })
        }
        Some(other) => Err(ConfigError::TypeMismatch {
            field,
            expected: "number or formula string".into(),
            got: other.kind_name().into(),
        }),
    }
}

/// Sparse `features` override block: each entry names a catalog feature
/// and an optional `value`. An entry without a `value` key contributes no
/// override; an explicit `value: null` clears the entitlement.
pub(super) fn parse_feature_overrides(
    node: &Doc,
    path: &str,
    referrer: &str,
    features: &BTreeMap<String, Feature>,
) -> Result<BTreeMap<String, Value>, ConfigError> {
    let raw = match node.get("features") {
        Some(d) => d,
        None => return Ok(BTreeMap::new()),
    };
    let block = format!("{}.features", path);

    let mut overrides = BTreeMap::new();
    for (id, entry) in raw.as_map(&block)? {
        let feature = features
            .get(id)
            .ok_or_else(|| ConfigError::UnresolvedReference {
                referrer: referrer.to_string(),
                target_kind: "feature",
                id: id.clone(),
            })?;

        let entry_path = format!("{}.{}", block, id);
        entry.as_map(&entry_path)?;
        if let Some(raw_value) = entry.get_raw("value") {
            let value_path = format!("{}.value", entry_path);
            let value = scalar_value(raw_value, &value_path)?;
            if !value.matches_kind(feature.value_kind) {
                return Err(ConfigError::TypeMismatch {
                    field: value_path,
                    expected: feature.value_kind.name().into(),
                    got: value.type_name().into(),
                });
            }
            overrides.insert(id.clone(), value);
        }
    }
    Ok(overrides)
}

/// Sparse `usageLimits` override block, same shape as feature overrides.
pub(super) fn parse_usage_limit_overrides(
    node: &Doc,
    path: &str,
    referrer: &str,
    usage_limits: &BTreeMap<String, UsageLimit>,
) -> Result<BTreeMap<String, Value>, ConfigError> {
    let raw = match node.get("usageLimits") {
        Some(d) => d,
        None => return Ok(BTreeMap::new()),
    };
    let block = format!("{}.usageLimits", path);

    let mut overrides = BTreeMap::new();
    for (id, entry) in raw.as_map(&block)? {
        let limit = usage_limits
            .get(id)
            .ok_or_else(|| ConfigError::UnresolvedReference {
                referrer: referrer.to_string(),
                target_kind: "usage limit",
                id: id.clone(),
            })?;

        let entry_path = format!("{}.{}", block, id);
        entry.as_map(&entry_path)?;
        if let Some(raw_value) = entry.get_raw("value") {
            let value_path = format!("{}.value", entry_path);
            let value = scalar_value(raw_value, &value_path)?;
            if !matches!(value, Value::Null)
                && value.type_name() != limit.default_value.type_name()
            {
                return Err(ConfigError::TypeMismatch {
                    field: value_path,
                    expected: limit.default_value.type_name().into(),
                    got: value.type_name().into(),
                });
            }
            overrides.insert(id.clone(), value);
        }
    }
    Ok(overrides)
}
