//! Phase 3: usage limits, with linked-feature resolution against the
//! feature catalog.

use std::collections::BTreeMap;

use crate::document::Doc;
use crate::error::ConfigError;
use crate::model::{Feature, LimitKind, UsageLimit, Value};

use super::scalar_value;

pub fn parse_usage_limits(
    doc: &Doc,
    features: &BTreeMap<String, Feature>,
) -> Result<BTreeMap<String, UsageLimit>, ConfigError> {
    let raw = match doc.get("usageLimits") {
        Some(d) => d,
        None => return Ok(BTreeMap::new()),
    };

    let mut limits = BTreeMap::new();
    for (id, node) in raw.as_map("usageLimits")? {
        let path = format!("usageLimits.{}", id);
        node.as_map(&path)?;
        limits.insert(id.clone(), parse_limit(id, node, &path, features)?);
    }
    Ok(limits)
}

fn parse_limit(
    id: &str,
    node: &Doc,
    path: &str,
    features: &BTreeMap<String, Feature>,
) -> Result<UsageLimit, ConfigError> {
    let name = match node.get("name") {
        Some(d) => d.as_str(&format!("{}.name", path))?.to_string(),
        None => id.to_string(),
    };

    let kind_field = format!("{}.type", path);
    let literal = node
        .get("type")
        .ok_or_else(|| ConfigError::MissingField {
            field: kind_field.clone(),
        })?
        .as_str(&kind_field)?;
    let kind = LimitKind::from_literal(literal).ok_or_else(|| ConfigError::UnknownEnumValue {
        field: kind_field,
        value: literal.to_string(),
        expected: LimitKind::LITERALS,
    })?;

    let unit_field = format!("{}.unit", path);
    let unit = node
        .get("unit")
        .ok_or_else(|| ConfigError::MissingField {
            field: unit_field.clone(),
        })?
        .as_str(&unit_field)?
        .to_string();

    let default_path = format!("{}.defaultValue", path);
    let default_node = node
        .get("defaultValue")
        .ok_or_else(|| ConfigError::MissingField {
            field: default_path.clone(),
        })?;
    let default_value = scalar_value(default_node, &default_path)?;
    if !matches!(default_value, Value::Number(_) | Value::Bool(_)) {
        return Err(ConfigError::TypeMismatch {
            field: default_path,
            expected: "Numeric or Bool".into(),
            got: default_value.type_name().into(),
        });
    }

    let mut linked_features = Vec::new();
    if let Some(raw) = node.get("linkedFeatures") {
        let field = format!("{}.linkedFeatures", path);
        for item in raw.as_seq(&field)? {
            let feature_id = item.as_str(&field)?;
            if !features.contains_key(feature_id) {
                return Err(ConfigError::UnresolvedReference {
                    referrer: format!("usage limit '{}'", id),
                    target_kind: "feature",
                    id: feature_id.to_string(),
                });
            }
            linked_features.push(feature_id.to_string());
        }
    }

    Ok(UsageLimit {
        id: id.to_string(),
        name,
        kind,
        unit,
        default_value,
        linked_features,
    })
}
