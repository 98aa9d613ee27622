//! Phase 2: the feature catalog.

use std::collections::BTreeMap;

use crate::document::Doc;
use crate::error::ConfigError;
use crate::expr;
use crate::model::{Feature, FeatureCategory, ValueKind};

use super::{parse_variables, scalar_value};

pub fn parse_features(doc: &Doc) -> Result<BTreeMap<String, Feature>, ConfigError> {
    let raw = doc.get("features").ok_or_else(|| ConfigError::MissingField {
        field: "features".to_string(),
    })?;

    let mut features = BTreeMap::new();
    for (id, node) in raw.as_map("features")? {
        let path = format!("features.{}", id);
        node.as_map(&path)?;
        features.insert(id.clone(), parse_feature(id, node, &path)?);
    }
    Ok(features)
}

fn parse_feature(id: &str, node: &Doc, path: &str) -> Result<Feature, ConfigError> {
    let name = match node.get("name") {
        Some(d) => d.as_str(&format!("{}.name", path))?.to_string(),
        None => id.to_string(),
    };

    let category = parse_category(node, path)?;
    let value_kind = parse_value_kind(node, path)?;

    let default_path = format!("{}.defaultValue", path);
    let default_node = node
        .get("defaultValue")
        .ok_or_else(|| ConfigError::MissingField {
            field: default_path.clone(),
        })?;
    let default_value = scalar_value(default_node, &default_path)?;
    if !default_value.matches_kind(value_kind) {
        return Err(ConfigError::TypeMismatch {
            field: default_path,
            expected: value_kind.name().into(),
            got: default_value.type_name().into(),
        });
    }

    let expression = match node.get("expression") {
        Some(d) => {
            let src = d.as_str(&format!("{}.expression", path))?;
            // Syntax check only: feature formulas are evaluated per request,
            // once the request variables are known.
            expr::parse(src)?;
            Some(src.to_string())
        }
        None => None,
    };

    let variables = parse_variables(node, path)?;
    let tags = parse_tags(node, path)?;

    Ok(Feature {
        id: id.to_string(),
        name,
        category,
        value_kind,
        default_value,
        expression,
        variables,
        tags,
    })
}

fn parse_category(node: &Doc, path: &str) -> Result<FeatureCategory, ConfigError> {
    let field = format!("{}.type", path);
    let literal = node
        .get("type")
        .ok_or_else(|| ConfigError::MissingField { field: field.clone() })?
        .as_str(&field)?;
    FeatureCategory::from_literal(literal).ok_or_else(|| ConfigError::UnknownEnumValue {
        field,
        value: literal.to_string(),
        expected: FeatureCategory::LITERALS,
    })
}

fn parse_value_kind(node: &Doc, path: &str) -> Result<ValueKind, ConfigError> {
    let field = format!("{}.valueType", path);
    let literal = node
        .get("valueType")
        .ok_or_else(|| ConfigError::MissingField { field: field.clone() })?
        .as_str(&field)?;
    ValueKind::from_literal(literal).ok_or_else(|| ConfigError::UnknownEnumValue {
        field,
        value: literal.to_string(),
        expected: ValueKind::LITERALS,
    })
}

fn parse_tags(node: &Doc, path: &str) -> Result<Vec<String>, ConfigError> {
    let field = format!("{}.tags", path);
    match node.get("tags") {
        None => Ok(Vec::new()),
        Some(Doc::Seq(items)) => {
            let mut tags = Vec::with_capacity(items.len());
            for item in items {
                tags.push(item.as_str(&field)?.to_string());
            }
            Ok(tags)
        }
        Some(other) => Err(ConfigError::TypeMismatch {
            field,
            expected: "sequence of strings".into(),
            got: other.kind_name().into(),
        }),
    }
}
