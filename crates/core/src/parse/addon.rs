//! Phase 5: add-ons -- same override shape as plans, plus the
//! compatible-plans list.

use std::collections::BTreeMap;

use crate::document::Doc;
use crate::error::ConfigError;
use crate::model::{AddOn, Feature, Plan, UsageLimit};

use super::plan::{parse_feature_overrides, parse_price, parse_usage_limit_overrides};

pub fn parse_add_ons(
    doc: &Doc,
    features: &BTreeMap<String, Feature>,
    usage_limits: &BTreeMap<String, UsageLimit>,
    plans: &BTreeMap<String, Plan>,
) -> Result<BTreeMap<String, AddOn>, ConfigError> {
    let raw = match doc.get("addOns") {
        Some(d) => d,
        None => return Ok(BTreeMap::new()),
    };

    let mut add_ons = BTreeMap::new();
    for (name, node) in raw.as_map("addOns")? {
        let path = format!("addOns.{}", name);
        node.as_map(&path)?;
        add_ons.insert(
            name.clone(),
            parse_add_on(name, node, &path, features, usage_limits, plans)?,
        );
    }
    Ok(add_ons)
}

fn parse_add_on(
    name: &str,
    node: &Doc,
    path: &str,
    features: &BTreeMap<String, Feature>,
    usage_limits: &BTreeMap<String, UsageLimit>,
    plans: &BTreeMap<String, Plan>,
) -> Result<AddOn, ConfigError> {
    let price = parse_price(node, path)?;

    // Absent `availableFor` means the add-on combines with every plan.
    let mut available_for = Vec::new();
    if let Some(raw) = node.get("availableFor") {
        let field = format!("{}.availableFor", path);
        for item in raw.as_seq(&field)? {
            let plan_name = item.as_str(&field)?;
            if !plans.contains_key(plan_name) {
                return Err(ConfigError::UnresolvedReference {
                    referrer: format!("add-on '{}'", name),
                    target_kind: "plan",
                    id: plan_name.to_string(),
                });
            }
            available_for.push(plan_name.to_string());
        }
    }

    let referrer = format!("add-on '{}'", name);
    let feature_overrides = parse_feature_overrides(node, path, &referrer, features)?;
    let usage_limit_overrides = parse_usage_limit_overrides(node, path, &referrer, usage_limits)?;

    Ok(AddOn {
        name: name.to_string(),
        price,
        available_for,
        feature_overrides,
        usage_limit_overrides,
    })
}
