//! Entitlement resolution: effective feature and usage-limit values for a
//! (plan, active add-ons) combination.
//!
//! Precedence per catalog id: add-on override, else plan override, else
//! catalog default. When the default is chosen and the feature declares a
//! formula, the formula is resolved here with the request variables
//! shadowing the feature's declared ones.

use std::collections::BTreeMap;

use tierkit_core::{expr, AddOn, Plan, PricingManager, Value};

use crate::error::EvalError;

/// Resolved effective values for one (plan, add-ons) request. Ephemeral:
/// computed per request, never persisted by the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    entries: BTreeMap<String, Value>,
}

impl Snapshot {
    /// Effective value for an id, if the id exists in the catalog.
    pub fn get(&self, id: &str) -> Option<&Value> {
        self.entries.get(id)
    }

    /// Fail-closed lookup: an id absent from the catalog is an error,
    /// never a silent default.
    pub fn require(&self, id: &str) -> Result<&Value, EvalError> {
        self.entries.get(id).ok_or_else(|| EvalError::UnknownEntitlement {
            id: id.to_string(),
        })
    }

    /// All (id, effective value) entries, in id order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Compute the entitlement snapshot for `plan_id` with the given active
/// add-ons and request variables.
pub fn evaluate_entitlement(
    manager: &PricingManager,
    plan_id: &str,
    active_add_ons: &[String],
    variables: &BTreeMap<String, Value>,
) -> Result<Snapshot, EvalError> {
    let plan = manager
        .plans
        .get(plan_id)
        .ok_or_else(|| EvalError::UnknownPlan {
            name: plan_id.to_string(),
        })?;
    let add_ons = resolve_add_ons(manager, plan, active_add_ons)?;

    let mut entries = BTreeMap::new();

    for (id, feature) in &manager.features {
        let effective = match override_for(&add_ons, plan, id, false) {
            Some(v) => v.clone(),
            None => match &feature.expression {
                Some(expression) => {
                    // Declared variables first, request variables shadow.
                    let mut merged = feature.variables.clone();
                    merged.extend(variables.iter().map(|(k, v)| (k.clone(), v.clone())));
                    let value = expr::evaluate(expression, &merged)?;
                    if !value.matches_kind(feature.value_kind) {
                        return Err(EvalError::ResultType {
                            id: id.clone(),
                            expected: feature.value_kind.name(),
                            got: value.type_name(),
                        });
                    }
                    value
                }
                None => feature.default_value.clone(),
            },
        };
        entries.insert(id.clone(), effective);
    }

    for (id, limit) in &manager.usage_limits {
        let effective = override_for(&add_ons, plan, id, true)
            .cloned()
            .unwrap_or_else(|| limit.default_value.clone());
        entries.insert(id.clone(), effective);
    }

    Ok(Snapshot { entries })
}

/// Look up the active add-ons, checking existence and plan compatibility,
/// and return them in sorted-name order so that multi-add-on override
/// precedence is deterministic regardless of caller order.
fn resolve_add_ons<'a>(
    manager: &'a PricingManager,
    plan: &Plan,
    active: &[String],
) -> Result<Vec<&'a AddOn>, EvalError> {
    let mut add_ons = Vec::with_capacity(active.len());
    for name in active {
        let add_on = manager
            .add_ons
            .get(name)
            .ok_or_else(|| EvalError::UnknownAddOn { name: name.clone() })?;
        if !add_on.is_available_for(&plan.name) {
            return Err(EvalError::IncompatibleAddOn {
                add_on: name.clone(),
                plan: plan.name.clone(),
            });
        }
        add_ons.push(add_on);
    }
    add_ons.sort_by(|a, b| a.name.cmp(&b.name));
    add_ons.dedup_by(|a, b| a.name == b.name);
    Ok(add_ons)
}

/// Override precedence for one id: the last add-on (in sorted order)
/// declaring an override wins, else the plan override.
fn override_for<'a>(
    add_ons: &[&'a AddOn],
    plan: &'a Plan,
    id: &str,
    usage_limit: bool,
) -> Option<&'a Value> {
    let pick = |overrides: &'a BTreeMap<String, Value>| overrides.get(id);
    let from_add_ons = add_ons
        .iter()
        .rev()
        .find_map(|a| {
            pick(if usage_limit {
                &a.usage_limit_overrides
            } else {
                &a.feature_overrides
            })
        });
    from_add_ons.or_else(|| {
        pick(if usage_limit {
            &plan.usage_limit_overrides
        } else {
            &plan.feature_overrides
        })
    })
}

#[cfg(test)]
pub(crate) fn snapshot_from_entries(entries: BTreeMap<String, Value>) -> Snapshot {
    Snapshot { entries }
}
