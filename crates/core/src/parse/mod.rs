//! Config parser: fixed-order phases over the canonical document.
//!
//! Phase order: basic attributes, feature catalog, usage limits, plans,
//! add-ons, final non-empty check. The first error within a phase aborts
//! the whole parse; there is never a partially built model.

mod addon;
mod feature;
mod plan;
mod usage_limit;

use std::collections::BTreeMap;

use time::{Date, OffsetDateTime};

use crate::document::Doc;
use crate::error::ConfigError;
use crate::model::{PricingManager, Value};
use crate::version;

/// Run the full pipeline: version resolution, then every parse phase.
pub fn build(doc: Doc) -> Result<PricingManager, ConfigError> {
    let (doc, resolved) = version::resolve(doc)?;

    let basic = basic_attributes(&doc)?;
    let features = feature::parse_features(&doc)?;
    let usage_limits = usage_limit::parse_usage_limits(&doc, &features)?;
    let plans = plan::parse_plans(&doc, &features, &usage_limits)?;
    let add_ons = addon::parse_add_ons(&doc, &features, &usage_limits, &plans)?;

    if plans.is_empty() && add_ons.is_empty() {
        return Err(ConfigError::MissingField {
            field: "plans or addOns".to_string(),
        });
    }

    Ok(PricingManager {
        saas_name: basic.saas_name,
        currency: basic.currency,
        has_annual_payment: basic.has_annual_payment,
        created_at: basic.created_at,
        starts: basic.starts,
        ends: basic.ends,
        version: resolved,
        features,
        usage_limits,
        plans,
        add_ons,
    })
}

struct BasicAttributes {
    saas_name: String,
    currency: String,
    has_annual_payment: bool,
    created_at: Date,
    starts: Option<OffsetDateTime>,
    ends: Option<OffsetDateTime>,
}

fn basic_attributes(doc: &Doc) -> Result<BasicAttributes, ConfigError> {
    let saas_name = require_str(doc, "saasName")?;
    let currency = require_str(doc, "currency")?;

    let has_annual_payment = match doc.get("hasAnnualPayment") {
        Some(d) => d.as_bool("hasAnnualPayment")?,
        None => false,
    };

    let created_at = version::parse_date("createdAt", &require_str(doc, "createdAt")?)?;

    let mut window = [None, None];
    for (slot, field) in window.iter_mut().zip(["starts", "ends"]) {
        if let Some(raw) = doc.get(field) {
            *slot = Some(version::parse_instant(field, raw.as_str(field)?)?);
        }
    }
    let [starts, ends] = window;

    Ok(BasicAttributes {
        saas_name,
        currency,
        has_annual_payment,
        created_at,
        starts,
        ends,
    })
}

fn require_str(doc: &Doc, field: &str) -> Result<String, ConfigError> {
    doc.get(field)
        .ok_or_else(|| ConfigError::MissingField {
            field: field.to_string(),
        })?
        .as_str(field)
        .map(str::to_string)
}

/// Convert a scalar document node into a runtime value. Containers are a
/// type mismatch; `Null` is returned only from `get_raw` call sites.
pub(crate) fn scalar_value(doc: &Doc, field: &str) -> Result<Value, ConfigError> {
    match doc {
        Doc::Null => Ok(Value::Null),
        Doc::Bool(b) => Ok(Value::Bool(*b)),
        Doc::Int(_) | Doc::Float(_) => Ok(Value::Number(doc.as_decimal(field)?)),
        Doc::Str(s) => Ok(Value::Text(s.clone())),
        other => Err(ConfigError::TypeMismatch {
            field: field.to_string(),
            expected: "scalar".into(),
            got: other.kind_name().into(),
        }),
    }
}

/// Parse an optional `variables` mapping declared next to a formula.
pub(crate) fn parse_variables(
    node: &Doc,
    path: &str,
) -> Result<BTreeMap<String, Value>, ConfigError> {
    let mut variables = BTreeMap::new();
    if let Some(raw) = node.get("variables") {
        let field = format!("{}.variables", path);
        for (name, value) in raw.as_map(&field)? {
            let value_path = format!("{}.{}", field, name);
            variables.insert(name.clone(), scalar_value(value, &value_path)?);
        }
    }
    Ok(variables)
}
