//! Typed pricing model. Built once per parse, never mutated in place;
//! any configuration change produces a new `PricingManager`.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;
use time::{Date, OffsetDateTime};

/// Ordered schema version pair. Comparison is the derived lexicographic
/// total order on (major, minor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

impl Version {
    pub const V1_0: Version = Version { major: 1, minor: 0 };
    pub const V1_1: Version = Version { major: 1, minor: 1 };
    pub const V2_0: Version = Version { major: 2, minor: 0 };

    /// Oldest schema version still accepted; documents without a version
    /// tag default to this.
    pub const OLDEST: Version = Version::V1_0;
    /// Canonical version every supported document is migrated to.
    pub const CANONICAL: Version = Version::V2_0;

    pub const SUPPORTED: [Version; 3] = [Version::V1_0, Version::V1_1, Version::V2_0];
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Feature category. Closed set, matched exhaustively at every site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FeatureCategory {
    Capability,
    Automation,
    Guarantee,
    Support,
    Payment,
    Information,
}

impl FeatureCategory {
    pub const LITERALS: &'static str =
        "CAPABILITY, AUTOMATION, GUARANTEE, SUPPORT, PAYMENT, INFORMATION";

    pub fn from_literal(s: &str) -> Option<FeatureCategory> {
        match s {
            "CAPABILITY" => Some(FeatureCategory::Capability),
            "AUTOMATION" => Some(FeatureCategory::Automation),
            "GUARANTEE" => Some(FeatureCategory::Guarantee),
            "SUPPORT" => Some(FeatureCategory::Support),
            "PAYMENT" => Some(FeatureCategory::Payment),
            "INFORMATION" => Some(FeatureCategory::Information),
            _ => None,
        }
    }
}

/// Primitive kind of a feature value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValueKind {
    Boolean,
    Numeric,
    Text,
}

impl ValueKind {
    pub const LITERALS: &'static str = "BOOLEAN, NUMERIC, TEXT";

    pub fn from_literal(s: &str) -> Option<ValueKind> {
        match s {
            "BOOLEAN" => Some(ValueKind::Boolean),
            "NUMERIC" => Some(ValueKind::Numeric),
            "TEXT" => Some(ValueKind::Text),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Boolean => "Bool",
            ValueKind::Numeric => "Numeric",
            ValueKind::Text => "Text",
        }
    }
}

/// Usage-limit kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LimitKind {
    Renewable,
    NonRenewable,
    ResponseDriven,
    TimeDriven,
}

impl LimitKind {
    pub const LITERALS: &'static str =
        "RENEWABLE, NON_RENEWABLE, RESPONSE_DRIVEN, TIME_DRIVEN";

    pub fn from_literal(s: &str) -> Option<LimitKind> {
        match s {
            "RENEWABLE" => Some(LimitKind::Renewable),
            "NON_RENEWABLE" => Some(LimitKind::NonRenewable),
            "RESPONSE_DRIVEN" => Some(LimitKind::ResponseDriven),
            "TIME_DRIVEN" => Some(LimitKind::TimeDriven),
            _ => None,
        }
    }
}

/// Runtime value of a feature, usage limit, override, or formula variable.
/// All numerics are `Decimal`; `Null` means "explicitly cleared".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Decimal),
    Text(String),
}

impl Value {
    /// Human-readable type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Number(_) => "Numeric",
            Value::Text(_) => "Text",
        }
    }

    /// Whether this value is a legal instance of the given kind.
    /// `Null` matches every kind.
    pub fn matches_kind(&self, kind: ValueKind) -> bool {
        matches!(
            (self, kind),
            (Value::Null, _)
                | (Value::Bool(_), ValueKind::Boolean)
                | (Value::Number(_), ValueKind::Numeric)
                | (Value::Text(_), ValueKind::Text)
        )
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(d) => write!(f, "{}", d.normalize()),
            Value::Text(t) => write!(f, "{}", t),
        }
    }
}

/// A catalog feature: a capability attribute with a catalog-wide default
/// and optional per-plan/add-on overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: String,
    pub name: String,
    pub category: FeatureCategory,
    pub value_kind: ValueKind,
    pub default_value: Value,
    /// Optional formula resolving the effective value at request time.
    pub expression: Option<String>,
    /// Variables declared alongside the expression; request-supplied
    /// variables shadow these.
    pub variables: BTreeMap<String, Value>,
    pub tags: Vec<String>,
}

/// A catalog usage limit: a numeric/boolean ceiling with the same
/// catalog/override structure as a feature.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageLimit {
    pub id: String,
    pub name: String,
    pub kind: LimitKind,
    pub unit: String,
    pub default_value: Value,
    /// Feature ids this limit constrains; each must exist in the catalog.
    pub linked_features: Vec<String>,
}

/// Plan or add-on price.
#[derive(Debug, Clone, PartialEq)]
pub enum Price {
    /// No price declared.
    None,
    /// Literal amount.
    Amount(Decimal),
    /// Formula with its declared variables; `amount` is the value the
    /// formula resolved to at parse time.
    Formula {
        expression: String,
        variables: BTreeMap<String, Value>,
        amount: Decimal,
    },
}

impl Price {
    pub fn amount(&self) -> Option<Decimal> {
        match self {
            Price::None => None,
            Price::Amount(a) => Some(*a),
            Price::Formula { amount, .. } => Some(*amount),
        }
    }
}

/// A named pricing tier bundling overrides and a price.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    /// Billing unit, e.g. "user/month".
    pub unit: String,
    pub private: bool,
    pub feature_overrides: BTreeMap<String, Value>,
    pub usage_limit_overrides: BTreeMap<String, Value>,
}

/// An optional purchasable bundle of overrides; its overrides take
/// precedence over plan-level ones when active.
#[derive(Debug, Clone, PartialEq)]
pub struct AddOn {
    pub name: String,
    pub price: Price,
    /// Plan names this add-on may be combined with. Empty means every plan.
    pub available_for: Vec<String>,
    pub feature_overrides: BTreeMap<String, Value>,
    pub usage_limit_overrides: BTreeMap<String, Value>,
}

impl AddOn {
    pub fn is_available_for(&self, plan: &str) -> bool {
        self.available_for.is_empty() || self.available_for.iter().any(|p| p == plan)
    }
}

/// Root of the parsed pricing model. Immutable post-construction; safe to
/// share across concurrent evaluators without coordination.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingManager {
    pub saas_name: String,
    pub currency: String,
    pub has_annual_payment: bool,
    pub created_at: Date,
    pub starts: Option<OffsetDateTime>,
    pub ends: Option<OffsetDateTime>,
    pub version: Version,
    pub features: BTreeMap<String, Feature>,
    pub usage_limits: BTreeMap<String, UsageLimit>,
    pub plans: BTreeMap<String, Plan>,
    pub add_ons: BTreeMap<String, AddOn>,
}
