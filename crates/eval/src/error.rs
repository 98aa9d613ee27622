//! Evaluation-time error channel.
//!
//! Deliberately distinct from `tierkit_core::ConfigError`: "this config
//! is malformed" and "this request cannot be answered" are never
//! conflated. Authorization callers are expected to fail closed on every
//! variant here.

use tierkit_core::ExprError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    /// The requested plan does not exist in the pricing model.
    #[error("unknown plan '{name}'")]
    UnknownPlan { name: String },

    /// An active add-on does not exist in the pricing model.
    #[error("unknown add-on '{name}'")]
    UnknownAddOn { name: String },

    /// An active add-on is not compatible with the requested plan.
    #[error("add-on '{add_on}' is not available for plan '{plan}'")]
    IncompatibleAddOn { add_on: String, plan: String },

    /// A looked-up id is absent from the catalog. Distinct from "present
    /// but disabled/zero": callers must treat this as unknown capability.
    #[error("unknown entitlement '{id}'")]
    UnknownEntitlement { id: String },

    /// A feature expression produced a value of the wrong kind.
    #[error("expression for '{id}' produced {got}, expected {expected}")]
    ResultType {
        id: String,
        expected: &'static str,
        got: &'static str,
    },

    /// A formula failed during request-time resolution.
    #[error(transparent)]
    Expression(#[from] ExprError),
}
