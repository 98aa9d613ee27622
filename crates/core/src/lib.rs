//! tierkit-core: pricing configuration core library.
//!
//! Turns a decoded generic document tree describing a SaaS monetization
//! model (plans, add-ons, features, usage limits, formula prices) into an
//! immutable, invariant-checked [`PricingManager`].
//!
//! Pipeline: schema version resolution and migration to the canonical
//! version, then fixed-order parse phases. All operations are synchronous
//! pure computations over immutable inputs; the core performs no I/O and
//! holds no shared mutable state, so a parsed manager may be evaluated
//! concurrently without coordination.
//!
//! # Public API
//!
//! - [`parse()`] -- full pipeline, document tree to [`PricingManager`]
//! - [`Doc`] -- the tagged document tree the core consumes
//! - [`expr`] -- the restricted price-expression evaluator
//! - [`ConfigError`] / [`VersionError`] -- the parse-time error channel

pub mod document;
pub mod error;
pub mod expr;
pub mod model;
pub mod parse;
pub mod version;

pub use document::Doc;
pub use error::{ConfigError, VersionError};
pub use expr::ExprError;
pub use model::{
    AddOn, Feature, FeatureCategory, LimitKind, Plan, Price, PricingManager, UsageLimit, Value,
    ValueKind, Version,
};

/// Parse a decoded document into a [`PricingManager`], migrating legacy
/// schema versions to the canonical version first.
pub fn parse(doc: Doc) -> Result<PricingManager, ConfigError> {
    parse::build(doc)
}
