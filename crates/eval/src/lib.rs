//! tierkit-eval: entitlement evaluation over a parsed pricing model.
//!
//! Consumes an immutable [`PricingManager`](tierkit_core::PricingManager)
//! and answers "what is this user entitled to under plan P with add-ons
//! A". Pure computation, no I/O, safe to call concurrently from many
//! requests over a shared manager.
//!
//! Evaluation-time failures ([`EvalError`]) are a separate channel from
//! the parse-time [`ConfigError`](tierkit_core::ConfigError) taxonomy.

pub mod entitlement;
pub mod error;
pub mod snapshot;

pub use entitlement::{evaluate_entitlement, Snapshot};
pub use error::EvalError;
pub use snapshot::{diff, serialize};
