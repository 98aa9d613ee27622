//! Parse-time error taxonomy.
//!
//! Message wording is part of the crate contract: the test suites assert
//! exact strings, and collaborators surface them verbatim to config
//! authors. Evaluation-time failures live in `tierkit-eval` and are a
//! separate channel, never folded into `ConfigError`.

use crate::expr::ExprError;

/// All errors the parse pipeline can produce. The first error within a
/// phase aborts the whole parse; there is no partial model and no
/// aggregated multi-error report.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A key holds the wrong container kind (mapping vs sequence vs scalar).
    #[error("'{field}' must be a {expected}, got {got}")]
    Structure {
        field: String,
        expected: &'static str,
        got: &'static str,
    },

    /// A mandatory key is absent (or explicitly null).
    #[error("missing required field '{field}'")]
    MissingField { field: String },

    /// A scalar has the wrong primitive type for its field.
    #[error("type mismatch for '{field}': expected {expected}, got {got}")]
    TypeMismatch {
        field: String,
        expected: String,
        got: String,
    },

    /// A literal is not a member of a closed enumeration.
    #[error("unknown value '{value}' for '{field}': expected one of {expected}")]
    UnknownEnumValue {
        field: String,
        value: String,
        expected: &'static str,
    },

    /// An override or link names an id absent from the catalog.
    #[error("{referrer} references unknown {target_kind} '{id}'")]
    UnresolvedReference {
        referrer: String,
        target_kind: &'static str,
        id: String,
    },

    /// Malformed or unsupported schema version, or mixed-generation fields.
    #[error(transparent)]
    Version(#[from] VersionError),

    /// A price formula failed to parse or evaluate during the plan phase.
    #[error(transparent)]
    Expression(#[from] ExprError),
}

/// Errors from the schema version resolver and migration ladder.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VersionError {
    #[error("invalid version tag '{tag}': expected 'major.minor' with non-negative integers")]
    Malformed { tag: String },

    #[error("unsupported version '{tag}': supported versions are 1.0, 1.1, 2.0")]
    Unsupported { tag: String },

    /// A document declares one schema generation but carries a field
    /// belonging to another.
    #[error("mixed version fields: a {version} document must not contain '{field}'")]
    MixedFields { version: String, field: String },

    #[error("invalid value for '{field}': expected a positive integer")]
    InvalidDatePart { field: String },

    #[error("invalid date '{value}' for '{field}': expected YYYY-MM-DD")]
    InvalidDate { field: String, value: String },

    #[error("invalid instant '{value}' for '{field}': expected an RFC 3339 timestamp or YYYY-MM-DD")]
    InvalidInstant { field: String, value: String },
}
