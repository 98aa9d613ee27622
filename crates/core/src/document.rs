//! Generic document tree consumed by the parser.
//!
//! The core is agnostic to the original encoding: YAML, JSON, or an
//! in-memory map are all decoded into `Doc` before they reach us. Every
//! accessor returns a `Result` instead of panicking on shape mismatch.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::error::ConfigError;

/// A decoded configuration document node.
#[derive(Debug, Clone, PartialEq)]
pub enum Doc {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Seq(Vec<Doc>),
    Map(BTreeMap<String, Doc>),
}

impl Doc {
    /// Returns a human-readable kind name for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Doc::Null => "null",
            Doc::Bool(_) => "boolean",
            Doc::Int(_) | Doc::Float(_) => "number",
            Doc::Str(_) => "string",
            Doc::Seq(_) => "sequence",
            Doc::Map(_) => "mapping",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Doc::Null)
    }

    /// Child lookup on a mapping node. Absent keys and explicit nulls are
    /// both `None`; callers that require the key report `MissingField`.
    pub fn get(&self, key: &str) -> Option<&Doc> {
        self.get_raw(key).filter(|d| !d.is_null())
    }

    /// Child lookup that preserves explicit nulls, for the few places
    /// where `key: null` and an absent key mean different things
    /// (override values).
    pub fn get_raw(&self, key: &str) -> Option<&Doc> {
        match self {
            Doc::Map(m) => m.get(key),
            _ => None,
        }
    }

    pub fn as_map(&self, field: &str) -> Result<&BTreeMap<String, Doc>, ConfigError> {
        match self {
            Doc::Map(m) => Ok(m),
            other => Err(ConfigError::Structure {
                field: field.to_string(),
                expected: "mapping",
                got: other.kind_name(),
            }),
        }
    }

    pub fn as_seq(&self, field: &str) -> Result<&[Doc], ConfigError> {
        match self {
            Doc::Seq(s) => Ok(s),
            other => Err(ConfigError::Structure {
                field: field.to_string(),
                expected: "sequence",
                got: other.kind_name(),
            }),
        }
    }

    pub fn as_str(&self, field: &str) -> Result<&str, ConfigError> {
        match self {
            Doc::Str(s) => Ok(s),
            other => Err(ConfigError::TypeMismatch {
                field: field.to_string(),
                expected: "string".into(),
                got: other.kind_name().into(),
            }),
        }
    }

    pub fn as_bool(&self, field: &str) -> Result<bool, ConfigError> {
        match self {
            Doc::Bool(b) => Ok(*b),
            other => Err(ConfigError::TypeMismatch {
                field: field.to_string(),
                expected: "boolean".into(),
                got: other.kind_name().into(),
            }),
        }
    }

    pub fn as_int(&self, field: &str) -> Result<i64, ConfigError> {
        match self {
            Doc::Int(i) => Ok(*i),
            other => Err(ConfigError::TypeMismatch {
                field: field.to_string(),
                expected: "integer".into(),
                got: other.kind_name().into(),
            }),
        }
    }

    /// Accepts both integer and float scalars; all downstream arithmetic
    /// runs on `Decimal`.
    pub fn as_decimal(&self, field: &str) -> Result<Decimal, ConfigError> {
        match self {
            Doc::Int(i) => Ok(Decimal::from(*i)),
            Doc::Float(f) => Decimal::try_from(*f).map_err(|_| ConfigError::TypeMismatch {
                field: field.to_string(),
                expected: "number".into(),
                got: "non-finite number".into(),
            }),
            other => Err(ConfigError::TypeMismatch {
                field: field.to_string(),
                expected: "number".into(),
                got: other.kind_name().into(),
            }),
        }
    }

    /// Converts a decoded `serde_json::Value` into a `Doc`.
    pub fn from_json(v: serde_json::Value) -> Doc {
        match v {
            serde_json::Value::Null => Doc::Null,
            serde_json::Value::Bool(b) => Doc::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Doc::Int(i)
                } else {
                    Doc::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Doc::Str(s),
            serde_json::Value::Array(items) => {
                Doc::Seq(items.into_iter().map(Doc::from_json).collect())
            }
            serde_json::Value::Object(map) => Doc::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Doc::from_json(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_treats_explicit_null_as_absent() {
        let doc = Doc::from_json(serde_json::json!({ "a": null, "b": 1 }));
        assert!(doc.get("a").is_none());
        assert_eq!(doc.get("b"), Some(&Doc::Int(1)));
        assert!(doc.get("c").is_none());
    }

    #[test]
    fn as_map_reports_wrong_container_kind() {
        let doc = Doc::Str("oops".into());
        let err = doc.as_map("features").unwrap_err();
        assert_eq!(err.to_string(), "'features' must be a mapping, got string");
    }

    #[test]
    fn as_decimal_accepts_int_and_float() {
        assert_eq!(
            Doc::Int(3).as_decimal("price").unwrap(),
            Decimal::from(3)
        );
        assert_eq!(
            Doc::Float(15.99).as_decimal("price").unwrap().to_string(),
            "15.99"
        );
    }
}
