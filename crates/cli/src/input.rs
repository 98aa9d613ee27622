//! File loading and YAML decoding. The core consumes a generic document
//! tree; YAML only exists at this edge.

use std::path::Path;

use rust_decimal::Decimal;
use tierkit_core::{Doc, Value};

pub fn load_document(path: &Path) -> Result<Doc, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    let yaml: serde_yaml::Value = serde_yaml::from_str(&text)
        .map_err(|e| format!("invalid YAML in {}: {}", path.display(), e))?;
    yaml_to_doc(yaml).map_err(|e| format!("unsupported YAML in {}: {}", path.display(), e))
}

fn yaml_to_doc(v: serde_yaml::Value) -> Result<Doc, String> {
    match v {
        serde_yaml::Value::Null => Ok(Doc::Null),
        serde_yaml::Value::Bool(b) => Ok(Doc::Bool(b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Doc::Int(i))
            } else if let Some(f) = n.as_f64() {
                Ok(Doc::Float(f))
            } else {
                Err(format!("number out of range: {}", n))
            }
        }
        serde_yaml::Value::String(s) => Ok(Doc::Str(s)),
        serde_yaml::Value::Sequence(items) => Ok(Doc::Seq(
            items
                .into_iter()
                .map(yaml_to_doc)
                .collect::<Result<_, _>>()?,
        )),
        serde_yaml::Value::Mapping(map) => {
            let mut out = std::collections::BTreeMap::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s,
                    other => return Err(format!("non-string mapping key: {:?}", other)),
                };
                out.insert(key, yaml_to_doc(v)?);
            }
            Ok(Doc::Map(out))
        }
        serde_yaml::Value::Tagged(t) => yaml_to_doc(t.value),
    }
}

/// Parse a `--var name=value` argument. Values are tried as bool, then
/// number, then kept as text.
pub fn parse_var(arg: &str) -> Result<(String, Value), String> {
    let (name, raw) = arg
        .split_once('=')
        .ok_or_else(|| format!("invalid --var '{}': expected name=value", arg))?;
    if name.is_empty() {
        return Err(format!("invalid --var '{}': empty name", arg));
    }
    let value = match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => match raw.parse::<Decimal>() {
            Ok(d) => Value::Number(d),
            Err(_) => Value::Text(raw.to_string()),
        },
    };
    Ok((name.to_string(), value))
}
