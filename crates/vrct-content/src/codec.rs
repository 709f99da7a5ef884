//! Decode and encode between raw bytes and the generic content tree
//!
//! The generic tree is [`serde_json::Value`]; YAML and TOML documents are
//! converted into it on decode and back out on encode, so the merge logic
//! never needs to know which format a file uses.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::format::Format;

/// Decode raw bytes into the generic content tree.
///
/// Empty (or whitespace-only) content decodes to an empty map, so a freshly
/// created or blank config file contributes nothing to a merge. Text content
/// has no structured representation and is rejected here.
pub fn decode(content: &[u8], format: Format) -> Result<Value> {
    let text = std::str::from_utf8(content)
        .map_err(|_| Error::parse(format, "content is not valid UTF-8"))?;
    if text.trim().is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }

    match format {
        Format::Json => serde_json::from_str(text).map_err(|e| Error::parse(format, e.to_string())),
        Format::Yaml => {
            let value: serde_yaml::Value =
                serde_yaml::from_str(text).map_err(|e| Error::parse(format, e.to_string()))?;
            yaml_to_json(value)
        }
        Format::Toml => {
            let value: toml::Value =
                toml::from_str(text).map_err(|e| Error::parse(format, e.to_string()))?;
            Ok(toml_to_json(value))
        }
        Format::Text => Err(Error::parse(
            format,
            "text content has no structured representation",
        )),
    }
}

/// Encode a generic content tree into the target format's bytes.
pub fn encode(tree: &Value, format: Format) -> Result<Vec<u8>> {
    match format {
        Format::Json => {
            let rendered = serde_json::to_string_pretty(tree)
                .map_err(|e| Error::encode(format, e.to_string()))?;
            Ok(rendered.into_bytes())
        }
        Format::Yaml => {
            let yaml = json_to_yaml(tree);
            let rendered =
                serde_yaml::to_string(&yaml).map_err(|e| Error::encode(format, e.to_string()))?;
            Ok(rendered.into_bytes())
        }
        Format::Toml => {
            let table = json_to_toml_table(tree)?;
            let rendered = toml::to_string(&toml::Value::Table(table))
                .map_err(|e| Error::encode(format, e.to_string()))?;
            Ok(rendered.into_bytes())
        }
        Format::Text => Err(Error::encode(
            format,
            "text content has no structured representation",
        )),
    }
}

fn yaml_to_json(value: serde_yaml::Value) -> Result<Value> {
    match value {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::from(i))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::from(u))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| {
                        Error::parse(Format::Yaml, "non-finite numbers are not representable")
                    })
            } else {
                Err(Error::parse(Format::Yaml, format!("unsupported number {n}")))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s)),
        serde_yaml::Value::Sequence(seq) => {
            let items = seq.into_iter().map(yaml_to_json).collect::<Result<_>>()?;
            Ok(Value::Array(items))
        }
        serde_yaml::Value::Mapping(map) => {
            let mut out = serde_json::Map::new();
            for (key, value) in map {
                out.insert(yaml_key_to_string(key)?, yaml_to_json(value)?);
            }
            Ok(Value::Object(out))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

/// Scalar mapping keys are stringified; composite keys have no counterpart
/// in the generic tree and are rejected.
fn yaml_key_to_string(key: serde_yaml::Value) -> Result<String> {
    match key {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Null => Ok("null".to_string()),
        other => Err(Error::parse(
            Format::Yaml,
            format!("unsupported mapping key {other:?}"),
        )),
    }
}

fn json_to_yaml(value: &Value) -> serde_yaml::Value {
    match value {
        Value::Null => serde_yaml::Value::Null,
        Value::Bool(b) => serde_yaml::Value::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                serde_yaml::Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                serde_yaml::Value::Number(u.into())
            } else {
                serde_yaml::Value::Number(n.as_f64().unwrap_or(f64::NAN).into())
            }
        }
        Value::String(s) => serde_yaml::Value::String(s.clone()),
        Value::Array(items) => {
            serde_yaml::Value::Sequence(items.iter().map(json_to_yaml).collect())
        }
        Value::Object(map) => {
            let mut out = serde_yaml::Mapping::new();
            for (key, value) in map {
                out.insert(
                    serde_yaml::Value::String(key.clone()),
                    json_to_yaml(value),
                );
            }
            serde_yaml::Value::Mapping(out)
        }
    }
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => {
            let mut out = serde_json::Map::new();
            for (key, value) in table {
                out.insert(key, toml_to_json(value));
            }
            Value::Object(out)
        }
    }
}

/// TOML documents are tables at the root; anything else is unencodable.
fn json_to_toml_table(tree: &Value) -> Result<toml::map::Map<String, toml::Value>> {
    let Value::Object(map) = tree else {
        return Err(Error::encode(
            Format::Toml,
            "top-level content must be a table",
        ));
    };
    let mut out = toml::map::Map::new();
    for (key, value) in map {
        // Null has no TOML representation; dropping the key keeps encode total
        if value.is_null() {
            continue;
        }
        out.insert(key.clone(), json_to_toml(value)?);
    }
    Ok(out)
}

fn json_to_toml(value: &Value) -> Result<toml::Value> {
    match value {
        Value::Null => Err(Error::encode(
            Format::Toml,
            "null is not representable inside an array",
        )),
        Value::Bool(b) => Ok(toml::Value::Boolean(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(toml::Value::Integer(i))
            } else if let Some(f) = n.as_f64() {
                Ok(toml::Value::Float(f))
            } else {
                Err(Error::encode(
                    Format::Toml,
                    format!("number {n} is out of range"),
                ))
            }
        }
        Value::String(s) => Ok(toml::Value::String(s.clone())),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(json_to_toml(item)?);
            }
            Ok(toml::Value::Array(out))
        }
        Value::Object(map) => {
            let mut out = toml::map::Map::new();
            for (key, value) in map {
                if value.is_null() {
                    continue;
                }
                out.insert(key.clone(), json_to_toml(value)?);
            }
            Ok(toml::Value::Table(out))
        }
    }
}
