//! Typed view of a `pool.dataset.query` entry.
//!
//! Property entries arrive as `{"rawvalue": "...", "parsed": ..., ...}`
//! objects mixed with plain attributes (`id`, `pool`, `mountpoint`, ...).
//! Allow-listed properties that come back in any other shape are rejected
//! instead of being read as missing.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::DecodeError;
use crate::props::ResourceKind;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservedProperty {
    #[serde(rename = "rawvalue")]
    pub raw: Option<String>,
    pub parsed: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Remaining entry fields (`value`, `source_info`, ...) as reported.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceSnapshot {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    #[serde(flatten)]
    pub properties: BTreeMap<String, ObservedProperty>,
    pub user_properties: BTreeMap<String, String>,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

impl ResourceSnapshot {
    /// Decode the first entry of a query result, if any.
    pub fn decode_query(value: Value) -> Result<Option<Self>, DecodeError> {
        match value {
            Value::Array(entries) => entries.into_iter().next().map(Self::decode).transpose(),
            other => Err(DecodeError::NotAList(type_name(&other).to_string())),
        }
    }

    pub fn decode(value: Value) -> Result<Self, DecodeError> {
        let Value::Object(mut obj) = value else {
            return Err(DecodeError::NotAnObject("dataset".to_string()));
        };

        let name = match obj.remove("name") {
            Some(Value::String(s)) => s,
            _ => return Err(DecodeError::MissingField("name")),
        };
        let kind = match obj.remove("type") {
            Some(Value::String(s)) => {
                ResourceKind::from_api_str(&s).ok_or(DecodeError::UnknownKind(s))?
            }
            _ => return Err(DecodeError::MissingField("type")),
        };
        let user_properties = match obj.remove("user_properties") {
            None | Some(Value::Null) => BTreeMap::new(),
            Some(Value::Object(map)) => decode_user_properties(map)?,
            Some(_) => return Err(DecodeError::NotAnObject("user_properties".to_string())),
        };

        let mut properties = BTreeMap::new();
        let mut attributes = BTreeMap::new();
        for (key, value) in obj {
            match value {
                Value::Object(entry) if entry.contains_key("rawvalue") => {
                    properties.insert(key.clone(), decode_property(&key, entry)?);
                }
                Value::Null => {
                    attributes.insert(key, Value::Null);
                }
                other if kind.property(&key).is_some() => {
                    return Err(DecodeError::PropertyShape {
                        property: key,
                        found: type_name(&other).to_string(),
                    });
                }
                other => {
                    attributes.insert(key, other);
                }
            }
        }

        Ok(Self {
            name,
            kind,
            properties,
            user_properties,
            attributes,
        })
    }

    /// Observed raw value of a property, trimmed.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.properties
            .get(key)
            .and_then(|p| p.raw.as_deref())
            .map(str::trim)
    }
}

fn decode_property(key: &str, mut entry: Map<String, Value>) -> Result<ObservedProperty, DecodeError> {
    let raw = match entry.remove("rawvalue") {
        Some(Value::String(s)) => Some(s),
        Some(Value::Null) | None => None,
        Some(other) => {
            return Err(DecodeError::PropertyShape {
                property: key.to_string(),
                found: format!("rawvalue is {}", type_name(&other)),
            });
        }
    };
    let source = match entry.remove("source") {
        Some(Value::String(s)) => Some(s),
        Some(other) => {
            entry.insert("source".to_string(), other);
            None
        }
        None => None,
    };
    let parsed = entry.remove("parsed").unwrap_or(Value::Null);

    Ok(ObservedProperty {
        raw,
        parsed,
        source,
        extra: entry,
    })
}

fn decode_user_properties(map: Map<String, Value>) -> Result<BTreeMap<String, String>, DecodeError> {
    let mut out = BTreeMap::new();
    for (key, value) in map {
        let text = match &value {
            Value::String(s) => s.clone(),
            Value::Object(entry) => match entry.get("value").or_else(|| entry.get("rawvalue")) {
                Some(Value::String(s)) => s.clone(),
                _ => {
                    return Err(DecodeError::UserPropertyShape {
                        key,
                        found: "object without a string value".to_string(),
                    });
                }
            },
            other => {
                return Err(DecodeError::UserPropertyShape {
                    key,
                    found: type_name(other).to_string(),
                });
            }
        };
        out.insert(key, text);
    }
    Ok(out)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
