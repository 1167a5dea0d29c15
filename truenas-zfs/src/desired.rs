//! Caller-supplied desired state.
//!
//! Property keys sit at the top level of the input next to `name` and
//! `state`, the same flat shape playbook task arguments use:
//!
//! ```json
//! {"name": "tank/vm-disk", "volsize": "50GB", "volblocksize": "32K", "sparse": true}
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::props::{ResourceKind, Strategy, Wire};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    #[default]
    Present,
    Absent,
}

/// A desired property value as written by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(u64),
    Text(String),
}

impl PropertyValue {
    /// Text form used for comparisons against raw values.
    pub fn as_text(&self) -> String {
        match self {
            PropertyValue::Bool(b) => b.to_string(),
            PropertyValue::Int(n) => n.to_string(),
            PropertyValue::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

/// Entry of the bulk user property set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProperty {
    pub key: String,
    pub value: String,
}

/// Targeted user property add/modify/remove.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPropertyUpdate {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesiredState {
    pub name: String,

    #[serde(default)]
    pub state: Presence,

    /// Skip the size threshold checks when creating or resizing a volume.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_size: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_properties: Vec<UserProperty>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_properties_update: Vec<UserPropertyUpdate>,

    /// Report what would change without calling create/update/delete.
    #[serde(default)]
    pub dry_run: bool,

    #[serde(flatten)]
    pub properties: BTreeMap<String, PropertyValue>,
}

impl DesiredState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn absent(name: impl Into<String>) -> Self {
        Self {
            state: Presence::Absent,
            ..Self::new(name)
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// Check every property against the allow-list of `kind` and make sure
    /// the values can be encoded.
    pub fn validate(&self, kind: ResourceKind) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::NameRequired);
        }
        if self.state == Presence::Absent {
            return Ok(());
        }

        for (key, value) in &self.properties {
            let spec = kind
                .property(key)
                .ok_or_else(|| ValidationError::UnknownProperty {
                    property: key.clone(),
                    kind,
                })?;

            match (spec.wire, value) {
                (Wire::Bool, PropertyValue::Bool(_)) => {}
                (Wire::Bool, _) => {
                    return Err(ValidationError::InvalidType {
                        property: key.clone(),
                        expected: "a boolean",
                    });
                }
                (_, PropertyValue::Bool(_)) => {
                    return Err(ValidationError::InvalidType {
                        property: key.clone(),
                        expected: "a string or integer",
                    });
                }
                _ => {}
            }

            let text = value.as_text();
            if spec.strategy == Strategy::SizeEquivalence {
                spec.wire.to_bytes(&text)?;
            }
            if !spec.choices.is_empty()
                && !spec
                    .choices
                    .iter()
                    .any(|c| c.eq_ignore_ascii_case(text.trim()))
            {
                return Err(ValidationError::InvalidChoice {
                    property: key.clone(),
                    value: text,
                    choices: spec.choices.to_vec(),
                });
            }
        }

        for up in &self.user_properties {
            if up.key.trim().is_empty() {
                return Err(ValidationError::UserPropertyKeyRequired);
            }
        }
        for up in &self.user_properties_update {
            if up.key.trim().is_empty() {
                return Err(ValidationError::UserPropertyKeyRequired);
            }
            if up.remove == Some(true) && up.value.is_some() {
                return Err(ValidationError::ConflictingUserPropertyUpdate(
                    up.key.clone(),
                ));
            }
        }

        Ok(())
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Text(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Text(s)
    }
}

impl From<u64> for PropertyValue {
    fn from(n: u64) -> Self {
        PropertyValue::Int(n)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}
