//! Create and update payloads scoped to the property allow-list.

use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crate::codec;
use crate::compare;
use crate::desired::{DesiredState, PropertyValue};
use crate::error::ValidationError;
use crate::props::{Mutability, PropertySpec, ResourceKind, Wire};
use crate::snapshot::ResourceSnapshot;
use crate::system::SystemInfo;

/// Payload for a create/update call plus advisory warnings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    pub payload: Map<String, Value>,
    pub warnings: Vec<String>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }
}

/// Encode a desired value the way the middleware expects it for `spec`.
pub fn encode(spec: &PropertySpec, value: &PropertyValue) -> Result<Value, ValidationError> {
    let encoded = match (spec.wire, value) {
        (Wire::Bool, PropertyValue::Bool(b)) => Value::Bool(*b),
        (Wire::Bool, _) => {
            return Err(ValidationError::InvalidType {
                property: spec.key.to_string(),
                expected: "a boolean",
            });
        }
        (Wire::Bytes, PropertyValue::Int(n)) => json!(n),
        (Wire::Bytes, v) => json!(codec::parse_size(&v.as_text())?),
        (Wire::Token(tokens), v) => {
            let text = v.as_text();
            let bytes = codec::parse_token(tokens, &text)?;
            let token = codec::token_for_bytes(tokens, bytes)
                .map(str::to_string)
                .unwrap_or_else(|| text.trim().to_string());
            Value::String(token)
        }
        (Wire::Text, v) => Value::String(v.as_text().trim().to_string()),
    };
    Ok(encoded)
}

fn user_properties(desired: &DesiredState) -> Value {
    Value::Array(
        desired
            .user_properties
            .iter()
            .map(|up| json!({"key": up.key, "value": up.value}))
            .collect(),
    )
}

fn user_property_updates(desired: &DesiredState) -> Vec<Value> {
    desired
        .user_properties_update
        .iter()
        .filter_map(|up| {
            if up.remove == Some(true) {
                Some(json!({"key": up.key, "remove": true}))
            } else {
                up.value
                    .as_ref()
                    .map(|value| json!({"key": up.key, "value": value}))
            }
        })
        .collect()
}

/// Arguments for `pool.dataset.create`.
pub fn build_create(
    kind: ResourceKind,
    desired: &DesiredState,
    system: &SystemInfo,
) -> Result<ChangeSet, ValidationError> {
    let mut changes = ChangeSet::default();
    changes
        .payload
        .insert("name".to_string(), Value::String(desired.name.clone()));
    changes
        .payload
        .insert("type".to_string(), Value::String(kind.as_api_str().to_string()));

    for spec in kind.properties() {
        let Some(value) = desired.get(spec.key) else {
            continue;
        };
        if spec.mutability == Mutability::IgnoredOnCoreVariant && !system.supports_create_ancestors()
        {
            changes.warn(format!(
                "{} doesn't support the {} option, ignoring it.",
                system.product_label(),
                spec.key
            ));
            continue;
        }
        changes
            .payload
            .insert(spec.key.to_string(), encode(spec, value)?);
    }

    if let Some(force) = desired.force_size {
        changes
            .payload
            .insert("force_size".to_string(), Value::Bool(force));
    }
    if !desired.user_properties.is_empty() {
        changes
            .payload
            .insert("user_properties".to_string(), user_properties(desired));
    }
    if !desired.user_properties_update.is_empty() {
        changes.warn(format!(
            "user_properties_update is ignored when creating {} '{}'; use user_properties.",
            kind, desired.name
        ));
    }

    debug!(name = %desired.name, payload = ?changes.payload, "Built create payload");
    Ok(changes)
}

/// Arguments for `pool.dataset.update`. Only properties whose observed value
/// differs are included; an empty payload means nothing to do.
pub fn build_update(
    kind: ResourceKind,
    desired: &DesiredState,
    observed: &ResourceSnapshot,
) -> Result<ChangeSet, ValidationError> {
    let mut changes = ChangeSet::default();

    for spec in kind.properties() {
        if spec.mutability != Mutability::Mutable {
            continue;
        }
        let Some(value) = desired.get(spec.key) else {
            continue;
        };
        let desired_text = value.as_text();
        if !compare::values_match(spec, Some(&desired_text), observed.raw(spec.key)) {
            debug!(
                property = spec.key,
                desired = %desired_text,
                observed = ?observed.raw(spec.key),
                "Property differs"
            );
            changes
                .payload
                .insert(spec.key.to_string(), encode(spec, value)?);
        }
    }

    if desired.force_size == Some(true) && changes.payload.contains_key("volsize") {
        changes
            .payload
            .insert("force_size".to_string(), Value::Bool(true));
    }
    if !desired.user_properties.is_empty() {
        changes
            .payload
            .insert("user_properties".to_string(), user_properties(desired));
    }
    let updates = user_property_updates(desired);
    if !updates.is_empty() {
        changes
            .payload
            .insert("user_properties_update".to_string(), Value::Array(updates));
    }

    Ok(changes)
}
