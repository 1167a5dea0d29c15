//! Creation-only property checks for existing resources.

use tracing::warn;

use crate::compare;
use crate::desired::DesiredState;
use crate::error::{ReconcileError, Result};
use crate::props::{Mutability, PropertySpec, ResourceKind, Strategy};
use crate::snapshot::ResourceSnapshot;

fn parsed_form(spec: &PropertySpec, desired: Option<&str>, observed: Option<&str>) -> String {
    let parsed = match (spec.strategy, desired) {
        (Strategy::SizeEquivalence, Some(d)) => spec.wire.to_bytes(d).ok(),
        (Strategy::SizeEquivalence, None) => compare::observed_bytes(spec.wire, observed),
        _ => None,
    };
    match parsed {
        Some(bytes) => bytes.to_string(),
        None => desired.or(observed).unwrap_or("None").trim().to_string(),
    }
}

/// Reject desired values that would change a creation-only property of
/// `observed`. Returns warnings for advisory properties that are ignored.
pub fn check_immutable(
    kind: ResourceKind,
    desired: &DesiredState,
    observed: &ResourceSnapshot,
) -> Result<Vec<String>> {
    let mut warnings = Vec::new();

    for spec in kind.properties() {
        let Some(value) = desired.get(spec.key) else {
            continue;
        };
        match spec.mutability {
            Mutability::CreateOnly => {
                let desired_text = value.as_text();
                let current = observed.raw(spec.key);
                if !compare::values_match(spec, Some(&desired_text), current) {
                    return Err(ReconcileError::ImmutableChange {
                        property: spec.key.to_string(),
                        kind,
                        current_raw: current.unwrap_or("None").to_string(),
                        current_parsed: parsed_form(spec, None, current),
                        desired_raw: desired_text.clone(),
                        desired_parsed: parsed_form(spec, Some(&desired_text), None),
                    });
                }
            }
            Mutability::CreateOnlyAdvisory => {
                let message = format!(
                    "Cannot update '{}' on existing {}, ignoring parameter.",
                    spec.key, kind
                );
                warn!(name = %observed.name, "{}", message);
                warnings.push(message);
            }
            Mutability::Mutable | Mutability::IgnoredOnCoreVariant => {}
        }
    }

    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn volume(volblocksize: &str) -> ResourceSnapshot {
        ResourceSnapshot::decode(json!({
            "name": "tank/vol",
            "type": "VOLUME",
            "volsize": {"rawvalue": "10737418240", "parsed": 10737418240u64},
            "volblocksize": {"rawvalue": volblocksize, "parsed": 65536},
            "sparse": {"rawvalue": "off", "parsed": false}
        }))
        .unwrap()
    }

    #[test]
    fn test_block_size_change_is_rejected() {
        let desired = DesiredState::new("tank/vol").with("volblocksize", "128K");
        let err = check_immutable(ResourceKind::Volume, &desired, &volume("65536")).unwrap_err();

        match &err {
            ReconcileError::ImmutableChange {
                property,
                current_parsed,
                desired_parsed,
                ..
            } => {
                assert_eq!(property, "volblocksize");
                assert_eq!(current_parsed, "65536");
                assert_eq!(desired_parsed, "131072");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        let msg = err.to_string();
        assert!(msg.contains("65536"), "{}", msg);
        assert!(msg.contains("131072"), "{}", msg);
        assert!(msg.contains("volblocksize"), "{}", msg);
    }

    #[test]
    fn test_equal_block_size_passes() {
        for same in ["64K", "64k", "65536"] {
            let desired = DesiredState::new("tank/vol").with("volblocksize", same);
            let warnings = check_immutable(ResourceKind::Volume, &desired, &volume("65536")).unwrap();
            assert!(warnings.is_empty());
        }
    }

    #[test]
    fn test_missing_observed_block_size_is_a_change() {
        let snap = ResourceSnapshot::decode(json!({"name": "tank/vol", "type": "VOLUME"})).unwrap();
        let desired = DesiredState::new("tank/vol").with("volblocksize", "64K");
        let err = check_immutable(ResourceKind::Volume, &desired, &snap).unwrap_err();
        assert!(err.to_string().contains("Current=None"));
    }

    #[test]
    fn test_sparse_is_only_warned_about() {
        let desired = DesiredState::new("tank/vol").with("sparse", true);
        let warnings = check_immutable(ResourceKind::Volume, &desired, &volume("65536")).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("sparse"));
    }
}
