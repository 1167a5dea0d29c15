//! Equality between a desired value and an observed raw value.
//!
//! A false "equal" would suppress a needed update, so any conversion
//! failure compares as different.

use crate::codec;
use crate::props::{PropertySpec, Strategy, Wire};

/// Whether `observed` already satisfies `desired` for this property.
pub fn values_match(spec: &PropertySpec, desired: Option<&str>, observed: Option<&str>) -> bool {
    let (desired, observed) = match (desired, observed) {
        (None, None) => return true,
        (Some(d), Some(o)) => (d.trim(), o.trim()),
        _ => return false,
    };

    match spec.strategy {
        Strategy::SizeEquivalence => sizes_match(spec.wire, desired, observed),
        Strategy::EnumCaseInsensitive => {
            codec::canonicalize_enum(desired, observed) == codec::canonicalize_enum(observed, desired)
        }
        Strategy::DirectString => desired == observed,
    }
}

fn sizes_match(wire: Wire, desired: &str, observed: &str) -> bool {
    match (wire.to_bytes(desired), observed_bytes(wire, Some(observed))) {
        (Ok(d), Some(o)) => d == o,
        _ => false,
    }
}

/// Canonical byte count of an observed raw value. Raw values are plain
/// byte counts; display tokens are accepted as well.
pub fn observed_bytes(wire: Wire, observed: Option<&str>) -> Option<u64> {
    let observed = observed?.trim();
    observed
        .parse::<u64>()
        .ok()
        .or_else(|| wire.to_bytes(observed).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props::ResourceKind;

    fn fs(key: &str) -> &'static PropertySpec {
        ResourceKind::Filesystem.property(key).unwrap()
    }

    fn vol(key: &str) -> &'static PropertySpec {
        ResourceKind::Volume.property(key).unwrap()
    }

    #[test]
    fn test_absent_sides() {
        assert!(values_match(fs("comments"), None, None));
        assert!(!values_match(fs("comments"), Some("x"), None));
        assert!(!values_match(fs("comments"), None, Some("x")));
    }

    #[test]
    fn test_enum_case_insensitive() {
        assert!(values_match(fs("compression"), Some("LZ4"), Some("lz4")));
        assert!(values_match(fs("atime"), Some("OFF"), Some("off")));
        assert!(values_match(fs("sync"), Some(" Standard "), Some("standard")));
        assert!(!values_match(fs("sync"), Some("always"), Some("standard")));
    }

    #[test]
    fn test_unknown_enum_values_are_case_sensitive() {
        let compression = vol("compression");
        assert!(values_match(compression, Some("lz4hc"), Some("lz4hc")));
        assert!(!values_match(compression, Some("Lz4hc"), Some("lz4hc")));
    }

    #[test]
    fn test_direct_string_trims_only() {
        assert!(values_match(fs("comments"), Some("backup "), Some(" backup")));
        assert!(!values_match(fs("comments"), Some("ON"), Some("on")));
    }

    #[test]
    fn test_block_size_equivalence() {
        let recordsize = fs("recordsize");
        assert!(values_match(recordsize, Some("128K"), Some("131072")));
        assert!(values_match(recordsize, Some("128k"), Some("128K")));
        assert!(values_match(recordsize, Some("1M"), Some("1048576")));
        assert!(!values_match(recordsize, Some("64K"), Some("131072")));
    }

    #[test]
    fn test_size_equivalence_on_capacities() {
        let volsize = vol("volsize");
        assert!(values_match(volsize, Some("10GiB"), Some("10737418240")));
        assert!(values_match(volsize, Some("10737418240"), Some("10737418240")));
        assert!(!values_match(volsize, Some("10GB"), Some("10737418240")));
        assert!(!values_match(volsize, Some("64k"), Some("65536")));
        assert!(!values_match(volsize, Some("512B"), Some("512")));
    }

    #[test]
    fn test_block_sizes_reject_capacities() {
        let vbs = vol("volblocksize");
        assert!(values_match(vbs, Some("512B"), Some("512")));
        assert!(!values_match(vbs, Some("3GiB"), Some("3221225472")));
        assert!(!values_match(vbs, Some("1M"), Some("1048576")));
    }

    #[test]
    fn test_conversion_failure_is_not_equal() {
        let recordsize = fs("recordsize");
        assert!(!values_match(recordsize, Some("huge"), Some("131072")));
        assert!(!values_match(recordsize, Some("128K"), Some("n/a")));
        assert!(!values_match(recordsize, Some("128K"), Some("")));
    }

    #[test]
    fn test_numeric_checksum_names_use_enum_path() {
        // "sha256" must not be parsed as a size.
        assert!(!values_match(fs("checksum"), Some("sha256"), Some("sha512")));
        assert!(values_match(fs("copies"), Some("2"), Some("2")));
        assert!(!values_match(fs("copies"), Some("2"), Some("02")));
    }

    #[test]
    fn test_observed_bytes() {
        let wire = vol("volblocksize").wire;
        assert_eq!(observed_bytes(wire, Some(" 65536 ")), Some(65536));
        assert_eq!(observed_bytes(wire, Some("64K")), Some(65536));
        assert_eq!(observed_bytes(wire, Some("n/a")), None);
        assert_eq!(observed_bytes(wire, None), None);
    }
}
