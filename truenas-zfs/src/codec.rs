//! Conversions between human-facing property notation and canonical values.
//!
//! Sizes accept an integer with an optional unit suffix. Block sizes come
//! from a closed token table shared with the middleware's display form.

use crate::error::ValidationError;

/// Block size tokens accepted by the middleware, in display form.
pub const BLOCK_TOKENS: &[(&str, u64)] = &[
    ("512", 512),
    ("1K", 1 << 10),
    ("2K", 2 << 10),
    ("4K", 4 << 10),
    ("8K", 8 << 10),
    ("16K", 16 << 10),
    ("32K", 32 << 10),
    ("64K", 64 << 10),
    ("128K", 128 << 10),
    ("256K", 256 << 10),
];

/// Record size tokens: the block table plus the large-block sizes.
pub const RECORD_SIZE_TOKENS: &[(&str, u64)] = &[
    ("512", 512),
    ("1K", 1 << 10),
    ("2K", 2 << 10),
    ("4K", 4 << 10),
    ("8K", 8 << 10),
    ("16K", 16 << 10),
    ("32K", 32 << 10),
    ("64K", 64 << 10),
    ("128K", 128 << 10),
    ("256K", 256 << 10),
    ("512K", 512 << 10),
    ("1M", 1 << 20),
    ("16M", 16 << 20),
];

/// Values compared case-insensitively when either side is one of them.
pub const CASE_INSENSITIVE_ENUMS: &[&str] = &[
    "on",
    "off",
    "inherit",
    "standard",
    "always",
    "disabled",
    "visible",
    "hidden",
    "lz4",
    "zstd",
    "nfsv4",
    "posix",
    "restricted",
    "passthrough",
    "discard",
    "verify",
];

/// Byte multiplier for a size unit suffix.
///
/// Bare letters are binary (the volume size should be a multiple of a
/// power-of-two block size), `xB` is decimal and `xiB` is explicitly binary.
fn unit_multiplier(unit: &str) -> Option<u64> {
    let m = match unit {
        "" => 1,
        "K" | "KiB" => 1 << 10,
        "M" | "MiB" => 1 << 20,
        "G" | "GiB" => 1 << 30,
        "T" | "TiB" => 1 << 40,
        "KB" => 1_000,
        "MB" => 1_000_000,
        "GB" => 1_000_000_000,
        "TB" => 1_000_000_000_000,
        _ => return None,
    };
    Some(m)
}

/// Parse a size such as `640K`, `32MB`, `10GiB` or `1073741824` into bytes.
pub fn parse_size(text: &str) -> Result<u64, ValidationError> {
    let invalid = || ValidationError::InvalidSize(text.to_string());

    let trimmed = text.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(split);
    if digits.is_empty() {
        return Err(invalid());
    }

    let n: u64 = digits.parse().map_err(|_| invalid())?;
    let multiplier = unit_multiplier(unit.trim_start()).ok_or_else(invalid)?;
    n.checked_mul(multiplier).ok_or_else(invalid)
}

/// Parse a token from `tokens` (`64K`, `512B`) or a plain byte count
/// (`65536`). Anything else is rejected.
pub fn parse_token(tokens: &[(&str, u64)], text: &str) -> Result<u64, ValidationError> {
    let upper = text.trim().to_ascii_uppercase();

    if upper == "512B" {
        return Ok(512);
    }
    if let Some((_, bytes)) = tokens.iter().find(|(token, _)| *token == upper) {
        return Ok(*bytes);
    }
    if !upper.is_empty() && upper.bytes().all(|b| b.is_ascii_digit()) {
        return upper
            .parse()
            .map_err(|_| ValidationError::InvalidBlockSize(text.to_string()));
    }

    Err(ValidationError::InvalidBlockSize(text.to_string()))
}

/// Parse a block size token from [`BLOCK_TOKENS`] or a plain byte count.
pub fn parse_block_token(text: &str) -> Result<u64, ValidationError> {
    parse_token(BLOCK_TOKENS, text)
}

/// Display token for an exact byte count, if `tokens` has one.
pub fn token_for_bytes(tokens: &[(&'static str, u64)], bytes: u64) -> Option<&'static str> {
    tokens
        .iter()
        .find(|(_, b)| *b == bytes)
        .map(|(token, _)| *token)
}

pub fn bytes_to_display_token(bytes: u64) -> Option<&'static str> {
    token_for_bytes(BLOCK_TOKENS, bytes)
}

fn is_known_enum(value: &str) -> bool {
    CASE_INSENSITIVE_ENUMS
        .iter()
        .any(|e| e.eq_ignore_ascii_case(value))
}

/// Lower-case `value` when it or the value it is compared against is a
/// known case-insensitive enumeration member. Otherwise return it unchanged.
pub fn canonicalize_enum(value: &str, partner: &str) -> String {
    if is_known_enum(value) || is_known_enum(partner) {
        value.to_ascii_lowercase()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size_units() {
        assert_eq!(parse_size("1073741824").unwrap(), 1 << 30);
        assert_eq!(parse_size("640K").unwrap(), 640 * 1024);
        assert_eq!(parse_size("32MB").unwrap(), 32_000_000);
        assert_eq!(parse_size("10GiB").unwrap(), 10 * (1 << 30));
        assert_eq!(parse_size("10GB").unwrap(), 10 * 1_000_000_000);
        assert_eq!(parse_size("1TB").unwrap(), 1_000_000_000_000);
        assert_eq!(parse_size("2T").unwrap(), 2 << 40);
        assert_eq!(parse_size(" 20 G ").unwrap(), 20 << 30);
    }

    #[test]
    fn test_parse_size_rejects_garbage() {
        for bad in ["", "G", "10X", "10Ki", "-5", "1.5G", "10gb", "ten"] {
            assert!(
                matches!(parse_size(bad), Err(ValidationError::InvalidSize(_))),
                "'{}' should not parse",
                bad
            );
        }
        assert!(parse_size("99999999999T").is_err());
    }

    #[test]
    fn test_block_tokens_round_trip() {
        for (token, bytes) in BLOCK_TOKENS {
            assert_eq!(parse_block_token(token).unwrap(), *bytes);
            assert_eq!(bytes_to_display_token(*bytes), Some(*token));
        }
    }

    #[test]
    fn test_parse_block_token_aliases_and_numbers() {
        assert_eq!(parse_block_token("512B").unwrap(), 512);
        assert_eq!(parse_block_token("64k").unwrap(), 65536);
        assert_eq!(parse_block_token("65536").unwrap(), 65536);
        assert_eq!(parse_block_token("12345").unwrap(), 12345);
        assert!(parse_block_token("1M").is_err());
        assert!(parse_block_token("").is_err());
    }

    #[test]
    fn test_bytes_to_display_token_misses() {
        assert_eq!(bytes_to_display_token(65536), Some("64K"));
        assert_eq!(bytes_to_display_token(1 << 20), None);
        assert_eq!(bytes_to_display_token(0), None);
    }

    #[test]
    fn test_record_size_tokens() {
        assert_eq!(parse_token(RECORD_SIZE_TOKENS, "1m").unwrap(), 1 << 20);
        assert_eq!(parse_token(RECORD_SIZE_TOKENS, "16M").unwrap(), 16 << 20);
        assert_eq!(token_for_bytes(RECORD_SIZE_TOKENS, 512 << 10), Some("512K"));
        // Capacities are not block sizes.
        assert!(parse_token(RECORD_SIZE_TOKENS, "2M").is_err());
        assert!(parse_block_token("3GiB").is_err());
        assert!(parse_block_token("1MB").is_err());
    }

    #[test]
    fn test_sizes_do_not_accept_block_aliases() {
        assert!(parse_size("512B").is_err());
        assert!(parse_size("64k").is_err());
    }

    #[test]
    fn test_canonicalize_enum() {
        assert_eq!(canonicalize_enum("LZ4", "lz4"), "lz4");
        assert_eq!(canonicalize_enum("Standard", "always"), "standard");
        // Partner membership is enough.
        assert_eq!(canonicalize_enum("GZIP-9", "off"), "gzip-9");
        assert_eq!(canonicalize_enum("Lz4hc", "lz4hc"), "Lz4hc");
    }
}
