//! Static property tables per resource kind.
//!
//! Only keys listed here are ever sent to the middleware. Each entry says
//! when the property may be set, how a desired value is compared with the
//! observed raw value, and how it is encoded into a payload.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::ValidationError;

/// Dataset type as reported by `pool.dataset.query`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResourceKind {
    #[value(name = "filesystem")]
    Filesystem,
    #[value(name = "volume")]
    Volume,
}

impl ResourceKind {
    /// Type string used by the middleware.
    pub fn as_api_str(self) -> &'static str {
        match self {
            ResourceKind::Filesystem => "FILESYSTEM",
            ResourceKind::Volume => "VOLUME",
        }
    }

    pub fn from_api_str(s: &str) -> Option<Self> {
        match s {
            "FILESYSTEM" => Some(ResourceKind::Filesystem),
            "VOLUME" => Some(ResourceKind::Volume),
            _ => None,
        }
    }

    /// Value accepted by `--kind`.
    pub fn cli_name(self) -> &'static str {
        match self {
            ResourceKind::Filesystem => "filesystem",
            ResourceKind::Volume => "volume",
        }
    }

    pub fn properties(self) -> &'static [PropertySpec] {
        match self {
            ResourceKind::Filesystem => FILESYSTEM_PROPERTIES,
            ResourceKind::Volume => VOLUME_PROPERTIES,
        }
    }

    pub fn property(self, key: &str) -> Option<&'static PropertySpec> {
        self.properties().iter().find(|p| p.key == key)
    }

    /// Properties that must be present to create a resource of this kind.
    pub fn required_on_create(self) -> &'static [&'static str] {
        match self {
            ResourceKind::Filesystem => &[],
            ResourceKind::Volume => &["volsize"],
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Filesystem => write!(f, "dataset"),
            ResourceKind::Volume => write!(f, "volume"),
        }
    }
}

/// When a property may be set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutability {
    Mutable,
    /// Settable at creation; a differing desired value on an existing
    /// resource is an error.
    CreateOnly,
    /// Settable at creation; a desired value on an existing resource is
    /// ignored with a warning.
    CreateOnlyAdvisory,
    /// Creation option the CORE product variant does not understand.
    IgnoredOnCoreVariant,
}

/// How desired and observed values are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    EnumCaseInsensitive,
    SizeEquivalence,
    DirectString,
}

/// How a desired value is encoded into a create/update payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wire {
    Text,
    Bytes,
    /// Display token from the given table, or the caller's text when the
    /// table has no exact match.
    Token(&'static [(&'static str, u64)]),
    Bool,
}

impl Wire {
    /// Byte count of a size-like value. Capacities take a unit suffix,
    /// tokens only come from their table or a plain byte count.
    pub fn to_bytes(self, text: &str) -> Result<u64, ValidationError> {
        match self {
            Wire::Bytes => codec::parse_size(text),
            Wire::Token(tokens) => codec::parse_token(tokens, text),
            Wire::Text | Wire::Bool => Err(ValidationError::InvalidSize(text.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PropertySpec {
    pub key: &'static str,
    pub mutability: Mutability,
    pub strategy: Strategy,
    pub wire: Wire,
    /// Accepted values, compared case-insensitively. Empty means free-form.
    pub choices: &'static [&'static str],
}

impl PropertySpec {
    const fn new(key: &'static str, strategy: Strategy, wire: Wire) -> Self {
        Self {
            key,
            mutability: Mutability::Mutable,
            strategy,
            wire,
            choices: &[],
        }
    }

    const fn text(key: &'static str) -> Self {
        Self::new(key, Strategy::DirectString, Wire::Text)
    }

    const fn choice(key: &'static str, choices: &'static [&'static str]) -> Self {
        Self {
            choices,
            ..Self::new(key, Strategy::EnumCaseInsensitive, Wire::Text)
        }
    }

    const fn bytes(key: &'static str) -> Self {
        Self::new(key, Strategy::SizeEquivalence, Wire::Bytes)
    }

    const fn block(key: &'static str, tokens: &'static [(&'static str, u64)]) -> Self {
        Self::new(key, Strategy::SizeEquivalence, Wire::Token(tokens))
    }

    const fn flag(key: &'static str, mutability: Mutability) -> Self {
        Self {
            mutability,
            ..Self::new(key, Strategy::DirectString, Wire::Bool)
        }
    }

    const fn with_mutability(self, mutability: Mutability) -> Self {
        Self { mutability, ..self }
    }

    const fn with_choices(self, choices: &'static [&'static str]) -> Self {
        Self { choices, ..self }
    }
}

const ON_OFF: &[&str] = &["on", "off"];
const SYNC: &[&str] = &["standard", "always", "disabled"];
const HIDDEN_VISIBLE: &[&str] = &["hidden", "visible"];
const COPIES: &[&str] = &["1", "2", "3"];

const FS_COMPRESSION: &[&str] = &[
    "off", "lz4", "gzip", "gzip-1", "gzip-2", "gzip-3", "gzip-4", "gzip-5", "gzip-6", "gzip-7",
    "gzip-8", "gzip-9", "zstd", "zstd-fast", "lzjb",
];
const FS_DEDUP: &[&str] = &["on", "off", "verify", "sha256", "sha512", "skein", "edonr"];
const FS_CHECKSUM: &[&str] = &[
    "on", "off", "fletcher2", "fletcher4", "sha256", "sha512", "skein", "edonr",
];
const RECORDSIZE: &[&str] = &[
    "512", "1K", "2K", "4K", "8K", "16K", "32K", "64K", "128K", "256K", "512K", "1M", "16M",
];
const VOLBLOCKSIZE: &[&str] = &[
    "512", "512B", "1K", "2K", "4K", "8K", "16K", "32K", "64K", "128K", "256K", "65536",
];

const VOL_COMPRESSION: &[&str] = &[
    "inherit", "lz4", "zstd", "gzip", "zstd-fast", "lz4hc", "gzip-1", "gzip-2", "gzip-3",
    "gzip-4", "gzip-5", "gzip-6", "gzip-7", "gzip-8", "gzip-9",
];
const VOL_DEDUP: &[&str] = &["inherit", "on", "off", "verify", "sha256"];
const VOL_CHECKSUM: &[&str] = &[
    "inherit", "on", "off", "fletcher2", "fletcher4", "sha256", "sha512", "skein",
];
const VOL_READONLY: &[&str] = &["on", "off", "inherit"];

pub static FILESYSTEM_PROPERTIES: &[PropertySpec] = &[
    PropertySpec::flag("create_ancestors", Mutability::IgnoredOnCoreVariant),
    PropertySpec::text("comments"),
    PropertySpec::choice("sync", SYNC),
    PropertySpec::choice("snapdev", HIDDEN_VISIBLE),
    PropertySpec::choice("compression", FS_COMPRESSION),
    PropertySpec::choice("atime", ON_OFF),
    PropertySpec::choice("exec", ON_OFF),
    PropertySpec::text("managedby"),
    PropertySpec::bytes("quota"),
    PropertySpec::text("quota_warning"),
    PropertySpec::text("quota_critical"),
    PropertySpec::bytes("refquota"),
    PropertySpec::text("refquota_warning"),
    PropertySpec::text("refquota_critical"),
    PropertySpec::bytes("reservation"),
    PropertySpec::bytes("refreservation"),
    PropertySpec::block("special_small_block_size", codec::BLOCK_TOKENS),
    PropertySpec::text("copies").with_choices(COPIES),
    PropertySpec::choice("snapdir", HIDDEN_VISIBLE),
    PropertySpec::choice("deduplication", FS_DEDUP),
    PropertySpec::choice("checksum", FS_CHECKSUM),
    PropertySpec::choice("readonly", ON_OFF),
    PropertySpec::block("recordsize", codec::RECORD_SIZE_TOKENS).with_choices(RECORDSIZE),
    PropertySpec::choice("aclmode", &["discard", "groupmask", "passthrough", "restricted"]),
    PropertySpec::choice("acltype", &["off", "nfsv4", "posix"]),
    PropertySpec::choice("xattr", &["on", "off", "sa"]),
];

pub static VOLUME_PROPERTIES: &[PropertySpec] = &[
    PropertySpec::flag("create_ancestors", Mutability::IgnoredOnCoreVariant),
    PropertySpec::bytes("volsize"),
    PropertySpec::block("volblocksize", codec::BLOCK_TOKENS)
        .with_mutability(Mutability::CreateOnly)
        .with_choices(VOLBLOCKSIZE),
    PropertySpec::flag("sparse", Mutability::CreateOnlyAdvisory),
    PropertySpec::text("comments"),
    PropertySpec::choice("sync", SYNC),
    PropertySpec::choice("compression", VOL_COMPRESSION),
    PropertySpec::choice("deduplication", VOL_DEDUP),
    PropertySpec::choice("checksum", VOL_CHECKSUM),
    PropertySpec::choice("readonly", VOL_READONLY),
    PropertySpec::text("copies").with_choices(COPIES),
    PropertySpec::bytes("reservation"),
    PropertySpec::bytes("refreservation"),
];
