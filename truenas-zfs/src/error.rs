//! Error types for dataset and volume reconciliation.

use thiserror::Error;

use crate::middleware::MiddlewareError;
use crate::props::ResourceKind;

/// Malformed caller input.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Resource name is required")]
    NameRequired,

    #[error("Can't parse size '{0}'")]
    InvalidSize(String),

    #[error("Can't parse block size '{0}'")]
    InvalidBlockSize(String),

    #[error("Unknown property '{property}' for {kind} resources")]
    UnknownProperty { property: String, kind: ResourceKind },

    #[error("Invalid value '{value}' for '{property}': must be one of: {}", .choices.join(", "))]
    InvalidChoice {
        property: String,
        value: String,
        choices: Vec<&'static str>,
    },

    #[error("Property '{property}' expects {expected}")]
    InvalidType {
        property: String,
        expected: &'static str,
    },

    #[error("User property update for '{0}' sets both 'value' and 'remove'")]
    ConflictingUserPropertyUpdate(String),

    #[error("User property key is required")]
    UserPropertyKeyRequired,
}

/// Query responses whose shape does not match what the middleware documents.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("expected a JSON object for {0}")]
    NotAnObject(String),

    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error("unknown dataset type '{0}'")]
    UnknownKind(String),

    #[error("property '{property}' has unexpected shape: {found}")]
    PropertyShape { property: String, found: String },

    #[error("user property '{key}' has unexpected shape: {found}")]
    UserPropertyShape { key: String, found: String },

    #[error("expected a list of datasets, got {0}")]
    NotAList(String),
}

/// Reconciliation failure. Every variant is fatal to the call.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(
        "Cannot update '{property}' on existing {kind}. \
         Current={current_raw} => {current_parsed} vs. desired={desired_raw} => {desired_parsed}."
    )]
    ImmutableChange {
        property: String,
        kind: ResourceKind,
        current_raw: String,
        current_parsed: String,
        desired_raw: String,
        desired_parsed: String,
    },

    #[error(
        "Dataset '{name}' exists but is a {found}, not a {expected}. \
         Use --kind {} to manage it.", .found.cli_name()
    )]
    KindMismatch {
        name: String,
        expected: ResourceKind,
        found: ResourceKind,
    },

    #[error("{field} is required when creating a {kind}.")]
    MissingRequiredField {
        field: &'static str,
        kind: ResourceKind,
    },

    #[error("Error {action} {kind} '{name}': {source}")]
    Remote {
        action: &'static str,
        kind: ResourceKind,
        name: String,
        #[source]
        source: MiddlewareError,
    },

    #[error("Unexpected response for '{name}': {source}")]
    Decode {
        name: String,
        #[source]
        source: DecodeError,
    },
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
