//! Reconciler for a single named dataset or volume.
//!
//! One query decides the branch; at most one mutating call follows:
//!
//! | desired  | exists | action                                   |
//! |----------|--------|------------------------------------------|
//! | absent   | no     | nothing                                  |
//! | absent   | yes    | recursive delete                         |
//! | present  | no     | create with every given property         |
//! | present  | yes    | update with the properties that differ   |
//!
//! Dry-run stops right before the mutating call and reports the payload.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::info;

use crate::desired::{DesiredState, Presence};
use crate::diff::{self, ChangeSet};
use crate::error::{ReconcileError, Result};
use crate::guard;
use crate::middleware::{DatasetClient, Middleware, MiddlewareError};
use crate::props::ResourceKind;
use crate::snapshot::ResourceSnapshot;
use crate::system::SystemInfo;

#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub changed: bool,
    pub resource: Option<ResourceSnapshot>,
    pub message: String,
    pub warnings: Vec<String>,
    /// Payload that was submitted, or would have been in dry-run mode.
    pub diff: Option<Map<String, Value>>,
}

impl Outcome {
    fn unchanged(message: String, resource: Option<ResourceSnapshot>) -> Self {
        Self {
            changed: false,
            resource,
            message,
            warnings: Vec::new(),
            diff: None,
        }
    }

    fn changed(message: String, resource: Option<ResourceSnapshot>) -> Self {
        Self {
            changed: true,
            ..Self::unchanged(message, resource)
        }
    }

    fn with_changes(mut self, changes: ChangeSet) -> Self {
        self.warnings.extend(changes.warnings);
        self.diff = Some(changes.payload);
        self
    }
}

fn title(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Filesystem => "Dataset",
        ResourceKind::Volume => "Volume",
    }
}

/// Reconciles resources of one kind against the middleware.
pub struct DatasetReconciler<'a> {
    client: DatasetClient<'a>,
    system: &'a SystemInfo,
    kind: ResourceKind,
}

impl<'a> DatasetReconciler<'a> {
    pub fn new(mw: &'a dyn Middleware, system: &'a SystemInfo, kind: ResourceKind) -> Self {
        Self {
            client: DatasetClient::new(mw),
            system,
            kind,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub async fn reconcile(&self, desired: &DesiredState) -> Result<Outcome> {
        desired.validate(self.kind)?;

        info!(
            name = %desired.name,
            kind = %self.kind,
            state = ?desired.state,
            dry_run = desired.dry_run,
            "Reconciling"
        );

        let observed = self.observe(&desired.name).await?;
        match (desired.state, observed) {
            (Presence::Absent, None) => Ok(Outcome::unchanged(
                format!("{} '{}' is already absent.", title(self.kind), desired.name),
                None,
            )),
            (Presence::Absent, Some(_)) => self.delete(desired).await,
            (Presence::Present, None) => self.create(desired).await,
            (Presence::Present, Some(existing)) => self.update(desired, existing).await,
        }
    }

    fn remote_error(
        &self,
        action: &'static str,
        name: &str,
    ) -> impl FnOnce(MiddlewareError) -> ReconcileError {
        let kind = self.kind;
        let name = name.to_string();
        move |source| ReconcileError::Remote {
            action,
            kind,
            name,
            source,
        }
    }

    fn decode(&self, name: &str, value: Value) -> Result<ResourceSnapshot> {
        ResourceSnapshot::decode(value).map_err(|source| ReconcileError::Decode {
            name: name.to_string(),
            source,
        })
    }

    async fn observe(&self, name: &str) -> Result<Option<ResourceSnapshot>> {
        let response = self
            .client
            .query(name)
            .await
            .map_err(self.remote_error("querying", name))?;
        ResourceSnapshot::decode_query(response).map_err(|source| ReconcileError::Decode {
            name: name.to_string(),
            source,
        })
    }

    async fn delete(&self, desired: &DesiredState) -> Result<Outcome> {
        let name = &desired.name;
        if desired.dry_run {
            return Ok(Outcome::changed(
                format!("Would delete {} '{}'.", self.kind, name),
                None,
            ));
        }

        self.client
            .delete(name, true)
            .await
            .map_err(self.remote_error("deleting", name))?;
        Ok(Outcome::changed(
            format!("Deleted {} '{}'.", self.kind, name),
            None,
        ))
    }

    async fn create(&self, desired: &DesiredState) -> Result<Outcome> {
        let name = &desired.name;
        for &field in self.kind.required_on_create() {
            if desired.get(field).is_none() {
                return Err(ReconcileError::MissingRequiredField {
                    field,
                    kind: self.kind,
                });
            }
        }

        let changes = diff::build_create(self.kind, desired, self.system)?;
        if desired.dry_run {
            let message = format!(
                "Would create {} '{}' with args={}",
                self.kind,
                name,
                Value::Object(changes.payload.clone())
            );
            return Ok(Outcome::changed(message, None).with_changes(changes));
        }

        let created = self
            .client
            .create(&changes.payload)
            .await
            .map_err(self.remote_error("creating", name))?;
        let resource = self.decode(name, created)?;
        Ok(
            Outcome::changed(format!("Created {} '{}'.", self.kind, name), Some(resource))
                .with_changes(changes),
        )
    }

    async fn update(&self, desired: &DesiredState, existing: ResourceSnapshot) -> Result<Outcome> {
        let name = &desired.name;
        if existing.kind != self.kind {
            return Err(ReconcileError::KindMismatch {
                name: name.clone(),
                expected: self.kind,
                found: existing.kind,
            });
        }

        let mut warnings = guard::check_immutable(self.kind, desired, &existing)?;
        let mut changes = diff::build_update(self.kind, desired, &existing)?;
        warnings.append(&mut changes.warnings);
        changes.warnings = warnings;

        if changes.is_empty() {
            let mut outcome = Outcome::unchanged(
                format!("{} '{}' is up to date.", title(self.kind), name),
                Some(existing),
            );
            outcome.warnings = changes.warnings;
            return Ok(outcome);
        }

        if desired.dry_run {
            let message = format!(
                "Would update {} '{}' with {}",
                self.kind,
                name,
                Value::Object(changes.payload.clone())
            );
            return Ok(Outcome::changed(message, None).with_changes(changes));
        }

        let updated = self
            .client
            .update(name, &changes.payload)
            .await
            .map_err(self.remote_error("updating", name))?;
        let resource = self.decode(name, updated)?;
        Ok(
            Outcome::changed(format!("Updated {} '{}'.", self.kind, name), Some(resource))
                .with_changes(changes),
        )
    }
}

fn empty_object_if_none<S: Serializer>(
    resource: &Option<ResourceSnapshot>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match resource {
        Some(r) => r.serialize(serializer),
        None => Map::new().serialize(serializer),
    }
}

/// Caller-facing result of one reconciliation.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Report {
    Success {
        changed: bool,
        #[serde(serialize_with = "empty_object_if_none")]
        resource: Option<ResourceSnapshot>,
        message: String,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        warnings: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        diff: Option<Map<String, Value>>,
    },
    Failed {
        failed: bool,
        message: String,
    },
}

impl Report {
    pub fn is_failed(&self) -> bool {
        matches!(self, Report::Failed { .. })
    }
}

impl From<Result<Outcome>> for Report {
    fn from(result: Result<Outcome>) -> Self {
        match result {
            Ok(outcome) => Report::Success {
                changed: outcome.changed,
                resource: outcome.resource,
                message: outcome.message,
                warnings: outcome.warnings,
                diff: outcome.diff,
            },
            Err(e) => Report::Failed {
                failed: true,
                message: e.to_string(),
            },
        }
    }
}
