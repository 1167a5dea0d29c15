//! truenas-zfs: declarative reconciler for TrueNAS ZFS datasets and volumes
//!
//! Compares a desired state with what `pool.dataset.query` reports and
//! submits the smallest create, update or delete call that converges them.

pub mod codec;
pub mod compare;
pub mod desired;
pub mod diff;
pub mod error;
pub mod guard;
pub mod middleware;
pub mod props;
pub mod reconcile;
pub mod snapshot;
pub mod system;

pub use desired::{DesiredState, Presence, PropertyValue, UserProperty, UserPropertyUpdate};
pub use error::{ReconcileError, ValidationError};
pub use middleware::{Middleware, MiddlewareError, Midclt};
pub use props::ResourceKind;
pub use reconcile::{DatasetReconciler, Outcome, Report};
pub use snapshot::ResourceSnapshot;
pub use system::SystemInfo;
