//! Push synchronization: reconciliation, custom fields and batch runs

pub mod batch;
pub mod custom_fields;
pub mod reconcile;

pub use batch::{BatchDriver, PushParams, PushSummary};
pub use custom_fields::CustomFieldReport;
pub use reconcile::{PushOutcome, Reconciler, SyncBranch};
