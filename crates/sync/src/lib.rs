pub mod diff;
pub mod reconcile;

pub use diff::{plan_sync, SyncPlan};
pub use reconcile::{reconcile, ReconciliationResult};
