//! Pulling remote snapshots into the local cache.

mod coordinator;
mod reconciler;

pub use coordinator::{SyncCoordinator, SyncSettings};
pub use reconciler::{stamp_favorites, ReconcileSummary, Reconciler};
