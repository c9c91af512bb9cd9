//! Read-only access to the cluster object cache.

pub mod snapshot;
pub mod store;

pub use snapshot::{Snapshot, SnapshotStore};
pub use store::{Store, StoreError};
