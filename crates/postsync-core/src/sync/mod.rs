//! Offline-first synchronization of posts.
//!
//! - [`transitions`]: the per-post state machine
//! - [`reconcile`]: merging local posts with cached remote pages
//! - [`PostSyncEngine`]: mutations, pagination, and the drain coordinator

mod engine;
mod locks;
pub mod reconcile;
pub mod transitions;

#[cfg(test)]
mod tests;

pub use engine::{AutoDrain, DeleteOutcome, PostSyncEngine};
pub use locks::RecordLocks;
pub use reconcile::DeletedIds;
