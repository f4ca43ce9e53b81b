//! Per-post async locks.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OwnedMutexGuard;

use crate::models::PostId;

/// Hands out one async mutex per local id.
///
/// Entries nobody holds are pruned on the next acquisition, so the table
/// only grows with concurrently locked posts.
#[derive(Debug, Default)]
pub struct RecordLocks {
    table: Mutex<HashMap<PostId, Arc<tokio::sync::Mutex<()>>>>,
}

impl RecordLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to one post.
    pub async fn acquire(&self, local_id: PostId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut table = self.table.lock();
            table.retain(|id, lock| *id == local_id || Arc::strong_count(lock) > 1);
            Arc::clone(table.entry(local_id).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of live entries in the table
    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.lock().is_empty()
    }
}
