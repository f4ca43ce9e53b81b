//! Dashboard counters over the merged view.

use crate::models::{DashboardStats, MergedEntry, MergedView, SyncStatus};

/// Summarize a merged view.
///
/// Remote-only entries count toward the total only. A local-only post is
/// counted once, under `local_only_count`, even while it has a queued create.
pub fn aggregate(view: &MergedView, recent_limit: usize) -> DashboardStats {
    let mut stats = DashboardStats {
        total_count: view.len(),
        ..DashboardStats::default()
    };

    for entry in view {
        let MergedEntry::Local(post) = entry else {
            continue;
        };
        if post.sync_status == SyncStatus::LocalOnly {
            stats.local_only_count += 1;
        } else if post.sync_status == SyncStatus::NeedsSync || post.pending_status.is_pending() {
            stats.needs_sync_count += 1;
        }
        if stats.recent.len() < recent_limit {
            stats.recent.push(post.clone());
        }
    }

    stats
}
