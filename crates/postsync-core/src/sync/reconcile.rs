//! Merging the local post set with cached remote pages.

use std::collections::HashSet;

use parking_lot::RwLock;

use crate::models::{MergedEntry, MergedView, Post, RemotePost};

/// Server ids confirmed deleted remotely during this engine's lifetime.
///
/// A deleting remote may keep serving stale pages, so merges drop these ids.
#[derive(Debug, Default)]
pub struct DeletedIds {
    ids: RwLock<HashSet<i64>>,
}

impl DeletedIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the id was not already excluded.
    pub fn insert(&self, server_id: i64) -> bool {
        self.ids.write().insert(server_id)
    }

    pub fn contains(&self, server_id: i64) -> bool {
        self.ids.read().contains(&server_id)
    }

    pub fn len(&self) -> usize {
        self.ids.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.read().is_empty()
    }
}

/// Build the merged view.
///
/// `local` must already be the visible posts in display order. Remote items
/// tracked locally or deleted during this session are dropped; the rest keep
/// their page order.
pub fn merge(local: Vec<Post>, remote: &[RemotePost], deleted: &DeletedIds) -> MergedView {
    let tracked = local
        .iter()
        .filter_map(|post| post.server_id)
        .collect::<HashSet<_>>();

    let excluded = deleted.ids.read();
    let mut seen = HashSet::new();
    let remote_entries = remote
        .iter()
        .filter(|item| !tracked.contains(&item.id) && !excluded.contains(&item.id))
        .filter(|item| seen.insert(item.id))
        .cloned()
        .map(MergedEntry::Remote)
        .collect::<Vec<_>>();
    drop(excluded);

    tracing::debug!(
        local = local.len(),
        remote = remote_entries.len(),
        dropped = remote.len() - remote_entries.len(),
        "Merged post view"
    );

    let mut entries = local.into_iter().map(MergedEntry::Local).collect::<Vec<_>>();
    entries.extend(remote_entries);
    MergedView { entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SyncStatus;
    use pretty_assertions::assert_eq;

    fn remote(id: i64) -> RemotePost {
        RemotePost {
            id,
            title: format!("Remote {id}"),
            body: "body".to_string(),
            user_id: Some(1),
        }
    }

    fn local(title: &str, server_id: Option<i64>) -> Post {
        let mut post = Post::new(title, "body");
        post.server_id = server_id;
        if server_id.is_some() {
            post.sync_status = SyncStatus::Synced;
        }
        post
    }

    #[test]
    fn local_first_then_untracked_remote_in_page_order() {
        let locals = vec![local("A", Some(3)), local("B", None)];
        let page = vec![remote(1), remote(3), remote(5)];

        let view = merge(locals, &page, &DeletedIds::new());

        let titles = view.iter().map(MergedEntry::title).collect::<Vec<_>>();
        assert_eq!(titles, vec!["A", "B", "Remote 1", "Remote 5"]);
        assert!(view.entries[0].is_local());
        assert!(!view.entries[2].is_local());
    }

    #[test]
    fn deleted_ids_are_excluded() {
        let deleted = DeletedIds::new();
        assert!(deleted.is_empty());
        assert!(deleted.insert(2));
        assert!(!deleted.insert(2));
        assert_eq!(deleted.len(), 1);

        let view = merge(Vec::new(), &[remote(1), remote(2), remote(3)], &deleted);
        assert_eq!(view.server_ids(), vec![1, 3]);
    }

    #[test]
    fn server_ids_never_repeat() {
        let page = vec![remote(4), remote(4), remote(6)];
        let view = merge(vec![local("Tracked", Some(6))], &page, &DeletedIds::new());

        assert_eq!(view.server_ids(), vec![6, 4]);
    }

    #[test]
    fn empty_inputs_produce_empty_view() {
        let view = merge(Vec::new(), &[], &DeletedIds::new());
        assert!(view.is_empty());
    }
}
