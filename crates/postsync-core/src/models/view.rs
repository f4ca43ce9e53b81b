//! Transient read-side aggregates (never persisted)

use serde::Serialize;

use super::{Post, PostId, RemotePost};

/// One row of the merged view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum MergedEntry {
    /// Tracked by the local store, authoritative locally
    Local(Post),
    /// Only known from the cached remote page
    Remote(RemotePost),
}

impl MergedEntry {
    pub const fn server_id(&self) -> Option<i64> {
        match self {
            Self::Local(post) => post.server_id,
            Self::Remote(remote) => Some(remote.id),
        }
    }

    pub const fn local_id(&self) -> Option<PostId> {
        match self {
            Self::Local(post) => Some(post.local_id),
            Self::Remote(_) => None,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Local(post) => &post.title,
            Self::Remote(remote) => &remote.title,
        }
    }

    pub fn body(&self) -> &str {
        match self {
            Self::Local(post) => &post.body,
            Self::Remote(remote) => &remote.body,
        }
    }

    pub const fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }
}

/// Local posts first, then the remote items not already tracked locally
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergedView {
    pub entries: Vec<MergedEntry>,
}

impl MergedView {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MergedEntry> {
        self.entries.iter()
    }

    /// Server ids in view order (local posts without one are skipped)
    pub fn server_ids(&self) -> Vec<i64> {
        self.entries
            .iter()
            .filter_map(MergedEntry::server_id)
            .collect()
    }
}

impl<'a> IntoIterator for &'a MergedView {
    type Item = &'a MergedEntry;
    type IntoIter = std::slice::Iter<'a, MergedEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Result of draining a single post
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrainOutcome {
    pub local_id: PostId,
    pub success: bool,
    pub error: Option<String>,
}

impl DrainOutcome {
    pub const fn succeeded(local_id: PostId) -> Self {
        Self {
            local_id,
            success: true,
            error: None,
        }
    }

    pub fn failed(local_id: PostId, error: impl Into<String>) -> Self {
        Self {
            local_id,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Aggregate result of one drain pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DrainSummary {
    pub success: usize,
    pub failure: usize,
    pub errors: Vec<String>,
}

impl DrainSummary {
    /// Fold per-post outcomes into counts
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = DrainOutcome>) -> Self {
        outcomes
            .into_iter()
            .fold(Self::default(), |mut summary, outcome| {
                if outcome.success {
                    summary.success += 1;
                } else {
                    summary.failure += 1;
                    if let Some(error) = outcome.error {
                        summary.errors.push(error);
                    }
                }
                summary
            })
    }

    /// Number of posts the drain dispatched
    pub const fn attempted(&self) -> usize {
        self.success + self.failure
    }
}

/// Summary counters for the dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_count: usize,
    pub local_only_count: usize,
    pub needs_sync_count: usize,
    pub recent: Vec<Post>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn summary_counts_successes_and_failures() {
        let a = PostId::new();
        let b = PostId::new();
        let c = PostId::new();

        let summary = DrainSummary::from_outcomes([
            DrainOutcome::succeeded(a),
            DrainOutcome::failed(b, "HTTP 500"),
            DrainOutcome::succeeded(c),
        ]);

        assert_eq!(
            summary,
            DrainSummary {
                success: 2,
                failure: 1,
                errors: vec!["HTTP 500".to_string()],
            }
        );
        assert_eq!(summary.attempted(), 3);
    }

    #[test]
    fn merged_entry_exposes_server_ids() {
        let local = Post::new("Local", "body");
        let remote = RemotePost {
            id: 9,
            title: "Remote".to_string(),
            body: "body".to_string(),
            user_id: None,
        };
        let view = MergedView {
            entries: vec![MergedEntry::Local(local), MergedEntry::Remote(remote)],
        };

        assert_eq!(view.server_ids(), vec![9]);
        assert!(view.entries[0].is_local());
        assert_eq!(view.entries[1].title(), "Remote");
    }
}
