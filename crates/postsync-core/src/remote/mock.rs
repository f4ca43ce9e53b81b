//! In-memory remote store for tests and offline demos.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{RemoteError, RemoteResult, RemoteStore};
use crate::models::{DeleteConfirmation, RemotePage, RemotePost};

/// Remote operation kinds, used for call counting and failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOp {
    List,
    Get,
    Create,
    Update,
    Delete,
}

#[derive(Debug, Default)]
struct MockState {
    posts: BTreeMap<i64, RemotePost>,
    next_id: i64,
    offline: bool,
    stale_deletes: bool,
    failing_ops: HashSet<RemoteOp>,
    failing_ids: HashSet<i64>,
    failing_titles: HashSet<String>,
    calls: HashMap<RemoteOp, usize>,
}

/// A scriptable [`RemoteStore`] backed by a map.
#[derive(Debug, Default)]
pub struct MockRemoteStore {
    state: Mutex<MockState>,
    latency: Option<Duration>,
}

impl MockRemoteStore {
    /// Creates an empty mock store; server ids start at 1.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                next_id: 1,
                ..MockState::default()
            }),
            latency: None,
        }
    }

    /// Creates a mock store pre-populated with the given posts.
    pub fn with_posts(posts: impl IntoIterator<Item = RemotePost>) -> Self {
        let store = Self::new();
        store.seed(posts);
        store
    }

    /// Adds an artificial delay to every call.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Inserts posts; later server-assigned ids continue after the largest one.
    pub fn seed(&self, posts: impl IntoIterator<Item = RemotePost>) {
        let mut state = self.state.lock();
        for post in posts {
            state.next_id = state.next_id.max(post.id + 1);
            state.posts.insert(post.id, post);
        }
    }

    /// Makes every call fail with [`RemoteError::Offline`].
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().offline = offline;
    }

    /// Confirms deletes without removing the post from later pages.
    pub fn set_stale_deletes(&self, stale: bool) {
        self.state.lock().stale_deletes = stale;
    }

    /// Makes every call of the given kind fail.
    pub fn fail_op(&self, op: RemoteOp, failing: bool) {
        let mut state = self.state.lock();
        if failing {
            state.failing_ops.insert(op);
        } else {
            state.failing_ops.remove(&op);
        }
    }

    /// Makes get/update/delete calls for a server id fail.
    pub fn fail_server_id(&self, server_id: i64) {
        self.state.lock().failing_ids.insert(server_id);
    }

    /// Makes create calls with the given title fail.
    pub fn fail_title(&self, title: impl Into<String>) {
        self.state.lock().failing_titles.insert(title.into());
    }

    /// Clears all injected failures.
    pub fn clear_failures(&self) {
        let mut state = self.state.lock();
        state.failing_ops.clear();
        state.failing_ids.clear();
        state.failing_titles.clear();
    }

    /// Number of calls made for the given operation.
    pub fn calls(&self, op: RemoteOp) -> usize {
        self.state.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Total number of mutating calls (create, update, delete).
    pub fn mutation_calls(&self) -> usize {
        self.calls(RemoteOp::Create) + self.calls(RemoteOp::Update) + self.calls(RemoteOp::Delete)
    }

    /// Snapshot of a stored post.
    pub fn post(&self, server_id: i64) -> Option<RemotePost> {
        self.state.lock().posts.get(&server_id).cloned()
    }

    async fn begin(&self, op: RemoteOp, server_id: Option<i64>) -> RemoteResult<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.state.lock();
        *state.calls.entry(op).or_insert(0) += 1;

        if state.offline {
            return Err(RemoteError::Offline);
        }
        if state.failing_ops.contains(&op) {
            return Err(injected_failure(op));
        }
        if server_id.is_some_and(|id| state.failing_ids.contains(&id)) {
            return Err(injected_failure(op));
        }
        Ok(())
    }
}

fn injected_failure(op: RemoteOp) -> RemoteError {
    RemoteError::Api {
        status: 503,
        message: format!("injected {op:?} failure"),
    }
}

fn not_found(server_id: i64) -> RemoteError {
    RemoteError::Api {
        status: 404,
        message: format!("Post with id '{server_id}' not found"),
    }
}

#[async_trait]
impl RemoteStore for MockRemoteStore {
    async fn list(&self, limit: usize, offset: usize) -> RemoteResult<RemotePage> {
        self.begin(RemoteOp::List, None).await?;
        let state = self.state.lock();
        let posts = state
            .posts
            .values()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect::<Vec<_>>();

        Ok(RemotePage {
            posts,
            total: i64::try_from(state.posts.len()).unwrap_or(i64::MAX),
            skip: i64::try_from(offset).unwrap_or(i64::MAX),
            limit: i64::try_from(limit).unwrap_or(i64::MAX),
        })
    }

    async fn get(&self, server_id: i64) -> RemoteResult<RemotePost> {
        self.begin(RemoteOp::Get, Some(server_id)).await?;
        self.state
            .lock()
            .posts
            .get(&server_id)
            .cloned()
            .ok_or_else(|| not_found(server_id))
    }

    async fn create(&self, title: &str, body: &str, author: i64) -> RemoteResult<RemotePost> {
        self.begin(RemoteOp::Create, None).await?;
        let mut state = self.state.lock();
        if state.failing_titles.contains(title) {
            return Err(injected_failure(RemoteOp::Create));
        }

        let post = RemotePost {
            id: state.next_id,
            title: title.to_string(),
            body: body.to_string(),
            user_id: Some(author),
        };
        state.next_id += 1;
        state.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update(
        &self,
        server_id: i64,
        title: Option<&str>,
        body: Option<&str>,
    ) -> RemoteResult<RemotePost> {
        self.begin(RemoteOp::Update, Some(server_id)).await?;
        let mut state = self.state.lock();
        let post = state
            .posts
            .get_mut(&server_id)
            .ok_or_else(|| not_found(server_id))?;
        if let Some(title) = title {
            post.title = title.to_string();
        }
        if let Some(body) = body {
            post.body = body.to_string();
        }
        Ok(post.clone())
    }

    async fn delete(&self, server_id: i64) -> RemoteResult<DeleteConfirmation> {
        self.begin(RemoteOp::Delete, Some(server_id)).await?;
        let mut state = self.state.lock();
        if !state.posts.contains_key(&server_id) {
            return Err(not_found(server_id));
        }
        if !state.stale_deletes {
            state.posts.remove(&server_id);
        }
        Ok(DeleteConfirmation {
            id: server_id,
            is_deleted: Some(true),
            deleted_on: Some(chrono::Utc::now().to_rfc3339()),
        })
    }
}
