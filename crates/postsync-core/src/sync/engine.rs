//! Reconciliation engine and drain coordinator.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::join_all;
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use super::locks::RecordLocks;
use super::reconcile::{merge, DeletedIds};
use super::transitions::{self, DeleteRoute, DrainAction, RemoteOutcome, UpdateRoute};
use crate::config::EngineConfig;
use crate::connectivity::ConnectivitySignal;
use crate::dashboard;
use crate::error::{Error, Result};
use crate::models::{
    DashboardStats, DrainOutcome, DrainSummary, MergedView, Post, PostId, RemotePost,
};
use crate::remote::{RemoteError, RemoteResult, RemoteStore};
use crate::services::DatabaseService;
use crate::util::normalize_text_option;

pub(super) const AUTO_DRAIN_SUMMARY_CAPACITY: usize = 16;

/// How a user-initiated delete settled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Confirmed remotely (or never existed there) and removed locally
    Removed,
    /// Tombstoned; the next drain finishes the delete
    Queued,
}

#[derive(Debug)]
struct PageCache {
    items: Vec<RemotePost>,
    next_page: usize,
    page_size: usize,
    can_load_more: bool,
}

/// Offline-first coordinator for posts.
///
/// Mutations try the remote store first and fall back to queued local
/// state; [`PostSyncEngine::drain_pending`] replays whatever is queued.
pub struct PostSyncEngine<R> {
    store: DatabaseService,
    remote: Arc<R>,
    connectivity: Arc<ConnectivitySignal>,
    config: EngineConfig,
    deleted: DeletedIds,
    locks: RecordLocks,
    pages: Mutex<PageCache>,
    drain_gate: tokio::sync::Mutex<()>,
}

impl<R: RemoteStore> PostSyncEngine<R> {
    pub fn new(
        store: DatabaseService,
        remote: Arc<R>,
        connectivity: Arc<ConnectivitySignal>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            remote,
            connectivity,
            pages: Mutex::new(PageCache {
                items: Vec::new(),
                next_page: 0,
                page_size: config.page_size,
                can_load_more: true,
            }),
            config,
            deleted: DeletedIds::new(),
            locks: RecordLocks::new(),
            drain_gate: tokio::sync::Mutex::new(()),
        }
    }

    pub const fn store(&self) -> &DatabaseService {
        &self.store
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn connectivity(&self) -> &ConnectivitySignal {
        &self.connectivity
    }

    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    /// True when the server id was deleted remotely during this session.
    pub fn is_remote_deleted(&self, server_id: i64) -> bool {
        self.deleted.contains(server_id)
    }

    /// Whether another page can be appended to the cached remote items
    pub fn can_load_more(&self) -> bool {
        self.pages.lock().can_load_more
    }

    /// Create a post, remotely when possible.
    pub async fn create_post(&self, title: &str, body: &str) -> Result<Post> {
        let title = normalize_text_option(Some(title.to_string()))
            .ok_or_else(|| Error::InvalidInput("post title must not be empty".to_string()))?;

        let outcome = self
            .attempt(self.remote.create(&title, body, self.config.author_id))
            .await
            .map(|created| created.id);
        let post = transitions::created(Post::new(title, body), outcome);

        self.store.create_post(&post).await?;
        tracing::debug!(
            local_id = %post.local_id,
            server_id = ?post.server_id,
            "Created post"
        );
        Ok(post)
    }

    /// Edit a post's title and/or body.
    ///
    /// Remote failures are recorded on the post; the local edit always lands.
    pub async fn update_post(
        &self,
        local_id: &PostId,
        title: Option<String>,
        body: Option<String>,
    ) -> Result<Post> {
        if title.as_deref().is_some_and(|title| title.trim().is_empty()) {
            return Err(Error::InvalidInput(
                "post title must not be empty".to_string(),
            ));
        }

        let _guard = self.locks.acquire(*local_id).await;
        let mut post = transitions::ensure_mutable(self.store.fetch_post(local_id).await?, local_id)?;
        if title.is_none() && body.is_none() {
            return Ok(post);
        }

        let patch = match transitions::update_route(&post) {
            UpdateRoute::LocalOnly => transitions::updated_local_only(&post, title, body),
            UpdateRoute::Remote(server_id) => {
                // Full content, so an earlier queued edit rides along.
                let sent_title = title.as_deref().unwrap_or(&post.title);
                let sent_body = body.as_deref().unwrap_or(&post.body);
                let outcome = self
                    .attempt(
                        self.remote
                            .update(server_id, Some(sent_title), Some(sent_body)),
                    )
                    .await
                    .map(|_| ());
                transitions::updated_remote(title, body, outcome)
            }
        };

        self.store.update_post(local_id, &patch).await?;
        post.apply(&patch);
        Ok(post)
    }

    /// Delete a post, remotely when possible.
    pub async fn delete_post(&self, local_id: &PostId) -> Result<DeleteOutcome> {
        let _guard = self.locks.acquire(*local_id).await;
        let post = transitions::ensure_mutable(self.store.fetch_post(local_id).await?, local_id)?;

        let server_id = match transitions::delete_route(&post) {
            DeleteRoute::LocalOnly => {
                self.store
                    .update_post(local_id, &transitions::delete_queued(None))
                    .await?;
                return Ok(DeleteOutcome::Queued);
            }
            DeleteRoute::Remote(server_id) => server_id,
        };

        let outcome = if self.is_online() {
            settle_delete(self.remote.delete(server_id).await)
        } else {
            Err(RemoteError::Offline.to_string())
        };

        match outcome {
            Ok(()) => {
                self.store.delete_post(local_id).await?;
                self.deleted.insert(server_id);
                Ok(DeleteOutcome::Removed)
            }
            Err(error) => {
                tracing::warn!(%local_id, server_id, "Delete queued: {error}");
                self.store
                    .update_post(local_id, &transitions::delete_queued(Some(error)))
                    .await?;
                Ok(DeleteOutcome::Queued)
            }
        }
    }

    /// Fetch a post by local id, tombstones included.
    pub async fn get_post(&self, local_id: &PostId) -> Result<Post> {
        self.store
            .fetch_post(local_id)
            .await?
            .ok_or_else(|| Error::NotFound(local_id.to_string()))
    }

    /// Start tracking a remote item locally so it can be edited or deleted.
    ///
    /// Returns the existing post when the server id is already tracked.
    pub async fn track_remote_post(&self, item: &RemotePost) -> Result<Post> {
        if self.deleted.contains(item.id) {
            return Err(Error::InvalidState(format!(
                "remote post {} was deleted",
                item.id
            )));
        }
        if let Some(existing) = self.store.fetch_post_by_server_id(item.id).await? {
            return Ok(existing);
        }

        let post = Post::from_remote(item);
        self.store.create_post(&post).await?;
        tracing::debug!(local_id = %post.local_id, server_id = item.id, "Tracking remote post");
        Ok(post)
    }

    /// Load remote page `page`, replacing the cached remote items.
    ///
    /// A failed fetch leaves the cache untouched.
    pub async fn get_merged_view(&self, page: usize, size: usize) -> Result<MergedView> {
        if size == 0 {
            return Err(Error::InvalidInput(
                "page size must be at least 1".to_string(),
            ));
        }
        let offset = page
            .checked_mul(size)
            .ok_or_else(|| Error::InvalidInput(format!("page {page} is out of range")))?;

        let posts = self.fetch_page(size, offset).await?;
        {
            let mut cache = self.pages.lock();
            cache.can_load_more = posts.len() == size;
            cache.items = posts;
            cache.next_page = page + 1;
            cache.page_size = size;
        }
        self.refresh_merged_view().await
    }

    /// Append the page after the last loaded one.
    ///
    /// Returns the current view without a remote call when offline or when
    /// the last page came back short.
    pub async fn load_next_page(&self) -> Result<MergedView> {
        let next = {
            let cache = self.pages.lock();
            cache
                .can_load_more
                .then_some((cache.next_page, cache.page_size))
        };
        let Some((page, size)) = next.filter(|_| self.is_online()) else {
            return self.refresh_merged_view().await;
        };

        let posts = self.fetch_page(size, page.saturating_mul(size)).await?;
        {
            let mut cache = self.pages.lock();
            if cache.next_page == page {
                cache.can_load_more = posts.len() == size;
                cache.items.extend(posts);
                cache.next_page = page + 1;
            }
        }
        self.refresh_merged_view().await
    }

    /// Re-merge local posts with the cached remote items; no remote call.
    pub async fn refresh_merged_view(&self) -> Result<MergedView> {
        let local = self.store.list_visible().await?;
        let remote = self.pages.lock().items.clone();
        Ok(merge(local, &remote, &self.deleted))
    }

    /// Counters for the dashboard, over the current merged view.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        let view = self.refresh_merged_view().await?;
        Ok(dashboard::aggregate(&view, self.config.recent_limit))
    }

    /// Replay every queued mutation concurrently.
    ///
    /// Each post settles independently; failures stay queued for the next
    /// drain. Overlapping calls run one after the other.
    pub async fn drain_pending(&self) -> Result<DrainSummary> {
        let _gate = self.drain_gate.lock().await;

        let queued = self
            .store
            .list_pending()
            .await?
            .into_iter()
            .filter(|post| post.pending_status.is_pending())
            .map(|post| post.local_id)
            .collect::<Vec<_>>();
        if queued.is_empty() {
            tracing::debug!("Drain found nothing queued");
            return Ok(DrainSummary::default());
        }

        tracing::info!("Draining {} queued post(s)", queued.len());
        let outcomes = join_all(queued.into_iter().map(|local_id| self.drain_one(local_id))).await;
        let summary = DrainSummary::from_outcomes(outcomes);
        tracing::info!(
            success = summary.success,
            failure = summary.failure,
            "Drain finished"
        );
        Ok(summary)
    }

    async fn drain_one(&self, local_id: PostId) -> DrainOutcome {
        match self.try_drain_one(local_id).await {
            Ok(outcome) => outcome,
            Err(error) => DrainOutcome::failed(local_id, format!("{local_id}: {error}")),
        }
    }

    async fn try_drain_one(&self, local_id: PostId) -> Result<DrainOutcome> {
        let _guard = self.locks.acquire(local_id).await;
        let Some(post) = self.store.fetch_post(&local_id).await? else {
            return Ok(DrainOutcome::succeeded(local_id));
        };

        let action = transitions::drain_action(&post);
        tracing::debug!(%local_id, ?action, "Dispatching queued post");

        let outcome: RemoteOutcome<()> = match action {
            DrainAction::Skip => Ok(()),
            DrainAction::Create => {
                let result = self
                    .remote
                    .create(&post.title, &post.body, self.config.author_id)
                    .await
                    .map(|created| created.id)
                    .map_err(|error| error.to_string());
                let settled = result.as_ref().map(|_| ()).map_err(Clone::clone);
                self.store
                    .update_post(&local_id, &transitions::drained_create(result))
                    .await?;
                settled
            }
            DrainAction::ResolveUpdateLocally => {
                self.store
                    .update_post(&local_id, &transitions::drained_update_locally(&post))
                    .await?;
                Ok(())
            }
            DrainAction::RemoteUpdate(server_id) => {
                let result = self
                    .remote
                    .update(server_id, Some(post.title.as_str()), Some(post.body.as_str()))
                    .await
                    .map(|_| ())
                    .map_err(|error| error.to_string());
                self.store
                    .update_post(&local_id, &transitions::drained_update(result.clone()))
                    .await?;
                result
            }
            DrainAction::RemoveLocally => {
                self.store.delete_post(&local_id).await?;
                if let Some(server_id) = post.server_id {
                    self.deleted.insert(server_id);
                }
                Ok(())
            }
            DrainAction::RemoteDelete(server_id) => {
                match settle_delete(self.remote.delete(server_id).await) {
                    Ok(()) => {
                        self.store.delete_post(&local_id).await?;
                        self.deleted.insert(server_id);
                        Ok(())
                    }
                    Err(error) => {
                        self.store
                            .update_post(
                                &local_id,
                                &transitions::drained_delete_failed(error.clone()),
                            )
                            .await?;
                        Err(error)
                    }
                }
            }
        };

        Ok(match outcome {
            Ok(()) => DrainOutcome::succeeded(local_id),
            Err(error) => {
                tracing::warn!(%local_id, "Drain failed: {error}");
                DrainOutcome::failed(local_id, format!("{local_id}: {error}"))
            }
        })
    }

    /// Run a remote call if online; offline short-circuits without calling.
    async fn attempt<T>(
        &self,
        call: impl Future<Output = RemoteResult<T>>,
    ) -> RemoteOutcome<T> {
        if !self.is_online() {
            return Err(RemoteError::Offline.to_string());
        }
        call.await.map_err(|error| {
            tracing::warn!("Remote call failed, keeping local state: {error}");
            error.to_string()
        })
    }

    async fn fetch_page(&self, limit: usize, offset: usize) -> Result<Vec<RemotePost>> {
        if !self.is_online() {
            return Err(RemoteError::Offline.into());
        }
        let page = self.remote.list(limit, offset).await?;
        tracing::debug!(limit, offset, received = page.posts.len(), "Fetched remote page");
        Ok(page.posts)
    }
}

impl<R: RemoteStore + 'static> PostSyncEngine<R> {
    /// Drain on every reconnect of the engine's connectivity signal.
    ///
    /// Reconnects that happened before this call are ignored. The loop stops
    /// when the returned handle is dropped. Summaries nobody reads are kept
    /// up to a small buffer; later ones are dropped.
    pub fn spawn_auto_drain(self: &Arc<Self>) -> AutoDrain {
        let engine = Arc::clone(self);
        let mut reconnects = self.connectivity.reconnects();
        let (sender, summaries) = mpsc::channel(AUTO_DRAIN_SUMMARY_CAPACITY);

        let handle = tokio::spawn(async move {
            while reconnects.next_reconnect().await.is_some() {
                match engine.drain_pending().await {
                    Ok(summary) => match sender.try_send(summary) {
                        Ok(()) => {}
                        Err(TrySendError::Full(summary)) => tracing::debug!(
                            success = summary.success,
                            failure = summary.failure,
                            "Summary buffer full, dropping drain summary"
                        ),
                        Err(TrySendError::Closed(_)) => break,
                    },
                    Err(error) => tracing::error!("Automatic drain failed: {error}"),
                }
            }
        });

        AutoDrain { handle, summaries }
    }
}

/// Handle to a running connectivity-triggered drain loop.
#[derive(Debug)]
pub struct AutoDrain {
    handle: JoinHandle<()>,
    summaries: mpsc::Receiver<DrainSummary>,
}

impl AutoDrain {
    /// Summary of the next completed drain.
    pub async fn next_summary(&mut self) -> Option<DrainSummary> {
        self.summaries.recv().await
    }
}

impl Drop for AutoDrain {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A 404 means the post is already gone remotely, which settles the delete.
fn settle_delete<T>(result: RemoteResult<T>) -> RemoteOutcome<()> {
    match result {
        Ok(_) => Ok(()),
        Err(error) if error.is_not_found() => Ok(()),
        Err(error) => Err(error.to_string()),
    }
}
