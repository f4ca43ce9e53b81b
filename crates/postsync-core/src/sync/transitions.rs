//! Per-post sync state machine.
//!
//! The `(pending_status, sync_status)` pair is a post's lifecycle state. Each
//! function here maps a trigger plus its remote outcome to the record or
//! patch the store should persist, stamped with the current time.

use crate::error::{Error, Result};
use crate::models::{PendingStatus, Post, PostId, PostPatch, SyncStatus};
use crate::util::unix_millis_now;

/// Outcome of a remote call, reduced to what the state machine needs
pub type RemoteOutcome<T> = std::result::Result<T, String>;

/// Validate that a post exists and can still be mutated.
pub fn ensure_mutable(post: Option<Post>, local_id: &PostId) -> Result<Post> {
    let post = post.ok_or_else(|| Error::NotFound(local_id.to_string()))?;
    if post.is_deleted {
        return Err(Error::InvalidState(format!(
            "post {local_id} is already deleted and awaiting sync"
        )));
    }
    Ok(post)
}

/// Record for a freshly authored post after the create attempt.
pub fn created(mut post: Post, outcome: RemoteOutcome<i64>) -> Post {
    post.created_locally = true;
    post.updated_at = unix_millis_now();
    match outcome {
        Ok(server_id) => {
            post.server_id = Some(server_id);
            post.pending_status = PendingStatus::None;
            post.sync_status = SyncStatus::Synced;
            post.last_sync_error = None;
        }
        Err(error) => {
            post.server_id = None;
            post.pending_status = PendingStatus::Create;
            post.sync_status = SyncStatus::LocalOnly;
            post.last_sync_error = Some(error);
        }
    }
    post
}

/// Where a user-initiated update has to go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateRoute {
    /// Remote-backed post: try `PUT` by server id
    Remote(i64),
    /// Never reached the remote store: only local content changes
    LocalOnly,
}

pub const fn update_route(post: &Post) -> UpdateRoute {
    match (post.server_id, post.sync_status) {
        (_, SyncStatus::LocalOnly) | (None, _) => UpdateRoute::LocalOnly,
        (Some(server_id), _) => UpdateRoute::Remote(server_id),
    }
}

/// Update of a post that only exists locally; never calls the remote store.
///
/// App-authored posts keep whatever is already queued (a pending create
/// carries the latest content); anything else queues an update. A post
/// whose last replay failed stays `Failed` until a drain succeeds.
pub fn updated_local_only(post: &Post, title: Option<String>, body: Option<String>) -> PostPatch {
    let pending = if post.created_locally {
        post.pending_status
    } else {
        PendingStatus::Update
    };
    let sync = match post.sync_status {
        SyncStatus::Failed => SyncStatus::Failed,
        _ => SyncStatus::LocalOnly,
    };
    PostPatch::touch().content(title, body).status(pending, sync)
}

/// Update of a remote-backed post after the remote attempt.
///
/// Content is always written locally.
pub fn updated_remote(
    title: Option<String>,
    body: Option<String>,
    outcome: RemoteOutcome<()>,
) -> PostPatch {
    let patch = PostPatch::touch().content(title, body);
    match outcome {
        Ok(()) => patch
            .status(PendingStatus::None, SyncStatus::Synced)
            .clear_error(),
        Err(error) => patch
            .status(PendingStatus::Update, SyncStatus::NeedsSync)
            .error(error),
    }
}

/// Where a user-initiated delete has to go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteRoute {
    Remote(i64),
    LocalOnly,
}

pub const fn delete_route(post: &Post) -> DeleteRoute {
    match (post.server_id, post.sync_status) {
        (_, SyncStatus::LocalOnly) | (None, _) => DeleteRoute::LocalOnly,
        (Some(server_id), _) => DeleteRoute::Remote(server_id),
    }
}

/// Tombstone for a post whose delete is owed to the drain.
pub fn delete_queued(error: Option<String>) -> PostPatch {
    let patch = PostPatch::touch()
        .deleted(true)
        .status(PendingStatus::Delete, SyncStatus::NeedsSync);
    match error {
        Some(error) => patch.error(error),
        None => patch,
    }
}

/// What the drain does for one post
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainAction {
    /// Nothing owed
    Skip,
    /// `POST` the current content
    Create,
    /// Local copy already holds the latest content
    ResolveUpdateLocally,
    RemoteUpdate(i64),
    /// Never visible remotely, or authored here: drop the row
    RemoveLocally,
    RemoteDelete(i64),
}

pub const fn drain_action(post: &Post) -> DrainAction {
    match post.pending_status {
        PendingStatus::None => DrainAction::Skip,
        PendingStatus::Create => DrainAction::Create,
        PendingStatus::Update => match post.server_id {
            Some(server_id) if !post.created_locally => DrainAction::RemoteUpdate(server_id),
            _ => DrainAction::ResolveUpdateLocally,
        },
        PendingStatus::Delete => match post.server_id {
            Some(server_id) if !post.created_locally => DrainAction::RemoteDelete(server_id),
            _ => DrainAction::RemoveLocally,
        },
    }
}

/// Result of replaying a queued create.
pub fn drained_create(outcome: RemoteOutcome<i64>) -> PostPatch {
    match outcome {
        Ok(server_id) => PostPatch::touch()
            .server_id(server_id)
            .status(PendingStatus::None, SyncStatus::Synced)
            .clear_error(),
        Err(error) => PostPatch::touch()
            .status(PendingStatus::Create, SyncStatus::Failed)
            .error(error),
    }
}

/// Queued update settled without a remote call.
pub fn drained_update_locally(post: &Post) -> PostPatch {
    let sync = if post.server_id.is_some() {
        SyncStatus::Synced
    } else {
        SyncStatus::LocalOnly
    };
    PostPatch::touch()
        .status(PendingStatus::None, sync)
        .clear_error()
}

/// Result of replaying a queued update.
pub fn drained_update(outcome: RemoteOutcome<()>) -> PostPatch {
    match outcome {
        Ok(()) => PostPatch::touch()
            .status(PendingStatus::None, SyncStatus::Synced)
            .clear_error(),
        Err(error) => PostPatch::touch()
            .status(PendingStatus::Update, SyncStatus::Failed)
            .error(error),
    }
}

/// Failed replay of a queued delete; the tombstone stays.
pub fn drained_delete_failed(error: String) -> PostPatch {
    PostPatch::touch()
        .status(PendingStatus::Delete, SyncStatus::Failed)
        .error(error)
}
