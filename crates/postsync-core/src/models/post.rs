//! Post model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::RemotePost;
use crate::error::Error;
use crate::util::unix_millis_now;

/// A unique local identifier for a post, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostId(Uuid);

impl PostId {
    /// Create a new unique post ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for PostId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PostId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Remote operation still owed for a post
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingStatus {
    #[default]
    None,
    Create,
    Update,
    Delete,
}

impl PendingStatus {
    /// Persisted name of the status
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Whether a drain still has work to do for this post
    pub const fn is_pending(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for PendingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PendingStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(Error::InvalidInput(format!(
                "unknown pending status '{other}'"
            ))),
        }
    }
}

/// Convergence state of a post relative to the remote store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    #[default]
    Synced,
    LocalOnly,
    NeedsSync,
    Failed,
}

impl SyncStatus {
    /// Persisted name of the status
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Synced => "synced",
            Self::LocalOnly => "local_only",
            Self::NeedsSync => "needs_sync",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "synced" => Ok(Self::Synced),
            "local_only" => Ok(Self::LocalOnly),
            "needs_sync" => Ok(Self::NeedsSync),
            "failed" => Ok(Self::Failed),
            other => Err(Error::InvalidInput(format!("unknown sync status '{other}'"))),
        }
    }
}

/// A post tracked by the local store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Local primary key, assigned once at creation
    pub local_id: PostId,
    /// Server identifier, present once the post is confirmed remotely
    pub server_id: Option<i64>,
    pub title: String,
    pub body: String,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last local mutation timestamp (Unix ms)
    pub updated_at: i64,
    /// Tombstone flag, set while a delete awaits confirmation
    pub is_deleted: bool,
    pub pending_status: PendingStatus,
    pub sync_status: SyncStatus,
    /// Diagnostic message from the last failed remote call
    pub last_sync_error: Option<String>,
    /// True when the post was authored on this device
    pub created_locally: bool,
}

impl Post {
    /// Create a locally authored post that has not been reconciled yet.
    ///
    /// The caller applies a create transition before persisting it.
    #[must_use]
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        let now = unix_millis_now();
        Self {
            local_id: PostId::new(),
            server_id: None,
            title: title.into(),
            body: body.into(),
            created_at: now,
            updated_at: now,
            is_deleted: false,
            pending_status: PendingStatus::None,
            sync_status: SyncStatus::LocalOnly,
            last_sync_error: None,
            created_locally: true,
        }
    }

    /// Build a converged local copy of a remote item.
    #[must_use]
    pub fn from_remote(remote: &RemotePost) -> Self {
        let now = unix_millis_now();
        Self {
            local_id: PostId::new(),
            server_id: Some(remote.id),
            title: remote.title.clone(),
            body: remote.body.clone(),
            created_at: now,
            updated_at: now,
            is_deleted: false,
            pending_status: PendingStatus::None,
            sync_status: SyncStatus::Synced,
            last_sync_error: None,
            created_locally: false,
        }
    }

    /// True when nothing is owed to the remote store
    pub const fn is_converged(&self) -> bool {
        matches!(self.sync_status, SyncStatus::Synced) && !self.pending_status.is_pending()
    }

    /// True when the post has a confirmed remote identity
    pub const fn is_remote_backed(&self) -> bool {
        self.server_id.is_some()
    }

    /// Apply a partial update in memory, mirroring what the store does.
    pub fn apply(&mut self, patch: &PostPatch) {
        if let Some(title) = &patch.title {
            self.title.clone_from(title);
        }
        if let Some(body) = &patch.body {
            self.body.clone_from(body);
        }
        if let Some(server_id) = patch.server_id {
            self.server_id = Some(server_id);
        }
        if let Some(is_deleted) = patch.is_deleted {
            self.is_deleted = is_deleted;
        }
        if let Some(pending_status) = patch.pending_status {
            self.pending_status = pending_status;
        }
        if let Some(sync_status) = patch.sync_status {
            self.sync_status = sync_status;
        }
        if let Some(last_sync_error) = &patch.last_sync_error {
            self.last_sync_error.clone_from(last_sync_error);
        }
        self.updated_at = patch.updated_at;
    }
}

/// Partial field update for a stored post.
///
/// Unset fields are left untouched; `updated_at` is always written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostPatch {
    pub title: Option<String>,
    pub body: Option<String>,
    pub server_id: Option<i64>,
    pub is_deleted: Option<bool>,
    pub pending_status: Option<PendingStatus>,
    pub sync_status: Option<SyncStatus>,
    /// `Some(None)` clears the error, `Some(Some(_))` records one
    pub last_sync_error: Option<Option<String>>,
    pub updated_at: i64,
}

impl PostPatch {
    /// Empty patch stamped with the current time
    #[must_use]
    pub fn touch() -> Self {
        Self::at(unix_millis_now())
    }

    /// Empty patch stamped with the given time
    #[must_use]
    pub const fn at(updated_at: i64) -> Self {
        Self {
            title: None,
            body: None,
            server_id: None,
            is_deleted: None,
            pending_status: None,
            sync_status: None,
            last_sync_error: None,
            updated_at,
        }
    }

    #[must_use]
    pub fn content(mut self, title: Option<String>, body: Option<String>) -> Self {
        self.title = title;
        self.body = body;
        self
    }

    #[must_use]
    pub const fn server_id(mut self, server_id: i64) -> Self {
        self.server_id = Some(server_id);
        self
    }

    #[must_use]
    pub const fn deleted(mut self, is_deleted: bool) -> Self {
        self.is_deleted = Some(is_deleted);
        self
    }

    #[must_use]
    pub const fn status(mut self, pending: PendingStatus, sync: SyncStatus) -> Self {
        self.pending_status = Some(pending);
        self.sync_status = Some(sync);
        self
    }

    #[must_use]
    pub const fn sync_status(mut self, sync: SyncStatus) -> Self {
        self.sync_status = Some(sync);
        self
    }

    #[must_use]
    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.last_sync_error = Some(Some(message.into()));
        self
    }

    #[must_use]
    pub fn clear_error(mut self) -> Self {
        self.last_sync_error = Some(None);
        self
    }
}
