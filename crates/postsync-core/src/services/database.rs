//! Shared database service wrapper used by the sync engine and clients.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::db::{Database, LibSqlPostRepository, PostRepository};
use crate::models::{Post, PostId, PostPatch};
use crate::Result;

/// Thread-safe service for DB and repository operations.
///
/// All writes funnel through one connection guarded by an async mutex, so the
/// store sees one writer at a time.
#[derive(Clone)]
pub struct DatabaseService {
    db: Arc<Mutex<Database>>,
    db_path: Option<PathBuf>,
}

impl DatabaseService {
    /// Open a database service at the given filesystem path.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        tracing::debug!("Opening post store at {}", db_path.display());
        let db = Database::open(&db_path).await?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: Some(db_path),
        })
    }

    /// Open an in-memory database service (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: None,
        })
    }

    /// Filesystem location of the database, if not in-memory.
    pub const fn db_path(&self) -> Option<&PathBuf> {
        self.db_path.as_ref()
    }

    /// Persist a post.
    pub async fn create_post(&self, post: &Post) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlPostRepository::new(db.connection());
        repo.create(post).await
    }

    /// Persist several posts atomically.
    pub async fn create_posts(&self, posts: &[Post]) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlPostRepository::new(db.connection());
        repo.create_many(posts).await
    }

    /// Apply a partial update; returns false when the post is unknown.
    pub async fn update_post(&self, local_id: &PostId, patch: &PostPatch) -> Result<bool> {
        let db = self.db.lock().await;
        let repo = LibSqlPostRepository::new(db.connection());
        repo.update(local_id, patch).await
    }

    /// Fetch a post by local id, including tombstones.
    pub async fn fetch_post(&self, local_id: &PostId) -> Result<Option<Post>> {
        let db = self.db.lock().await;
        let repo = LibSqlPostRepository::new(db.connection());
        repo.fetch(local_id).await
    }

    /// Fetch the post tracking a server id.
    pub async fn fetch_post_by_server_id(&self, server_id: i64) -> Result<Option<Post>> {
        let db = self.db.lock().await;
        let repo = LibSqlPostRepository::new(db.connection());
        repo.fetch_by_server_id(server_id).await
    }

    /// Visible posts, newest first.
    pub async fn list_visible(&self) -> Result<Vec<Post>> {
        let db = self.db.lock().await;
        let repo = LibSqlPostRepository::new(db.connection());
        repo.fetch_visible_sorted_by_created_desc().await
    }

    /// Posts owing remote work or not yet converged.
    pub async fn list_pending(&self) -> Result<Vec<Post>> {
        let db = self.db.lock().await;
        let repo = LibSqlPostRepository::new(db.connection());
        repo.fetch_pending().await
    }

    /// Most recent visible posts.
    pub async fn list_recent(&self, limit: usize) -> Result<Vec<Post>> {
        let db = self.db.lock().await;
        let repo = LibSqlPostRepository::new(db.connection());
        repo.fetch_recent_top_n(limit).await
    }

    /// Local ids of visible posts matching an id prefix.
    pub async fn list_post_ids_by_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<String>> {
        let db = self.db.lock().await;
        let repo = LibSqlPostRepository::new(db.connection());
        repo.fetch_ids_by_prefix(prefix, limit).await
    }

    /// Physically remove a post.
    pub async fn delete_post(&self, local_id: &PostId) -> Result<bool> {
        let db = self.db.lock().await;
        let repo = LibSqlPostRepository::new(db.connection());
        repo.delete(local_id).await
    }
}
