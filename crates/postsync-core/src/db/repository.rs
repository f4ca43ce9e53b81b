//! Post repository implementation

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT

use crate::error::{Error, Result};
use crate::models::{Post, PostId, PostPatch};
use libsql::{params, Connection, Row, Value};

const POST_COLUMNS: &str = "local_id, server_id, title, body, created_at, updated_at, \
     is_deleted, pending_status, sync_status, last_sync_error, created_locally";

/// Trait for post storage operations (async)
#[allow(async_fn_in_trait)]
pub trait PostRepository {
    /// Insert a post, replacing any existing row with the same local id
    async fn create(&self, post: &Post) -> Result<()>;

    /// Insert several posts atomically
    async fn create_many(&self, posts: &[Post]) -> Result<()>;

    /// Apply a partial update; unknown local ids are a no-op.
    ///
    /// Returns whether a row was changed.
    async fn update(&self, local_id: &PostId, patch: &PostPatch) -> Result<bool>;

    /// Get a post by local id, tombstoned or not
    async fn fetch(&self, local_id: &PostId) -> Result<Option<Post>>;

    /// Get the post tracking the given server id, if any
    async fn fetch_by_server_id(&self, server_id: i64) -> Result<Option<Post>>;

    /// Non-deleted posts, newest first (ties in insertion order)
    async fn fetch_visible_sorted_by_created_desc(&self) -> Result<Vec<Post>>;

    /// Posts owing a remote operation, plus visible posts not yet converged
    async fn fetch_pending(&self) -> Result<Vec<Post>>;

    /// First `limit` posts of the visible ordering
    async fn fetch_recent_top_n(&self, limit: usize) -> Result<Vec<Post>>;

    /// Local ids of visible posts starting with `prefix`, most recently updated first
    async fn fetch_ids_by_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<String>>;

    /// Physically remove a post; returns whether a row was removed
    async fn delete(&self, local_id: &PostId) -> Result<bool>;
}

/// libSQL implementation of `PostRepository`
pub struct LibSqlPostRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlPostRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    async fn insert(&self, post: &Post) -> Result<()> {
        self.conn
            .execute(
                &format!(
                    "INSERT OR REPLACE INTO posts ({POST_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
                ),
                params![
                    post.local_id.as_str(),
                    post.server_id.map_or(Value::Null, Value::Integer),
                    post.title.as_str(),
                    post.body.as_str(),
                    post.created_at,
                    post.updated_at,
                    i64::from(post.is_deleted),
                    post.pending_status.as_str(),
                    post.sync_status.as_str(),
                    optional_text(post.last_sync_error.as_deref()),
                    i64::from(post.created_locally),
                ],
            )
            .await?;
        Ok(())
    }

    async fn query_posts(&self, sql: &str, params: impl libsql::params::IntoParams) -> Result<Vec<Post>> {
        let mut rows = self.conn.query(sql, params).await?;
        let mut posts = Vec::new();
        while let Some(row) = rows.next().await? {
            posts.push(Self::parse_post(&row)?);
        }
        Ok(posts)
    }

    /// Parse a post from a database row
    fn parse_post(row: &Row) -> Result<Post> {
        let local_id: String = row.get(0)?;
        let pending_status: String = row.get(7)?;
        let sync_status: String = row.get(8)?;

        Ok(Post {
            local_id: local_id
                .parse()
                .map_err(|_| Error::Database(format!("invalid local id '{local_id}'")))?,
            server_id: match row.get_value(1)? {
                Value::Integer(id) => Some(id),
                _ => None,
            },
            title: row.get(2)?,
            body: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
            is_deleted: row.get::<i64>(6)? != 0,
            pending_status: pending_status.parse()?,
            sync_status: sync_status.parse()?,
            last_sync_error: match row.get_value(9)? {
                Value::Text(text) => Some(text),
                _ => None,
            },
            created_locally: row.get::<i64>(10)? != 0,
        })
    }
}

fn optional_text(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |text| Value::Text(text.to_string()))
}

fn optional_flag(value: Option<bool>) -> Value {
    value.map_or(Value::Null, |flag| Value::Integer(i64::from(flag)))
}

impl PostRepository for LibSqlPostRepository<'_> {
    async fn create(&self, post: &Post) -> Result<()> {
        self.insert(post).await
    }

    async fn create_many(&self, posts: &[Post]) -> Result<()> {
        if posts.is_empty() {
            return Ok(());
        }

        self.conn.execute("BEGIN TRANSACTION", ()).await?;
        for post in posts {
            if let Err(e) = self.insert(post).await {
                self.conn.execute("ROLLBACK", ()).await.ok();
                return Err(e);
            }
        }
        if let Err(e) = self.conn.execute("COMMIT", ()).await {
            self.conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }
        Ok(())
    }

    async fn update(&self, local_id: &PostId, patch: &PostPatch) -> Result<bool> {
        let (touch_error, error_value) = match &patch.last_sync_error {
            Some(message) => (1_i64, optional_text(message.as_deref())),
            None => (0_i64, Value::Null),
        };

        let rows = self
            .conn
            .execute(
                "UPDATE posts SET
                    title = COALESCE(?, title),
                    body = COALESCE(?, body),
                    server_id = COALESCE(?, server_id),
                    is_deleted = COALESCE(?, is_deleted),
                    pending_status = COALESCE(?, pending_status),
                    sync_status = COALESCE(?, sync_status),
                    last_sync_error = CASE WHEN ? = 1 THEN ? ELSE last_sync_error END,
                    updated_at = ?
                 WHERE local_id = ?",
                params![
                    optional_text(patch.title.as_deref()),
                    optional_text(patch.body.as_deref()),
                    patch.server_id.map_or(Value::Null, Value::Integer),
                    optional_flag(patch.is_deleted),
                    optional_text(patch.pending_status.map(|status| status.as_str())),
                    optional_text(patch.sync_status.map(|status| status.as_str())),
                    touch_error,
                    error_value,
                    patch.updated_at,
                    local_id.as_str(),
                ],
            )
            .await?;

        Ok(rows > 0)
    }

    async fn fetch(&self, local_id: &PostId) -> Result<Option<Post>> {
        let posts = self
            .query_posts(
                &format!("SELECT {POST_COLUMNS} FROM posts WHERE local_id = ?"),
                params![local_id.as_str()],
            )
            .await?;
        Ok(posts.into_iter().next())
    }

    async fn fetch_by_server_id(&self, server_id: i64) -> Result<Option<Post>> {
        let posts = self
            .query_posts(
                &format!(
                    "SELECT {POST_COLUMNS} FROM posts WHERE server_id = ? ORDER BY rowid ASC LIMIT 1"
                ),
                params![server_id],
            )
            .await?;
        Ok(posts.into_iter().next())
    }

    async fn fetch_visible_sorted_by_created_desc(&self) -> Result<Vec<Post>> {
        self.query_posts(
            &format!(
                "SELECT {POST_COLUMNS} FROM posts
                 WHERE is_deleted = 0
                 ORDER BY created_at DESC, rowid ASC"
            ),
            (),
        )
        .await
    }

    async fn fetch_pending(&self) -> Result<Vec<Post>> {
        self.query_posts(
            &format!(
                "SELECT {POST_COLUMNS} FROM posts
                 WHERE pending_status != 'none'
                    OR (is_deleted = 0 AND sync_status IN ('local_only', 'needs_sync'))
                 ORDER BY updated_at ASC, rowid ASC"
            ),
            (),
        )
        .await
    }

    async fn fetch_recent_top_n(&self, limit: usize) -> Result<Vec<Post>> {
        self.query_posts(
            &format!(
                "SELECT {POST_COLUMNS} FROM posts
                 WHERE is_deleted = 0
                 ORDER BY created_at DESC, rowid ASC
                 LIMIT ?"
            ),
            params![limit as i64],
        )
        .await
    }

    async fn fetch_ids_by_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<String>> {
        let mut rows = self
            .conn
            .query(
                "SELECT local_id FROM posts
                 WHERE is_deleted = 0 AND local_id LIKE ?
                 ORDER BY updated_at DESC
                 LIMIT ?",
                params![format!("{prefix}%"), limit as i64],
            )
            .await?;

        let mut ids = Vec::new();
        while let Some(row) = rows.next().await? {
            ids.push(row.get::<String>(0)?);
        }
        Ok(ids)
    }

    async fn delete(&self, local_id: &PostId) -> Result<bool> {
        let rows = self
            .conn
            .execute(
                "DELETE FROM posts WHERE local_id = ?",
                params![local_id.as_str()],
            )
            .await?;
        Ok(rows > 0)
    }
}
