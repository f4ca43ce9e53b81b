//! Remote post store: the paginated `/posts` collection keyed by server id.

mod http;
mod mock;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{DeleteConfirmation, RemotePage, RemotePost};

pub use http::HttpRemoteStore;
pub use mock::{MockRemoteStore, RemoteOp};

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Invalid remote configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Remote store is unreachable (offline)")]
    Offline,
    #[error("Remote HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Remote API error: {message} ({status})")]
    Api { status: u16, message: String },
    #[error("Invalid remote payload: {0}")]
    InvalidPayload(String),
}

impl RemoteError {
    /// True for a 404 from the API; the addressed post does not exist remotely.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Operations consumed from the remote store.
///
/// Implementations must be shareable across the drain fan-out.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// `GET /posts?limit=&skip=`
    async fn list(&self, limit: usize, offset: usize) -> RemoteResult<RemotePage>;

    /// `GET /posts/{id}`
    async fn get(&self, server_id: i64) -> RemoteResult<RemotePost>;

    /// `POST /posts/add`; the server assigns the id
    async fn create(&self, title: &str, body: &str, author: i64) -> RemoteResult<RemotePost>;

    /// `PUT /posts/{id}`
    async fn update(
        &self,
        server_id: i64,
        title: Option<&str>,
        body: Option<&str>,
    ) -> RemoteResult<RemotePost>;

    /// `DELETE /posts/{id}`
    async fn delete(&self, server_id: i64) -> RemoteResult<DeleteConfirmation>;
}
