use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] postsync_core::Error),
    #[error(transparent)]
    Remote(#[from] postsync_core::RemoteError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No post title provided")]
    EmptyTitle,
    #[error("Edited post body cannot be empty")]
    EmptyEditedBody,
    #[error("Post ID cannot be empty")]
    EmptyPostId,
    #[error("Post not found for id/prefix: {0}")]
    PostNotFound(String),
    #[error("{0}")]
    AmbiguousPostId(String),
    #[error("Editor command failed: {0}")]
    EditorFailed(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("`postsync {0}` needs the remote store; run it without --offline")]
    Offline(&'static str),
}
