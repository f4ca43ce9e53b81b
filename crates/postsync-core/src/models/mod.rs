//! Data models for postsync

mod post;
mod remote;
mod view;

pub use post::{PendingStatus, Post, PostId, PostPatch, SyncStatus};
pub use remote::{CreatePostRequest, DeleteConfirmation, RemotePage, RemotePost, UpdatePostRequest};
pub use view::{DashboardStats, DrainOutcome, DrainSummary, MergedEntry, MergedView};
