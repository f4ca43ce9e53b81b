//! postsync-core - Core library for postsync
//!
//! This crate contains the post models, the local libSQL store, the remote
//! `/posts` client, and the offline-first sync engine shared by every
//! postsync front end.

pub mod config;
pub mod connectivity;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod models;
pub mod remote;
pub mod services;
pub mod sync;
pub mod util;

pub use config::{parse_client_config, ClientConfig, EngineConfig};
pub use connectivity::{ConnectivitySignal, ReconnectWatcher};
pub use error::{Error, Result};
pub use models::{
    DashboardStats, DrainSummary, MergedEntry, MergedView, PendingStatus, Post, PostId,
    RemotePost, SyncStatus,
};
pub use remote::{HttpRemoteStore, MockRemoteStore, RemoteError, RemoteStore};
pub use services::DatabaseService;
pub use sync::{AutoDrain, DeleteOutcome, PostSyncEngine};
