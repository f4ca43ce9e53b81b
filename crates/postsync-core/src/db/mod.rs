//! Database layer for postsync

mod connection;
mod migrations;
mod repository;

pub use connection::Database;
pub use repository::{LibSqlPostRepository, PostRepository};
