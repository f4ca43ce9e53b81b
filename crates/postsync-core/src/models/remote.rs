//! Wire shapes of the remote `/posts` resource

use serde::{Deserialize, Serialize};

/// A post as returned by the remote store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePost {
    pub id: i64,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub user_id: Option<i64>,
}

/// One page of the remote collection (`GET /posts?limit=&skip=`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePage {
    pub posts: Vec<RemotePost>,
    pub total: i64,
    pub skip: i64,
    pub limit: i64,
}

/// Confirmation body of `DELETE /posts/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteConfirmation {
    pub id: i64,
    #[serde(default)]
    pub is_deleted: Option<bool>,
    #[serde(default)]
    pub deleted_on: Option<String>,
}

/// Body of `POST /posts/add`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub user_id: i64,
}

/// Body of `PUT /posts/{id}`; absent fields are left unchanged remotely
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdatePostRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<&'a str>,
}
