//! `reqwest` client for the DummyJSON-shaped posts API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{RemoteError, RemoteResult, RemoteStore};
use crate::models::{
    CreatePostRequest, DeleteConfirmation, RemotePage, RemotePost, UpdatePostRequest,
};
use crate::util::{compact_text, is_http_url, normalize_text_option};

/// HTTP implementation of [`RemoteStore`].
#[derive(Debug, Clone)]
pub struct HttpRemoteStore {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRemoteStore {
    /// Builds a client for an explicit API base URL.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> RemoteResult<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url, client })
    }

    /// Returns the base URL this client was configured with.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post_url(&self, server_id: i64) -> String {
        format!("{}/posts/{server_id}", self.base_url)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> RemoteResult<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Api {
                status: status.as_u16(),
                message: parse_api_error(status, &body),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|error| {
            RemoteError::InvalidPayload(format!("{error}: {}", compact_text(&body)))
        })
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn list(&self, limit: usize, offset: usize) -> RemoteResult<RemotePage> {
        let response = self
            .client
            .get(format!("{}/posts", self.base_url))
            .query(&[("limit", limit), ("skip", offset)])
            .header("Accept", "application/json")
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn get(&self, server_id: i64) -> RemoteResult<RemotePost> {
        let response = self
            .client
            .get(self.post_url(server_id))
            .header("Accept", "application/json")
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn create(&self, title: &str, body: &str, author: i64) -> RemoteResult<RemotePost> {
        let response = self
            .client
            .post(format!("{}/posts/add", self.base_url))
            .json(&CreatePostRequest {
                title,
                body,
                user_id: author,
            })
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn update(
        &self,
        server_id: i64,
        title: Option<&str>,
        body: Option<&str>,
    ) -> RemoteResult<RemotePost> {
        let response = self
            .client
            .put(self.post_url(server_id))
            .json(&UpdatePostRequest { title, body })
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn delete(&self, server_id: i64) -> RemoteResult<DeleteConfirmation> {
        let response = self
            .client
            .delete(self.post_url(server_id))
            .header("Accept", "application/json")
            .send()
            .await?;
        Self::decode(response).await
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return message.trim().to_string();
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        trimmed
    }
}

fn normalize_base_url(raw: String) -> RemoteResult<String> {
    let base_url = normalize_text_option(Some(raw)).ok_or_else(|| {
        RemoteError::InvalidConfiguration("base URL must not be empty".to_string())
    })?;
    if is_http_url(&base_url) {
        Ok(base_url.trim_end_matches('/').to_string())
    } else {
        Err(RemoteError::InvalidConfiguration(
            "base URL must include http:// or https://".to_string(),
        ))
    }
}
