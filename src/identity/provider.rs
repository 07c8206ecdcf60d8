use std::time::Duration;
use futures_util::future::{BoxFuture, FutureExt};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::principal::Identity;
use crate::config::AccessConfig;
use crate::error::{AppError, AppResult};
use crate::permissions::Grant;

/// Profile endpoint payload: the current user plus its server-issued grants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub user: Option<Identity>,
    #[serde(default, alias = "grants")]
    pub permissions: Vec<Grant>,
}

/// Decode a profile body. Some deployments wrap the payload as `{"data": {...}}`;
/// when a `data` key is present its contents must decode as a profile.
pub fn parse_profile(body: &str) -> Result<Profile, FetchError> {
    let decode = |e: serde_json::Error| FetchError::Decode(e.to_string());
    let mut value: serde_json::Value = serde_json::from_str(body).map_err(decode)?;
    let payload = match value.as_object_mut().and_then(|obj| obj.remove("data")) {
        Some(inner) => inner,
        None => value,
    };
    serde_json::from_value(payload).map_err(decode)
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("profile request failed: {0}")]
    Transport(String),
    #[error("profile endpoint answered HTTP {0}")]
    Status(u16),
    #[error("profile payload could not be decoded: {0}")]
    Decode(String),
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Status(401) | FetchError::Status(403) => AppError::auth("invalid_token".to_string(), err.to_string()),
            FetchError::Status(_) => AppError::upstream("profile_status".to_string(), err.to_string()),
            FetchError::Transport(_) => AppError::upstream("profile_unreachable".to_string(), err.to_string()),
            FetchError::Decode(_) => AppError::upstream("profile_decode".to_string(), err.to_string()),
        }
    }
}

/// Source of the profile and grant list for a bearer token.
pub trait ProfileSource: Send + Sync {
    fn fetch_profile<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Result<Profile, FetchError>>;
}

/// `ProfileSource` over the backend's HTTP profile endpoint.
#[derive(Clone)]
pub struct HttpProfileClient {
    url: String,
    client: reqwest::Client,
}

impl HttpProfileClient {
    pub fn new(cfg: &AccessConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.request_timeout_ms))
            .build()
            .map_err(|e| AppError::config("http_client".to_string(), e.to_string()))?;
        Ok(Self { url: cfg.profile_url(), client })
    }

    pub fn url(&self) -> &str { &self.url }

    async fn get(&self, token: &str) -> Result<Profile, FetchError> {
        let resp = self.client
            .get(&self.url)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let body = resp.text().await.map_err(|e| FetchError::Transport(e.to_string()))?;
        let profile = parse_profile(&body)?;
        debug!(url = %self.url, grants = profile.permissions.len(), "profile fetched");
        Ok(profile)
    }
}

impl ProfileSource for HttpProfileClient {
    fn fetch_profile<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Result<Profile, FetchError>> {
        self.get(token).boxed()
    }
}
