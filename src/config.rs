use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{AppError, AppResult};
use crate::permissions::LoadingPolicy;

/// Settings for the access layer. Unspecified JSON fields take the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AccessConfig {
    /// Base URL of the backend API, e.g. "https://api.example.com"
    pub api_base_url: String,
    /// Profile endpoint returning the user and its grants
    pub profile_path: String,

    pub login_route: String,
    /// Landing page shared by admin and supervisor tiers
    pub supervisor_landing_route: String,
    /// Used when a denied field user has no division to land on
    pub default_route: String,

    /// Behaviour of decisions while the grant fetch is in flight
    pub loading_policy: LoadingPolicy,
    pub request_timeout_ms: u64,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000".to_string(),
            profile_path: "/api/auth/me".to_string(),

            login_route: "/login".to_string(),
            supervisor_landing_route: "/supervisor/dashboard".to_string(),
            default_route: "/".to_string(),

            loading_policy: LoadingPolicy::Optimistic,
            request_timeout_ms: 10_000,
        }
    }
}

impl AccessConfig {
    pub fn from_json_str(text: &str) -> AppResult<Self> {
        let cfg: AccessConfig = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_file(path: &Path) -> AppResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Defaults overlaid with FIELDOPS_* environment variables.
    pub fn from_env() -> AppResult<Self> {
        Self::default().overlay(|k| std::env::var(k).ok())
    }

    /// Overlay values from a key lookup (environment in production, a map in tests).
    pub fn overlay<F>(mut self, get: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = get("FIELDOPS_API_URL") { self.api_base_url = v; }
        if let Some(v) = get("FIELDOPS_PROFILE_PATH") { self.profile_path = v; }
        if let Some(v) = get("FIELDOPS_LOGIN_ROUTE") { self.login_route = v; }
        if let Some(v) = get("FIELDOPS_SUPERVISOR_ROUTE") { self.supervisor_landing_route = v; }
        if let Some(v) = get("FIELDOPS_DEFAULT_ROUTE") { self.default_route = v; }
        if let Some(v) = get("FIELDOPS_LOADING_POLICY") {
            self.loading_policy = v.parse().map_err(|e: String| AppError::config("invalid_loading_policy", e.as_str()))?;
        }
        if let Some(v) = get("FIELDOPS_REQUEST_TIMEOUT_MS") {
            self.request_timeout_ms = v.trim().parse().map_err(|_| AppError::config("invalid_timeout".to_string(), format!("not a number: {}", v)))?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn profile_url(&self) -> String {
        format!("{}/{}", self.api_base_url.trim_end_matches('/'), self.profile_path.trim_start_matches('/'))
    }

    fn validate(&self) -> AppResult<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(AppError::config("missing_api_url", "api_base_url must not be empty"));
        }
        for (name, route) in [
            ("login_route", &self.login_route),
            ("supervisor_landing_route", &self.supervisor_landing_route),
            ("default_route", &self.default_route),
        ] {
            if !route.starts_with('/') {
                return Err(AppError::config("invalid_route".to_string(), format!("{} must start with '/': {}", name, route)));
            }
        }
        Ok(())
    }
}
