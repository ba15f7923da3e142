// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ErrorCode, SessionError};

/// Request paths containing any of these markers never carry a bearer token
/// and never trigger a refresh.
pub const DEFAULT_BYPASS_MARKERS: &[&str] = &["refresh-token", "login", "register"];

/// Configuration for an authenticated session against the storefront API.
#[derive(Debug, Clone, clap::Args)]
pub struct SessionConfig {
    /// Base URL of the backend API; request paths are joined onto it.
    #[arg(long, default_value = "http://127.0.0.1:5000/api", env = "KEEL_API_BASE_URL")]
    pub api_base_url: String,

    /// Directory holding the persisted credential. Defaults to the XDG state dir.
    #[arg(long, env = "KEEL_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Name of the broadcast channel used to sync the cart between tabs.
    #[arg(long, default_value = "cart_sync", env = "KEEL_CART_CHANNEL")]
    pub cart_channel: String,

    /// Per-request timeout in milliseconds.
    #[arg(long, default_value_t = 10_000, env = "KEEL_REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: u64,

    /// Route the user is sent to when the session expires.
    #[arg(long, default_value = "/login", env = "KEEL_LOGIN_PATH")]
    pub login_path: String,

    /// Path substrings that skip authentication (comma separated).
    #[arg(
        long = "bypass-marker",
        env = "KEEL_BYPASS_MARKERS",
        value_delimiter = ',',
        default_values = ["refresh-token", "login", "register"],
    )]
    pub bypass_markers: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:5000/api".to_owned(),
            state_dir: None,
            cart_channel: "cart_sync".to_owned(),
            request_timeout_ms: 10_000,
            login_path: "/login".to_owned(),
            bypass_markers: DEFAULT_BYPASS_MARKERS.iter().map(|m| (*m).to_owned()).collect(),
        }
    }
}

impl SessionConfig {
    /// Config pointed at `api_base_url` with every other field defaulted.
    pub fn for_api(api_base_url: impl Into<String>) -> Self {
        Self { api_base_url: api_base_url.into(), ..Self::default() }
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        let invalid = |msg: String| Err(SessionError::new(ErrorCode::BadRequest, msg));
        match reqwest::Url::parse(&self.api_base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => return invalid(format!("unsupported API scheme: {}", url.scheme())),
            Err(e) => return invalid(format!("invalid API URL {:?}: {e}", self.api_base_url)),
        }
        if self.cart_channel.trim().is_empty() {
            return invalid("cart channel name must not be empty".to_owned());
        }
        if self.request_timeout_ms == 0 {
            return invalid("request timeout must be positive".to_owned());
        }
        if !self.login_path.starts_with('/') {
            return invalid(format!("login path must be absolute: {:?}", self.login_path));
        }
        if self.bypass_markers.iter().any(|m| m.is_empty()) {
            return invalid("bypass markers must not be empty".to_owned());
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Resolve the state directory: explicit flag, `$XDG_STATE_HOME/keel`,
    /// `$HOME/.local/state/keel`, then `.keel` in the working directory.
    pub fn state_dir(&self) -> PathBuf {
        if let Some(ref dir) = self.state_dir {
            return dir.clone();
        }
        if let Some(xdg) = std::env::var_os("XDG_STATE_HOME").filter(|v| !v.is_empty()) {
            return PathBuf::from(xdg).join("keel");
        }
        if let Some(home) = std::env::var_os("HOME").filter(|v| !v.is_empty()) {
            return PathBuf::from(home).join(".local/state/keel");
        }
        PathBuf::from(".keel")
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
