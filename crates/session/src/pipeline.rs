// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-request authorization.
//!
//! Each outgoing request decides once, at entry, whether it goes anonymous,
//! carries the stored token, or waits for the refresh coordinator. Cookies
//! are attached by the HTTP client regardless of the outcome.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tracing::debug;

use crate::api::auth::{REFRESH_PATH, REGISTER_PATH};
use crate::api::{read_json, ApiClient, ApiRequest};
use crate::credential::refresh::RefreshOutcome;
use crate::credential::{AuthResponse, CredentialStore, RefreshCoordinator, RefreshTrigger};
use crate::error::{ErrorCode, SessionError};
use crate::events::SessionEvent;
use crate::token;

/// Where a request is in the authorization state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    /// No stored credential; the request goes without a bearer header.
    NotAuthenticated,
    CredentialValid,
    CredentialExpired,
    RefreshWaiting,
    Authorized,
    /// The refresh failed; the request is not sent.
    Failed,
}

impl RequestPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotAuthenticated => "not_authenticated",
            Self::CredentialValid => "credential_valid",
            Self::CredentialExpired => "credential_expired",
            Self::RefreshWaiting => "refresh_waiting",
            Self::Authorized => "authorized",
            Self::Failed => "failed",
        }
    }
}

/// Terminal result of authorizing one request.
#[derive(Clone, PartialEq, Eq)]
pub struct Authorization {
    pub phase: RequestPhase,
    pub bearer: Option<String>,
}

impl std::fmt::Debug for Authorization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authorization")
            .field("phase", &self.phase)
            .field("bearer", &self.bearer.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Authorization {
    fn anonymous() -> Self {
        Self { phase: RequestPhase::NotAuthenticated, bearer: None }
    }

    fn bearer(token: String) -> Self {
        Self { phase: RequestPhase::Authorized, bearer: Some(token) }
    }
}

pub struct RequestPipeline {
    api: Arc<ApiClient>,
    store: Arc<CredentialStore>,
    coordinator: Arc<RefreshCoordinator>,
    events: broadcast::Sender<SessionEvent>,
    bypass_markers: Vec<String>,
}

impl RequestPipeline {
    pub fn new(
        api: Arc<ApiClient>,
        store: Arc<CredentialStore>,
        coordinator: Arc<RefreshCoordinator>,
        events: broadcast::Sender<SessionEvent>,
        bypass_markers: Vec<String>,
    ) -> Self {
        Self { api, store, coordinator, events, bypass_markers }
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    pub fn coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.coordinator
    }

    /// Whether `path` skips authorization entirely (login, register, refresh).
    pub fn is_bypassed(&self, path: &str) -> bool {
        self.bypass_markers.iter().any(|m| path.contains(m.as_str()))
    }

    /// Run the authorization state machine for a request to `path`.
    pub async fn authorize(&self, path: &str) -> Result<Authorization, SessionError> {
        if self.is_bypassed(path) {
            debug!(path, "auth bypassed");
            return Ok(Authorization::anonymous());
        }
        let Some(current) = self.store.token() else {
            debug!(path, phase = RequestPhase::NotAuthenticated.as_str());
            return Ok(Authorization::anonymous());
        };
        if !token::is_expired(&current) {
            debug!(path, phase = RequestPhase::CredentialValid.as_str());
            return Ok(Authorization::bearer(current));
        }

        debug!(path, phase = RequestPhase::CredentialExpired.as_str());
        debug!(path, phase = RequestPhase::RefreshWaiting.as_str());
        let api = Arc::clone(&self.api);
        let outcome = self
            .coordinator
            .ensure_fresh_credential(&current, RefreshTrigger::Expired, move || call_refresh(api))
            .await;
        match outcome {
            Ok(cred) => {
                debug!(path, phase = RequestPhase::Authorized.as_str(), "resumed after refresh");
                Ok(Authorization::bearer(cred.access_token))
            }
            Err(e) => {
                debug!(path, phase = RequestPhase::Failed.as_str(), err = %e);
                Err(e)
            }
        }
    }

    /// Start (or join) a refresh cycle regardless of the stored token.
    pub async fn force_refresh(&self, trigger: RefreshTrigger) -> RefreshOutcome {
        let api = Arc::clone(&self.api);
        self.coordinator.refresh(trigger, move || call_refresh(api)).await
    }

    /// Authorize and send `req`. Failures are published as error notices
    /// (with a few exceptions) and always returned to the caller.
    pub async fn send(&self, req: ApiRequest) -> Result<reqwest::Response, SessionError> {
        let auth = self.authorize(&req.path).await?;
        match self.api.execute(&req, auth.bearer.as_deref()).await {
            Ok(resp) => Ok(resp),
            Err(e) => {
                debug!(path = %req.path, status = ?e.status, code = %e.code, "request failed");
                self.notify_failure(&req.path, &e);
                Err(e)
            }
        }
    }

    pub async fn send_json<T: DeserializeOwned>(&self, req: ApiRequest) -> Result<T, SessionError> {
        let resp = self.send(req).await?;
        read_json(resp).await
    }

    fn notify_failure(&self, path: &str, err: &SessionError) {
        if err.code == ErrorCode::SessionExpired || path.contains(REFRESH_PATH) {
            return;
        }
        // Registration validation errors are shown inline by the form.
        if path.contains(REGISTER_PATH) && matches!(err.status, Some(400 | 409)) {
            return;
        }
        let _ = self.events.send(SessionEvent::error(err.message.clone()));
    }
}

impl std::fmt::Debug for RequestPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestPipeline")
            .field("api", &self.api)
            .field("bypass_markers", &self.bypass_markers)
            .finish_non_exhaustive()
    }
}

async fn call_refresh(api: Arc<ApiClient>) -> Result<AuthResponse, SessionError> {
    api.refresh_token().await
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
