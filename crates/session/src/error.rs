// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};
use std::fmt;

/// Message shown when the server could not be reached at all.
pub const NETWORK_MESSAGE: &str =
    "Unable to connect to server. Please check your internet connection.";

/// Message shown when the server gave no usable explanation.
pub const GENERIC_MESSAGE: &str = "An unexpected error occurred. Please try again.";

/// Failure kinds surfaced by the session layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// The refresh cycle failed; the session is gone and the user must log in.
    SessionExpired,
    Unauthorized,
    Forbidden,
    BadRequest,
    NotFound,
    Conflict,
    Upstream,
    Network,
    Timeout,
    Decode,
    Storage,
    Internal,
}

impl ErrorCode {
    /// Map an HTTP status (0 = no response) onto an error code.
    pub fn from_status(status: u16) -> Self {
        match status {
            0 => Self::Network,
            400 | 422 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            408 | 504 => Self::Timeout,
            409 => Self::Conflict,
            _ => Self::Upstream,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SessionExpired => "SESSION_EXPIRED",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::BadRequest => "BAD_REQUEST",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::Upstream => "UPSTREAM_ERROR",
            Self::Network => "NETWORK",
            Self::Timeout => "TIMEOUT",
            Self::Decode => "DECODE",
            Self::Storage => "STORAGE",
            Self::Internal => "INTERNAL",
        }
    }

    /// Authentication failures get distinct user-facing handling.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::SessionExpired | Self::Unauthorized)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by every session operation.
///
/// `Clone` so that one refresh outcome can be handed to every waiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionError {
    pub code: ErrorCode,
    /// HTTP status of the failed response, if there was one.
    pub status: Option<u16>,
    pub message: String,
}

impl SessionError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, status: None, message: message.into() }
    }

    pub fn session_expired(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SessionExpired, message)
    }

    /// Build an error from a non-success response and its raw body.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<ApiErrorBody>(body).ok();
        Self {
            code: ErrorCode::from_status(status),
            status: Some(status),
            message: user_message(parsed.as_ref(), status),
        }
    }

    /// Re-tag any refresh failure as a terminal session expiry, keeping the
    /// original status and message.
    pub fn into_session_expired(self) -> Self {
        Self { code: ErrorCode::SessionExpired, ..self }
    }

    pub fn is_auth_failure(&self) -> bool {
        self.code.is_auth_failure()
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} ({status}): {}", self.code, self.message),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<reqwest::Error> for SessionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::new(ErrorCode::Timeout, "Request timed out. Please try again.");
        }
        if err.is_decode() {
            return Self::new(ErrorCode::Decode, format!("invalid response body: {err}"));
        }
        if let Some(status) = err.status() {
            return Self {
                code: ErrorCode::from_status(status.as_u16()),
                status: Some(status.as_u16()),
                message: err.to_string(),
            };
        }
        if err.is_builder() {
            return Self::new(ErrorCode::Internal, format!("failed to build request: {err}"));
        }
        tracing::debug!(err = %err, "request did not reach the server");
        Self { code: ErrorCode::Network, status: Some(0), message: NETWORK_MESSAGE.to_owned() }
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(ErrorCode::Decode, err.to_string())
    }
}

/// Unified error envelope returned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub time_stamp: Option<String>,
}

/// Pick the message to show the user: the backend's `message`, then its
/// `detail`, then a fallback keyed on the status.
pub fn user_message(body: Option<&ApiErrorBody>, status: u16) -> String {
    if let Some(msg) = body.and_then(|b| non_empty(&b.message)) {
        return msg.to_owned();
    }
    if let Some(detail) = body.and_then(|b| non_empty(&b.detail)) {
        return detail.to_owned();
    }
    if status == 0 {
        return NETWORK_MESSAGE.to_owned();
    }
    GENERIC_MESSAGE.to_owned()
}

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().filter(|m| !m.trim().is_empty())
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
