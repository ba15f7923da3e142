// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session events delivered to UI-side observers.

use serde::{Deserialize, Serialize};

use crate::credential::UserProfile;

/// Broadcast buffer size for session events. Slow observers lag, never block.
pub const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    SignedIn { user: UserProfile },
    SignedOut,
    /// The refresh cycle failed; the user should be sent to `login_path`.
    SessionExpired { login_path: String },
    Notice {
        level: NoticeLevel,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        message: String,
    },
}

impl SessionEvent {
    pub fn info(message: impl Into<String>) -> Self {
        Self::Notice { level: NoticeLevel::Info, title: None, message: message.into() }
    }

    pub fn warning(title: Option<&str>, message: impl Into<String>) -> Self {
        Self::Notice {
            level: NoticeLevel::Warning,
            title: title.map(str::to_owned),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Notice { level: NoticeLevel::Error, title: None, message: message.into() }
    }
}
