// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Render session events for a terminal.

use keel_session::events::{NoticeLevel, SessionEvent};
use tokio::sync::broadcast;

/// Human-readable line for `event`, or `None` if it is not worth showing.
pub fn render(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::Notice { level, title, message } => {
            let level = match level {
                NoticeLevel::Info => "info",
                NoticeLevel::Warning => "warning",
                NoticeLevel::Error => "error",
            };
            Some(match title {
                Some(title) => format!("{level}: {title}: {message}"),
                None => format!("{level}: {message}"),
            })
        }
        SessionEvent::SessionExpired { login_path } => {
            Some(format!("session expired: sign in again ({login_path})"))
        }
        SessionEvent::SignedIn { .. } | SessionEvent::SignedOut => None,
    }
}

/// Print every buffered event to stderr.
pub fn report(events: &mut broadcast::Receiver<SessionEvent>) {
    loop {
        match events.try_recv() {
            Ok(event) => {
                if let Some(line) = render(&event) {
                    eprintln!("{line}");
                }
            }
            Err(broadcast::error::TryRecvError::Lagged(n)) => {
                tracing::debug!(skipped = n, "dropped session events");
            }
            Err(_) => break,
        }
    }
}

#[cfg(test)]
#[path = "notice_tests.rs"]
mod tests;
