// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential store: reads and writes go straight to the origin's durable
//! storage, so every tab of an origin sees the same credential. Only the
//! clear hooks are per tab.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::credential::{Credential, CredentialStorage};

/// Why the store was cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearReason {
    Logout,
    RefreshFailed,
}

impl ClearReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Logout => "logout",
            Self::RefreshFailed => "refresh_failed",
        }
    }
}

type ClearHook = Box<dyn Fn(ClearReason) + Send + Sync>;

pub struct CredentialStore {
    storage: Arc<dyn CredentialStorage>,
    /// Serializes this tab's read-modify-write in [`update`](Self::update).
    updates: Mutex<()>,
    on_clear: Mutex<Vec<ClearHook>>,
}

impl CredentialStore {
    pub fn open(storage: Arc<dyn CredentialStorage>) -> Self {
        Self { storage, updates: Mutex::new(()), on_clear: Mutex::new(Vec::new()) }
    }

    /// Current credential of the origin. An unreadable blob is logged and
    /// treated as signed out.
    pub fn get(&self) -> Option<Credential> {
        match self.storage.load() {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(err = %e, "failed to load persisted credential");
                None
            }
        }
    }

    pub fn token(&self) -> Option<String> {
        self.get().map(|c| c.access_token)
    }

    pub fn is_present(&self) -> bool {
        self.get().is_some()
    }

    /// Overwrite the credential unconditionally (last writer wins).
    pub fn set(&self, credential: Credential) {
        self.save(&credential);
    }

    /// Apply `f` to the stored credential, if any, and persist the result.
    /// Returns the updated credential.
    pub fn update(&self, f: impl FnOnce(&mut Credential)) -> Option<Credential> {
        let _update = self.updates.lock();
        let mut cred = self.get()?;
        f(&mut cred);
        self.save(&cred);
        Some(cred)
    }

    /// Drop the credential and run every clear hook. Safe to repeat.
    pub fn clear(&self, reason: ClearReason) {
        let had = self.is_present();
        if let Err(e) = self.storage.remove() {
            tracing::warn!(err = %e, "failed to remove persisted credential");
        }
        tracing::debug!(reason = reason.as_str(), had, "credential cleared");
        for hook in self.on_clear.lock().iter() {
            hook(reason);
        }
    }

    /// Register dependent-state cleanup to run on every [`clear`](Self::clear).
    pub fn on_clear(&self, hook: impl Fn(ClearReason) + Send + Sync + 'static) {
        self.on_clear.lock().push(Box::new(hook));
    }

    fn save(&self, credential: &Credential) {
        if let Err(e) = self.storage.save(credential) {
            tracing::warn!(err = %e, "failed to persist credential");
        }
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("present", &self.is_present())
            .field("hooks", &self.on_clear.lock().len())
            .finish()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
