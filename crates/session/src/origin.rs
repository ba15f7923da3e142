// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The scope shared by every tab: durable credential storage, the cookie jar
//! and the named broadcast channels.

use std::path::Path;
use std::sync::Arc;

use reqwest::cookie::Jar;

use crate::cart::channel::{BroadcastChannel, ChannelRegistry};
use crate::credential::{CredentialStorage, FileStorage, MemoryStorage};

#[derive(Clone)]
pub struct Origin {
    storage: Arc<dyn CredentialStorage>,
    cookies: Arc<Jar>,
    channels: ChannelRegistry,
}

impl Origin {
    pub fn new(storage: Arc<dyn CredentialStorage>) -> Self {
        Self { storage, cookies: Arc::new(Jar::default()), channels: ChannelRegistry::default() }
    }

    /// Origin whose credential blob lives under `state_dir`.
    pub fn persistent(state_dir: &Path) -> Self {
        Self::new(Arc::new(FileStorage::new(state_dir)))
    }

    /// Origin that forgets everything when dropped.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    pub fn storage(&self) -> Arc<dyn CredentialStorage> {
        Arc::clone(&self.storage)
    }

    pub fn cookies(&self) -> Arc<Jar> {
        Arc::clone(&self.cookies)
    }

    /// Open (or join) the broadcast channel called `name`.
    pub fn channel(&self, name: &str) -> BroadcastChannel {
        self.channels.open(name)
    }
}

impl std::fmt::Debug for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Origin").field("channels", &self.channels).finish_non_exhaustive()
    }
}
