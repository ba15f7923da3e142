// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable credential storage: one JSON blob under a fixed file name.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::credential::Credential;

/// Fixed file name of the credential blob inside the state directory.
pub const CREDENTIAL_FILE: &str = "credential.json";

/// Backing storage shared by every tab of an origin.
pub trait CredentialStorage: Send + Sync {
    fn load(&self) -> anyhow::Result<Option<Credential>>;
    fn save(&self, credential: &Credential) -> anyhow::Result<()>;
    /// Remove the blob. Removing an absent blob succeeds.
    fn remove(&self) -> anyhow::Result<()>;
}

/// Credential blob persisted at `<state_dir>/credential.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(state_dir: &Path) -> Self {
        Self { path: state_dir.join(CREDENTIAL_FILE) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStorage for FileStorage {
    fn load(&self) -> anyhow::Result<Option<Credential>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn save(&self, credential: &Credential) -> anyhow::Result<()> {
        write_atomic(&self.path, &serde_json::to_string_pretty(credential)?)
    }

    fn remove(&self) -> anyhow::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Write `contents` to `path` atomically (write tmp + rename).
///
/// The temp name carries the PID and a counter so concurrent saves from
/// several tabs never interleave bytes in one file.
fn write_atomic(path: &Path, contents: &str) -> anyhow::Result<()> {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let tmp_name = format!(
        "{}.{}.{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy(),
        std::process::id(),
        seq,
    );
    let tmp_path = path.with_file_name(tmp_name);
    std::fs::write(&tmp_path, contents)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Volatile storage for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slot: Mutex<Option<Credential>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStorage for MemoryStorage {
    fn load(&self) -> anyhow::Result<Option<Credential>> {
        Ok(self.slot.lock().clone())
    }

    fn save(&self, credential: &Credential) -> anyhow::Result<()> {
        *self.slot.lock() = Some(credential.clone());
        Ok(())
    }

    fn remove(&self) -> anyhow::Result<()> {
        *self.slot.lock() = None;
        Ok(())
    }
}

#[cfg(test)]
#[path = "persist_tests.rs"]
mod tests;
