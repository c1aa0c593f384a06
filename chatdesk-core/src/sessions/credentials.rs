// File: src/sessions/credentials.rs
//
// Filesystem-backed credential storage, one directory per account. The
// adapter persists whatever auth artifacts the network hands it inside that
// directory; this store only manages the directory lifecycle. Purged on
// explicit logout, never on a transient disconnect.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::Error;

#[derive(Clone)]
pub struct CredentialStore {
    base_dir: PathBuf,
}

impl CredentialStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn session_dir(&self, account_id: i32) -> PathBuf {
        self.base_dir.join(format!("session-{}", account_id))
    }

    /// Creates (if needed) and returns the per-account credential directory.
    pub async fn ensure(&self, account_id: i32) -> Result<PathBuf, Error> {
        let dir = self.session_dir(account_id);
        tokio::fs::create_dir_all(&dir).await?;
        Ok(dir)
    }

    /// Removes the per-account credential directory and everything in it.
    /// Missing directories are fine (nothing was ever persisted).
    pub async fn purge(&self, account_id: i32) -> Result<(), Error> {
        let dir = self.session_dir(account_id);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {
                info!("Purged credentials for account {} at {:?}", account_id, dir);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!("Failed to purge credentials for account {}: {}", account_id, e);
                Err(e.into())
            }
        }
    }

    pub fn exists(&self, account_id: i32) -> bool {
        self.session_dir(account_id).exists()
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}
