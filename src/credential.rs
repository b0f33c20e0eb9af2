//! Bearer credential for the completion endpoint
//!
//! The pipeline only ever reads the current credential. Writing happens on
//! the settings side (`voxkb token set`, the `/token` console command).

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use secrecy::{ExposeSecret, SecretString};

use crate::{Error, Result};

/// Opaque bearer token
///
/// The token is never printed; `Debug` output is redacted.
#[derive(Debug)]
pub struct Credential(SecretString);

impl Credential {
    /// Wrap a token, treating empty or whitespace-only input as absent
    #[must_use]
    pub fn new(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        Some(Self(SecretString::from(token.to_string())))
    }

    /// Value for the `Authorization` header
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0.expose_secret())
    }
}

impl Clone for Credential {
    fn clone(&self) -> Self {
        Self(SecretString::from(self.0.expose_secret().to_string()))
    }
}

/// Storage the credential is read from
pub trait CredentialStore: Send + Sync {
    /// Current credential, if one is configured
    fn get(&self) -> Option<Credential>;

    /// Replace the stored credential
    ///
    /// # Errors
    ///
    /// Returns error if the token is empty or cannot be persisted
    fn set(&self, token: &str) -> Result<()>;

    /// Remove the stored credential
    ///
    /// # Errors
    ///
    /// Returns error if the stored credential cannot be removed
    fn clear(&self) -> Result<()>;
}

/// Process-local credential store
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: RwLock<Option<Credential>>,
}

impl MemoryCredentialStore {
    /// Create a store, optionally seeded with a token
    #[must_use]
    pub fn new(token: Option<&str>) -> Self {
        Self {
            token: RwLock::new(token.and_then(Credential::new)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Option<Credential> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    fn set(&self, token: &str) -> Result<()> {
        let credential = Credential::new(token)
            .ok_or_else(|| Error::Config("credential must not be empty".to_string()))?;
        if let Ok(mut t) = self.token.write() {
            *t = Some(credential);
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if let Ok(mut t) = self.token.write() {
            *t = None;
        }
        Ok(())
    }
}

/// Credential persisted in a single file
///
/// Every `get` re-reads the file so a token written by another process is
/// picked up without a restart.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the credential file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Option<Credential> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Credential::new(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to read credential file"
                );
                None
            }
        }
    }

    fn set(&self, token: &str) -> Result<()> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::Config("credential must not be empty".to_string()));
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, token)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::info!(path = %self.path.display(), "credential saved");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!(path = %self.path.display(), "credential removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
