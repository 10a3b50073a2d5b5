//! Credential sources.
//!
//! The pipeline only reads the token and, on an expired session, asks the
//! owner to forget it. Storage belongs to the application's session store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

pub trait CredentialSource: Send + Sync {
    /// Current bearer token, if the user is signed in.
    fn token(&self) -> Option<String>;

    /// Forget the stored token. Must be idempotent.
    fn clear_token(&self);
}

/// For anonymous clients.
pub struct NoCredentials;

impl CredentialSource for NoCredentials {
    fn token(&self) -> Option<String> {
        None
    }

    fn clear_token(&self) {}
}

/// Process-local token store.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    token: RwLock<Option<String>>,
    clears: AtomicUsize,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
            clears: AtomicUsize::new(0),
        }
    }

    pub fn set_token(&self, token: impl Into<String>) {
        if let Ok(mut slot) = self.token.write() {
            *slot = Some(token.into());
        }
    }

    /// How many times `clear_token` has been called.
    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::Acquire)
    }
}

impl CredentialSource for InMemoryCredentialStore {
    fn token(&self) -> Option<String> {
        self.token
            .read()
            .ok()
            .and_then(|t| t.clone())
            .filter(|t| !t.is_empty())
    }

    fn clear_token(&self) {
        self.clears.fetch_add(1, Ordering::AcqRel);
        if let Ok(mut slot) = self.token.write() {
            *slot = None;
        }
    }
}

/// Token stored in the OS keyring under `(service, user)`.
#[cfg(feature = "keyring")]
pub struct KeyringCredentialStore {
    service: String,
    user: String,
}

#[cfg(feature = "keyring")]
impl KeyringCredentialStore {
    pub fn new(service: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            user: user.into(),
        }
    }

    pub fn store(&self, token: &str) -> crate::Result<()> {
        let entry = keyring::Entry::new(&self.service, &self.user)
            .map_err(|e| crate::Error::configuration(format!("keyring unavailable: {}", e)))?;
        entry
            .set_password(token)
            .map_err(|e| crate::Error::configuration(format!("keyring write failed: {}", e)))
    }
}

#[cfg(feature = "keyring")]
impl CredentialSource for KeyringCredentialStore {
    fn token(&self) -> Option<String> {
        let entry = keyring::Entry::new(&self.service, &self.user).ok()?;
        entry.get_password().ok()
    }

    fn clear_token(&self) {
        if let Ok(entry) = keyring::Entry::new(&self.service, &self.user) {
            if let Err(e) = entry.delete_password() {
                tracing::debug!(error = %e, "keyring entry already absent");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_is_idempotent() {
        let store = InMemoryCredentialStore::with_token("abc");
        assert_eq!(store.token().as_deref(), Some("abc"));
        store.clear_token();
        store.clear_token();
        assert_eq!(store.token(), None);
        assert_eq!(store.clear_count(), 2);
    }

    #[test]
    fn empty_token_reads_as_absent() {
        let store = InMemoryCredentialStore::new();
        store.set_token("");
        assert_eq!(store.token(), None);
    }
}
