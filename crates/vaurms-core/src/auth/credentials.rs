use std::sync::RwLock;

use tracing::{debug, warn};

use super::storage::DurableStorage;

/// Key the bearer token is persisted under.
const TOKEN_KEY: &str = "token";

/// Holder of the single live bearer token.
///
/// The in-process value is authoritative: durable storage is written through
/// on every change, but a failing backend never makes a write fail. Share one
/// instance per session behind an `Arc`.
pub struct CredentialStore {
    token: RwLock<Option<String>>,
    storage: Box<dyn DurableStorage>,
}

impl CredentialStore {
    /// Create a store seeded once from durable storage.
    pub fn open(storage: impl DurableStorage + 'static) -> Self {
        let token = match storage.get(TOKEN_KEY) {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read stored credential, starting signed out");
                None
            }
        };
        debug!(present = token.is_some(), "Credential store opened");

        Self {
            token: RwLock::new(token),
            storage: Box::new(storage),
        }
    }

    /// Current token, if any.
    pub fn get(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Whether a token is currently held. This is what route guards consult.
    pub fn is_present(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Replace the token, or purge it with `None`.
    pub fn set(&self, token: Option<String>) {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());

        let persisted = match token.as_deref() {
            Some(value) => self.storage.set(TOKEN_KEY, value),
            None => self.storage.remove(TOKEN_KEY),
        };
        if let Err(e) = persisted {
            warn!(error = %e, "Failed to persist credential, keeping it in memory only");
        }

        *guard = token;
    }

    /// Drop the token and every durable trace of it. Clearing an absent
    /// credential is a no-op.
    pub fn clear(&self) {
        if self.is_present() {
            self.set(None);
        }
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("present", &self.is_present())
            .finish()
    }
}
