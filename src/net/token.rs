//! Bearer token store shared by the transport and the auth collaborator.
//!
//! DESIGN
//! ======
//! One store per process, passed explicitly to whoever needs it. The
//! transport reads it on every request and clears it on a 401; the auth
//! service sets it on login and clears it on logout.

#[cfg(test)]
#[path = "token_test.rs"]
mod token_test;

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Cloneable handle to the shared bearer token.
#[derive(Clone, Debug, Default)]
pub struct TokenStore {
    inner: Arc<RwLock<Option<String>>>,
}

impl TokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-seeded with `token`. Blank tokens are treated as absent.
    #[must_use]
    pub fn with_token(token: Option<String>) -> Self {
        let store = Self::new();
        if let Some(token) = token {
            store.set(token);
        }
        store
    }

    /// Current token, if any.
    #[must_use]
    pub fn get(&self) -> Option<String> {
        self.read().clone()
    }

    pub fn set(&self, token: String) {
        let token = token.trim().to_owned();
        *self.write() = if token.is_empty() { None } else { Some(token) };
    }

    pub fn clear(&self) {
        *self.write() = None;
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.get().is_some()
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<String>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<String>> {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
