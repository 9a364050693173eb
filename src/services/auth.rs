//! Auth service: owns who is signed in and the bearer token lifecycle.
//!
//! DESIGN
//! ======
//! The token is set on login and cleared on logout, on a failed restore, and
//! whenever a session reports `Unauthorized`. The transport also clears it on
//! any 401, so the two stay consistent even if this service is not told.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use crate::net::api::{ApiError, AuthApi};
use crate::net::token::TokenStore;
use crate::net::types::User;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("incorrect email or password")]
    InvalidCredentials,
    #[error("this email is already registered, please sign in instead")]
    EmailTaken,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Authentication state tracking the current user and loading status.
#[derive(Clone, Debug, Default)]
pub struct AuthState {
    pub user: Option<User>,
    pub loading: bool,
}

impl AuthState {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.user.as_ref().map(User::display_name)
    }
}

pub struct AuthService<A: AuthApi + ?Sized> {
    api: Arc<A>,
    tokens: TokenStore,
    state: Mutex<AuthState>,
}

impl<A: AuthApi + ?Sized> AuthService<A> {
    pub fn new(api: Arc<A>, tokens: TokenStore) -> Self {
        Self { api, tokens, state: Mutex::new(AuthState::default()) }
    }

    pub fn state(&self) -> AuthState {
        self.lock().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock().is_authenticated()
    }

    /// Re-validate a stored token via `/auth/me`. Clears the token if the
    /// backend no longer accepts it.
    pub async fn restore(&self) -> Option<User> {
        if !self.tokens.is_set() {
            return None;
        }
        self.lock().loading = true;
        let result = self.api.current_user().await;
        let mut state = self.lock();
        state.loading = false;
        match result {
            Ok(user) => {
                info!(user_id = user.id, "restored session");
                state.user = Some(user.clone());
                Some(user)
            }
            Err(e) => {
                warn!(error = %e, "stored token rejected; signing out");
                self.tokens.clear();
                state.user = None;
                None
            }
        }
    }

    /// Sign in, store the token, and load the user profile.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] on a 401, otherwise the
    /// underlying transport error. The token store is left empty on failure.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let token = match self.api.login(email, password).await {
            Ok(token) => token,
            Err(ApiError::Unauthorized) => return Err(AuthError::InvalidCredentials),
            Err(e) => return Err(e.into()),
        };
        self.tokens.set(token.access_token);

        match self.api.current_user().await {
            Ok(user) => {
                info!(user_id = user.id, "signed in");
                self.lock().user = Some(user.clone());
                Ok(user)
            }
            Err(e) => {
                self.tokens.clear();
                Err(e.into())
            }
        }
    }

    /// Create an account. The caller still has to [`AuthService::login`].
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::EmailTaken`] when the backend reports a duplicate
    /// email, otherwise the underlying transport error.
    pub async fn register(&self, email: &str, password: &str, full_name: &str) -> Result<User, AuthError> {
        self.api
            .register(email, password, full_name)
            .await
            .map_err(|e| match e {
                ApiError::Status { status: 400, ref body } if body.contains("already registered") => {
                    AuthError::EmailTaken
                }
                other => AuthError::Api(other),
            })
    }

    pub fn logout(&self) {
        self.tokens.clear();
        self.lock().user = None;
        info!("signed out");
    }

    /// React to a rejected credential reported by any caller.
    pub fn handle_unauthorized(&self) {
        warn!("credential rejected; returning to signed-out state");
        self.tokens.clear();
        self.lock().user = None;
    }

    fn lock(&self) -> MutexGuard<'_, AuthState> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
