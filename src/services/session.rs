//! Session controller: applies user input and backend replies to session state.
//!
//! DESIGN
//! ======
//! The controller owns one [`SessionState`] behind a mutex that is never held
//! across an `.await`. Each chat/compare call flips the status to
//! `AwaitingResponse` before the request goes out and back to `Idle` when it
//! settles, so at most one round-trip is outstanding and every reply applies
//! to the latest request.
//!
//! Transport failures are absorbed into a fixed assistant message. The only
//! failure that also escapes to the caller is `Unauthorized`, which the auth
//! service reacts to by resetting the session.
//!
//! LATE RESPONSES
//! ==============
//! [`SessionController::reset`] bumps an epoch. A reply that settles under an
//! older epoch is dropped without touching state.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::connectivity;
use crate::net::api::{ApiError, ShopApi};
use crate::net::types::PhoneId;
use crate::state::chat::Author;
use crate::state::comparison::{MIN_COMPARISON, SelectionFull, Toggle};
use crate::state::session::{ConnectivityStatus, SessionState, SessionStatus};

pub const WELCOME_TEXT: &str = "Hi! I'm your AI mobile phone shopping assistant. I can help you find the perfect phone based on your needs, compare different models, and answer questions about specifications. What are you looking for?";
pub const CHAT_ERROR_TEXT: &str = "I'm sorry, I encountered an error processing your request. Please try again.";
pub const COMPARE_ERROR_TEXT: &str = "I'm sorry, I encountered an error comparing the phones. Please try again.";

/// Assistant message shown when the start-up health check fails.
#[must_use]
pub fn connection_failed_text(backend: &str) -> String {
    format!("I'm having trouble connecting to the server. Please make sure the backend is running at {backend}")
}

// =============================================================================
// TYPES
// =============================================================================

/// Rejections reported to the caller. None of them leave partial state behind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Input failed a precondition; no request was sent.
    #[error("{0}")]
    ValidationRejected(String),

    /// The comparison selection is full.
    #[error("you can compare up to {capacity} phones at once")]
    CapacityExceeded { capacity: usize },

    /// Another chat or compare request has not settled yet.
    #[error("a request is already in progress")]
    RequestInFlight,

    /// The backend rejected the credential; the user must sign in again.
    #[error("your session has expired, please sign in again")]
    Unauthorized,
}

impl From<SelectionFull> for SessionError {
    fn from(e: SelectionFull) -> Self {
        Self::CapacityExceeded { capacity: e.capacity }
    }
}

/// How an accepted chat/compare request settled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    /// The reply was applied to the session.
    Applied,
    /// The request failed and an assistant error message was appended instead.
    Absorbed,
    /// The session was reset while the request was in flight; nothing changed.
    Discarded,
}

struct Inner {
    state: SessionState,
    epoch: u64,
    session_id: Uuid,
}

// =============================================================================
// CONTROLLER
// =============================================================================

pub struct SessionController<A: ShopApi + ?Sized> {
    api: Arc<A>,
    backend: String,
    inner: Mutex<Inner>,
}

impl<A: ShopApi + ?Sized> SessionController<A> {
    /// Create an empty session. `backend` names the server in connectivity messages.
    pub fn new(api: Arc<A>, backend: impl Into<String>) -> Self {
        Self {
            api,
            backend: backend.into(),
            inner: Mutex::new(Inner { state: SessionState::default(), epoch: 0, session_id: Uuid::new_v4() }),
        }
    }

    /// Copy of the current state for rendering.
    pub fn snapshot(&self) -> SessionState {
        self.lock().state.clone()
    }

    /// Identifier sent with chat requests so the backend can group turns.
    pub fn session_id(&self) -> Uuid {
        self.lock().session_id
    }

    /// Probe the backend and seed the conversation with a single opening message.
    ///
    /// Re-running this (e.g. after sign-in) replaces the previous opening
    /// message instead of adding another. The rest of the conversation, and
    /// any request still in flight, is left alone.
    pub async fn initialize(&self, is_authenticated: bool) -> ConnectivityStatus {
        let epoch = self.lock().epoch;
        let connectivity = connectivity::probe(self.api.as_ref()).await;

        let mut inner = self.lock();
        if inner.epoch != epoch {
            debug!("session reset during health probe; dropping result");
            return connectivity;
        }
        let state = &mut inner.state;
        state.connectivity = connectivity;
        if let Some(id) = state.opening_message.take() {
            state.messages.remove(id);
        }
        state.opening_message = match connectivity {
            ConnectivityStatus::Connected if is_authenticated => Some(state.messages.push(Author::Assistant, WELCOME_TEXT)),
            ConnectivityStatus::Connected | ConnectivityStatus::Unknown => None,
            ConnectivityStatus::Disconnected => Some(
                state
                    .messages
                    .push(Author::Assistant, connection_failed_text(&self.backend)),
            ),
        };
        info!(?connectivity, is_authenticated, "session initialized");
        connectivity
    }

    /// Send `text` as a user turn and apply the assistant reply.
    ///
    /// The user message is appended before the request goes out. Any
    /// transport failure is turned into [`CHAT_ERROR_TEXT`].
    ///
    /// # Errors
    ///
    /// - [`SessionError::ValidationRejected`] if `text` is blank.
    /// - [`SessionError::RequestInFlight`] if a request is outstanding.
    /// - [`SessionError::Unauthorized`] after the error message is appended,
    ///   when the backend rejected the credential.
    pub async fn submit_user_message(&self, text: &str) -> Result<Completion, SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::ValidationRejected("message must not be empty".to_owned()));
        }

        let (epoch, session_id) = {
            let mut inner = self.lock();
            if inner.state.is_awaiting() {
                return Err(SessionError::RequestInFlight);
            }
            let state = &mut inner.state;
            state.messages.push(Author::User, text);
            state.status = SessionStatus::AwaitingResponse;
            state.recommendations.clear();
            (inner.epoch, inner.session_id.to_string())
        };
        debug!(len = text.len(), "chat request sent");

        let result = self.api.send_message(text, Some(&session_id)).await;

        let mut inner = self.lock();
        if inner.epoch != epoch {
            debug!("chat reply arrived after reset; discarding");
            return Ok(Completion::Discarded);
        }
        let state = &mut inner.state;
        state.status = SessionStatus::Idle;
        match result {
            Ok(reply) => {
                state.messages.push(Author::Assistant, reply.response);
                if let Some(comparison) = reply.comparison.as_deref() {
                    state.remember(comparison);
                }
                if let Some(phones) = reply.recommendations.filter(|p| !p.is_empty()) {
                    state.replace_recommendations(phones);
                }
                if reply.conversation_id.is_some() {
                    state.conversation_id = reply.conversation_id;
                }
                debug!(recommendations = state.recommendations.len(), "chat reply applied");
                Ok(Completion::Applied)
            }
            Err(e) => {
                warn!(error = %e, "chat request failed");
                state.messages.push(Author::Assistant, CHAT_ERROR_TEXT);
                absorb(&e)
            }
        }
    }

    /// Add `id` to the comparison selection, or remove it if already selected.
    ///
    /// # Errors
    ///
    /// - [`SessionError::ValidationRejected`] when adding a phone that is not
    ///   in the current recommendations.
    /// - [`SessionError::CapacityExceeded`] when adding to a full selection.
    pub fn toggle_comparison_member(&self, id: PhoneId) -> Result<Toggle, SessionError> {
        let mut inner = self.lock();
        let state = &mut inner.state;
        if !state.is_selected(id) && state.recommended(id).is_none() {
            return Err(SessionError::ValidationRejected(format!("phone {id} is not in the current recommendations")));
        }
        let toggle = state.selection.toggle(id)?;
        if state.selection.is_empty() {
            state.comparison_visible = false;
        }
        debug!(id, ?toggle, selected = state.selection.len(), "comparison selection toggled");
        Ok(toggle)
    }

    /// Drop `id` from the selection. Returns whether it was selected.
    pub fn remove_comparison_member(&self, id: PhoneId) -> bool {
        let mut inner = self.lock();
        let state = &mut inner.state;
        let removed = state.selection.remove(id);
        if state.selection.is_empty() {
            state.comparison_visible = false;
        }
        removed
    }

    /// Ask the backend to compare the selected phones and reveal the comparison view.
    ///
    /// The selection is left as it was.
    ///
    /// # Errors
    ///
    /// - [`SessionError::ValidationRejected`] with fewer than two phones selected.
    /// - [`SessionError::RequestInFlight`] if a request is outstanding.
    /// - [`SessionError::Unauthorized`] after the error message is appended,
    ///   when the backend rejected the credential.
    pub async fn compare_selected(&self) -> Result<Completion, SessionError> {
        let (epoch, ids) = {
            let mut inner = self.lock();
            if inner.state.is_awaiting() {
                return Err(SessionError::RequestInFlight);
            }
            if inner.state.selection.len() < MIN_COMPARISON {
                return Err(SessionError::ValidationRejected(format!(
                    "please select at least {MIN_COMPARISON} phones to compare"
                )));
            }
            inner.state.status = SessionStatus::AwaitingResponse;
            (inner.epoch, inner.state.selection.ids().to_vec())
        };
        debug!(?ids, "compare request sent");

        let result = self.api.compare_phones(&ids).await;

        let mut inner = self.lock();
        if inner.epoch != epoch {
            debug!("compare reply arrived after reset; discarding");
            return Ok(Completion::Discarded);
        }
        let state = &mut inner.state;
        state.status = SessionStatus::Idle;
        match result {
            Ok(reply) => {
                state.messages.push(Author::Assistant, reply.response);
                if let Some(phones) = reply.comparison.as_deref() {
                    state.remember(phones);
                }
                state.comparison_visible = true;
                state.comparison_reveal_seq += 1;
                Ok(Completion::Applied)
            }
            Err(e) => {
                warn!(error = %e, "compare request failed");
                state.messages.push(Author::Assistant, COMPARE_ERROR_TEXT);
                absorb(&e)
            }
        }
    }

    /// Open the comparison view. Returns `false` (and stays closed) when nothing is selected.
    pub fn show_comparison(&self) -> bool {
        let mut inner = self.lock();
        let state = &mut inner.state;
        state.comparison_visible = !state.selection.is_empty();
        state.comparison_visible
    }

    pub fn hide_comparison(&self) {
        self.lock().state.comparison_visible = false;
    }

    /// Throw away all session state, e.g. on sign-out.
    ///
    /// Requests still in flight settle as [`Completion::Discarded`].
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.epoch += 1;
        inner.state = SessionState::default();
        inner.session_id = Uuid::new_v4();
        info!(epoch = inner.epoch, "session reset");
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn absorb(e: &ApiError) -> Result<Completion, SessionError> {
    if e.is_unauthorized() { Err(SessionError::Unauthorized) } else { Ok(Completion::Absorbed) }
}
