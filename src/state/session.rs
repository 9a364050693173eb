#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::collections::HashMap;

use super::chat::MessageLog;
use super::comparison::ComparisonSelection;
use crate::net::types::{Phone, PhoneId};

/// Whether a chat or compare round-trip is outstanding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionStatus {
    #[default]
    Idle,
    AwaitingResponse,
}

/// Backend reachability as determined at session start.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectivityStatus {
    #[default]
    Unknown,
    Connected,
    Disconnected,
}

/// Everything the presentation layer renders for one session.
///
/// Owned by the session controller; readers get clones via
/// `SessionController::snapshot`.
#[derive(Clone, Debug, Default)]
pub struct SessionState {
    pub messages: MessageLog,
    /// Id of the welcome or connection-failure message, if one is shown.
    pub opening_message: Option<u64>,
    /// Phones from the most recent successful chat reply.
    pub recommendations: Vec<Phone>,
    pub selection: ComparisonSelection,
    /// Every phone received this session, keyed by id. Selection ids resolve here.
    pub catalog: HashMap<PhoneId, Phone>,
    pub status: SessionStatus,
    pub connectivity: ConnectivityStatus,
    pub comparison_visible: bool,
    /// Bumped once per successful compare so the shell can react to each reveal.
    pub comparison_reveal_seq: u64,
    /// Backend conversation the latest chat reply was stored under.
    pub conversation_id: Option<i64>,
}

impl SessionState {
    #[must_use]
    pub fn is_awaiting(&self) -> bool {
        self.status == SessionStatus::AwaitingResponse
    }

    #[must_use]
    pub fn is_selected(&self, id: PhoneId) -> bool {
        self.selection.contains(id)
    }

    /// Look up `id` in the current recommendations.
    #[must_use]
    pub fn recommended(&self, id: PhoneId) -> Option<&Phone> {
        self.recommendations.iter().find(|p| p.id == id)
    }

    /// Selected phones in selection order. Ids missing from the catalog are skipped.
    #[must_use]
    pub fn selected_phones(&self) -> Vec<&Phone> {
        self.selection
            .ids()
            .iter()
            .filter_map(|id| self.catalog.get(id))
            .collect()
    }

    /// Swap in a new recommendation list wholesale and record its phones.
    pub fn replace_recommendations(&mut self, phones: Vec<Phone>) {
        self.remember(&phones);
        self.recommendations = phones;
    }

    /// Record phones in the catalog without touching recommendations.
    pub fn remember(&mut self, phones: &[Phone]) {
        for phone in phones {
            self.catalog.insert(phone.id, phone.clone());
        }
    }
}
