//! Wire DTOs for the shopping assistant backend.
//!
//! DESIGN
//! ======
//! Field names follow the backend's JSON exactly (snake case). Optional
//! collections default to empty/`None` so older or trimmed responses still
//! decode; unknown fields are ignored.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};

/// Backend-assigned phone identifier.
pub type PhoneId = i64;

// =============================================================================
// PHONES
// =============================================================================

/// A phone as returned by `/chat`, `/compare`, and `/phones`.
///
/// Read-only once received; the controller never edits a phone in place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Phone {
    pub id: PhoneId,
    pub name: String,
    pub brand: String,
    /// Price in rupees.
    pub price: f64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub specs: PhoneSpecs,
}

/// Sparse set of named hardware attributes. Any of these may be absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhoneSpecs {
    /// Diagonal in inches.
    pub display_size: Option<f64>,
    pub display_resolution: Option<String>,
    pub processor: Option<String>,
    /// RAM in GB.
    pub ram: Option<u32>,
    /// Storage in GB.
    pub storage: Option<u32>,
    pub camera_main: Option<String>,
    pub camera_front: Option<String>,
    /// Battery capacity in mAh.
    pub battery_capacity: Option<u32>,
    pub charging_speed: Option<String>,
    pub os: Option<String>,
    /// Weight in grams.
    pub weight: Option<f64>,
    pub dimensions: Option<String>,
    pub colors: Option<String>,
    pub features: Option<String>,
    pub ois: Option<bool>,
    pub eis: Option<bool>,
    pub wireless_charging: Option<bool>,
    pub water_resistance: Option<String>,
    pub fingerprint_sensor: Option<bool>,
    pub face_unlock: Option<bool>,
}

/// Optional filters for `GET /phones`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PhoneFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_ram: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_storage: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

// =============================================================================
// CHAT / COMPARE
// =============================================================================

/// Body of `POST /chat`.
#[derive(Clone, Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Response of `POST /chat`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default)]
    pub recommendations: Option<Vec<Phone>>,
    #[serde(default)]
    pub comparison: Option<Vec<Phone>>,
    #[serde(default)]
    pub used_web_search: bool,
    #[serde(default)]
    pub conversation_id: Option<i64>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Body of `POST /compare`.
#[derive(Clone, Debug, Serialize)]
pub struct CompareRequest<'a> {
    pub phone_ids: &'a [PhoneId],
}

/// Response of `POST /compare`. Shares the chat response shape on the wire.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct CompareReply {
    pub response: String,
    #[serde(default)]
    pub comparison: Option<Vec<Phone>>,
}

// =============================================================================
// AUTH
// =============================================================================

/// Body of `POST /auth/register`.
#[derive(Clone, Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub full_name: &'a str,
}

/// Body of `POST /auth/login`.
#[derive(Clone, Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Response of `POST /auth/login`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_owned()
}

/// Authenticated user payload from `/auth/me` and `/auth/register`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub last_login: Option<String>,
}

fn default_true() -> bool {
    true
}

impl User {
    /// Name shown in the shell header: full name when set, else the email.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self.full_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.email,
        }
    }
}

// =============================================================================
// CONVERSATION HISTORY
// =============================================================================

/// A stored conversation from `GET /conversations`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Conversation {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// One stored turn from `GET /conversations/{id}/messages`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ConversationMessage {
    pub id: i64,
    #[serde(default)]
    pub conversation_id: Option<i64>,
    pub user_message: String,
    pub ai_response: String,
    #[serde(default)]
    pub used_web_search: bool,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Envelope of `GET /conversations/{id}/messages`.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct ConversationMessagesEnvelope {
    #[serde(default)]
    pub messages: Vec<ConversationMessage>,
}
