//! HTTP transport for the shopping assistant backend.
//!
//! DESIGN
//! ======
//! `ShopApi` and `AuthApi` are the seams the session controller and the auth
//! service depend on; `ApiClient` is the reqwest-backed implementation. Every
//! request carries `Authorization: Bearer <token>` when the shared
//! [`TokenStore`] holds one.
//!
//! ERROR HANDLING
//! ==============
//! Transport failures become [`ApiError::NetworkUnreachable`], non-2xx
//! statuses become [`ApiError::Status`], and a 401 anywhere clears the token
//! store before returning [`ApiError::Unauthorized`].

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::token::TokenStore;
use super::types::{
    ChatReply, ChatRequest, CompareReply, CompareRequest, Conversation, ConversationMessage,
    ConversationMessagesEnvelope, LoginRequest, Phone, PhoneFilters, PhoneId, RegisterRequest, Token, User,
};
use crate::config::ClientConfig;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by backend calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced an HTTP response (DNS, connect, timeout).
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    /// The backend rejected the bearer credential (HTTP 401).
    #[error("unauthorized")]
    Unauthorized,

    /// The backend returned a non-success HTTP status.
    #[error("API response error: status {status}")]
    Status { status: u16, body: String },

    /// The response body could not be deserialized.
    #[error("API response parse failed: {0}")]
    Decode(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ApiError {
    /// Whether a later identical request might succeed.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::NetworkUnreachable(_) | Self::Status { status: 429 | 500..=599, .. })
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

// =============================================================================
// TRAITS
// =============================================================================

/// Chat, compare, and health calls used by the session controller.
#[async_trait::async_trait]
pub trait ShopApi: Send + Sync {
    /// `POST /chat`.
    async fn send_message(&self, text: &str, session_id: Option<&str>) -> Result<ChatReply, ApiError>;

    /// `POST /compare`.
    async fn compare_phones(&self, ids: &[PhoneId]) -> Result<CompareReply, ApiError>;

    /// `GET /health`; any 2xx is healthy.
    async fn health(&self) -> Result<(), ApiError>;
}

/// Account calls used by the auth service.
#[async_trait::async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /auth/register`.
    async fn register(&self, email: &str, password: &str, full_name: &str) -> Result<User, ApiError>;

    /// `POST /auth/login`.
    async fn login(&self, email: &str, password: &str) -> Result<Token, ApiError>;

    /// `GET /auth/me` with the stored bearer token.
    async fn current_user(&self) -> Result<User, ApiError>;
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenStore,
}

impl ApiClient {
    /// Build a client for `config.base_url` sharing `tokens`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &ClientConfig, tokens: TokenStore) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeouts.request())
            .connect_timeout(config.timeouts.connect())
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.base_url.trim_end_matches('/').to_owned(), tokens })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// `GET /conversations` for the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status, or bad JSON.
    pub async fn list_conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        self.get_json("/conversations").await
    }

    /// `GET /conversations/{id}/messages`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status, or bad JSON.
    pub async fn conversation_messages(&self, conversation_id: i64) -> Result<Vec<ConversationMessage>, ApiError> {
        let envelope: ConversationMessagesEnvelope =
            self.get_json(&conversation_messages_path(conversation_id)).await?;
        Ok(envelope.messages)
    }

    /// `GET /phones` with optional filters.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status, or bad JSON.
    pub async fn list_phones(&self, filters: &PhoneFilters) -> Result<Vec<Phone>, ApiError> {
        let request = self.http.get(self.url("/phones")).query(filters);
        self.execute(request).await
    }

    /// `GET /phones/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status (404 when
    /// unknown), or bad JSON.
    pub async fn get_phone(&self, id: PhoneId) -> Result<Phone, ApiError> {
        self.get_json(&phone_path(id)).await
    }

    /// `GET /brands`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status, or bad JSON.
    pub async fn list_brands(&self) -> Result<Vec<String>, ApiError> {
        self.get_json("/brands").await
    }

    fn url(&self, path: &str) -> String {
        endpoint(&self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(self.http.get(self.url(path))).await
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str, body: &impl Serialize) -> Result<T, ApiError> {
        self.execute(self.http.post(self.url(path)).json(body)).await
    }

    async fn execute<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T, ApiError> {
        let text = self.execute_text(request).await?;
        serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn execute_text(&self, request: reqwest::RequestBuilder) -> Result<String, ApiError> {
        let request = match self.tokens.get() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::NetworkUnreachable(e.to_string()))?;

        let status = response.status().as_u16();
        let url = response.url().path().to_owned();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::NetworkUnreachable(e.to_string()))?;
        debug!(%url, status, "backend response");

        match check_status(status, text) {
            Err(ApiError::Unauthorized) => {
                warn!(%url, "backend rejected credentials; clearing token");
                self.tokens.clear();
                Err(ApiError::Unauthorized)
            }
            other => other,
        }
    }
}

#[async_trait::async_trait]
impl ShopApi for ApiClient {
    async fn send_message(&self, text: &str, session_id: Option<&str>) -> Result<ChatReply, ApiError> {
        let body = ChatRequest { message: text, session_id: session_id.map(str::to_owned) };
        self.post_json("/chat", &body).await
    }

    async fn compare_phones(&self, ids: &[PhoneId]) -> Result<CompareReply, ApiError> {
        self.post_json("/compare", &CompareRequest { phone_ids: ids })
            .await
    }

    async fn health(&self) -> Result<(), ApiError> {
        self.execute_text(self.http.get(self.url("/health")))
            .await
            .map(|_| ())
    }
}

#[async_trait::async_trait]
impl AuthApi for ApiClient {
    async fn register(&self, email: &str, password: &str, full_name: &str) -> Result<User, ApiError> {
        self.post_json("/auth/register", &RegisterRequest { email, password, full_name })
            .await
    }

    async fn login(&self, email: &str, password: &str) -> Result<Token, ApiError> {
        self.post_json("/auth/login", &LoginRequest { email, password })
            .await
    }

    async fn current_user(&self) -> Result<User, ApiError> {
        self.get_json("/auth/me").await
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn phone_path(id: PhoneId) -> String {
    format!("/phones/{id}")
}

fn conversation_messages_path(conversation_id: i64) -> String {
    format!("/conversations/{conversation_id}/messages")
}

/// Map an HTTP status to success or the matching error, passing the body through.
fn check_status(status: u16, body: String) -> Result<String, ApiError> {
    match status {
        200..=299 => Ok(body),
        401 => Err(ApiError::Unauthorized),
        _ => Err(ApiError::Status { status, body }),
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
