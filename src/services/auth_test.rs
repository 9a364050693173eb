use super::*;
use crate::net::api::test_helpers::MockApi;
use crate::net::types::Token;

fn user() -> User {
    User {
        id: 4,
        email: "asha@example.com".to_owned(),
        full_name: Some("Asha".to_owned()),
        is_active: true,
        created_at: None,
        last_login: None,
    }
}

fn service(api: MockApi) -> (TokenStore, AuthService<MockApi>) {
    let tokens = TokenStore::new();
    let service = AuthService::new(Arc::new(api), tokens.clone());
    (tokens, service)
}

// =============================================================
// AuthState
// =============================================================

#[test]
fn auth_state_default_signed_out() {
    let state = AuthState::default();
    assert!(!state.is_authenticated());
    assert!(!state.loading);
    assert_eq!(state.display_name(), None);
}

#[test]
fn auth_state_display_name_from_user() {
    let state = AuthState { user: Some(user()), loading: false };
    assert_eq!(state.display_name(), Some("Asha"));
}

// =============================================================
// login / logout
// =============================================================

#[tokio::test]
async fn login_stores_token_and_user() {
    let api = MockApi::new()
        .with_login(Ok(Token { access_token: "abc".into(), token_type: "bearer".into() }))
        .with_me(Ok(user()));
    let (tokens, service) = service(api);

    let signed_in = service
        .login("asha@example.com", "pw")
        .await
        .unwrap();
    assert_eq!(signed_in, user());
    assert_eq!(tokens.get().as_deref(), Some("abc"));
    assert!(service.is_authenticated());
}

#[tokio::test]
async fn login_401_is_invalid_credentials() {
    let (tokens, service) = service(MockApi::new().with_login(Err(ApiError::Unauthorized)));
    let err = service.login("a@b.c", "wrong").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
    assert!(!tokens.is_set());
    assert!(!service.is_authenticated());
}

#[tokio::test]
async fn login_profile_failure_clears_token() {
    let api = MockApi::new().with_me(Err(ApiError::Status { status: 500, body: String::new() }));
    let (tokens, service) = service(api);
    assert!(service.login("a@b.c", "pw").await.is_err());
    assert!(!tokens.is_set());
}

#[tokio::test]
async fn logout_and_unauthorized_clear_everything() {
    let (tokens, service) = service(MockApi::new().with_me(Ok(user())).with_me(Ok(user())));
    service.login("a@b.c", "pw").await.unwrap();
    service.logout();
    assert!(!tokens.is_set());
    assert!(!service.is_authenticated());

    service.login("a@b.c", "pw").await.unwrap();
    service.handle_unauthorized();
    assert!(!tokens.is_set());
    assert!(service.state().user.is_none());
}

// =============================================================
// register
// =============================================================

#[tokio::test]
async fn register_does_not_sign_in() {
    let (tokens, service) = service(MockApi::new());
    let created = service
        .register("new@example.com", "pw", "New User")
        .await
        .unwrap();
    assert_eq!(created.display_name(), "New User");
    assert!(!tokens.is_set());
    assert!(!service.is_authenticated());
}

// =============================================================
// restore
// =============================================================

#[tokio::test]
async fn restore_without_token_skips_request() {
    let api = Arc::new(MockApi::new());
    let service = AuthService::new(Arc::clone(&api), TokenStore::new());
    assert!(service.restore().await.is_none());
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn restore_with_valid_token_loads_user() {
    let tokens = TokenStore::with_token(Some("tok".into()));
    let service = AuthService::new(Arc::new(MockApi::new().with_me(Ok(user()))), tokens.clone());
    assert_eq!(service.restore().await, Some(user()));
    assert!(service.is_authenticated());
    assert!(!service.state().loading);
    assert!(tokens.is_set());
}

#[tokio::test]
async fn restore_with_rejected_token_clears_it() {
    let tokens = TokenStore::with_token(Some("stale".into()));
    let service = AuthService::new(Arc::new(MockApi::new()), tokens.clone());
    assert!(service.restore().await.is_none());
    assert!(!tokens.is_set());
    assert!(!service.is_authenticated());
}
