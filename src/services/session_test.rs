use super::*;
use crate::net::api::test_helpers::{MockApi, reply_with, test_phone};
use crate::net::types::{ChatReply, CompareReply};
use crate::state::comparison::COMPARISON_CAPACITY;
use tokio::sync::Notify;

fn controller(api: MockApi) -> (Arc<MockApi>, SessionController<MockApi>) {
    let api = Arc::new(api);
    let controller = SessionController::new(Arc::clone(&api), "http://localhost:8001");
    (api, controller)
}

fn texts(state: &SessionState) -> Vec<(Author, String)> {
    state
        .messages
        .as_slice()
        .iter()
        .map(|m| (m.author, m.text.clone()))
        .collect()
}

async fn with_recommendations(ids: &[PhoneId]) -> (Arc<MockApi>, SessionController<MockApi>) {
    let (api, controller) = controller(MockApi::new().with_chat(Ok(reply_with("here you go", ids))));
    controller
        .submit_user_message("show me phones")
        .await
        .unwrap();
    (api, controller)
}

// =========================================================================
// initialize
// =========================================================================

#[tokio::test]
async fn initialize_authenticated_healthy_adds_welcome() {
    let (_, controller) = controller(MockApi::new());
    let connectivity = controller.initialize(true).await;
    assert_eq!(connectivity, ConnectivityStatus::Connected);

    let state = controller.snapshot();
    assert_eq!(state.connectivity, ConnectivityStatus::Connected);
    assert_eq!(texts(&state), vec![(Author::Assistant, WELCOME_TEXT.to_owned())]);
}

#[tokio::test]
async fn initialize_unauthenticated_healthy_adds_nothing() {
    let (_, controller) = controller(MockApi::new());
    controller.initialize(false).await;
    let state = controller.snapshot();
    assert_eq!(state.connectivity, ConnectivityStatus::Connected);
    assert!(state.messages.is_empty());
}

#[tokio::test]
async fn initialize_unhealthy_explains_regardless_of_auth() {
    for authenticated in [false, true] {
        let (_, controller) = controller(MockApi::unhealthy());
        let connectivity = controller.initialize(authenticated).await;
        assert_eq!(connectivity, ConnectivityStatus::Disconnected);

        let state = controller.snapshot();
        assert_eq!(state.messages.len(), 1);
        let msg = state.messages.last().unwrap();
        assert_eq!(msg.author, Author::Assistant);
        assert_eq!(msg.text, connection_failed_text("http://localhost:8001"));
    }
}

#[tokio::test]
async fn initialize_twice_keeps_one_opening_message() {
    let (api, controller) = controller(MockApi::new());
    controller.initialize(false).await;
    controller.initialize(true).await;
    controller.initialize(true).await;
    let state = controller.snapshot();
    assert_eq!(state.messages.len(), 1);
    assert_eq!(api.calls(), vec!["health", "health", "health"]);
}

// =========================================================================
// submit_user_message
// =========================================================================

#[tokio::test]
async fn submit_success_appends_user_then_assistant_and_sets_recommendations() {
    let (api, controller) =
        controller(MockApi::new().with_chat(Ok(reply_with("Try X", &[1]))));
    let before = controller.snapshot().messages.len();

    let completion = controller
        .submit_user_message("Best camera phone under 30000")
        .await
        .unwrap();
    assert_eq!(completion, Completion::Applied);

    let state = controller.snapshot();
    assert_eq!(state.messages.len(), before + 2);
    assert_eq!(
        texts(&state),
        vec![
            (Author::User, "Best camera phone under 30000".to_owned()),
            (Author::Assistant, "Try X".to_owned()),
        ]
    );
    assert_eq!(state.recommendations, vec![test_phone(1)]);
    assert_eq!(state.status, SessionStatus::Idle);
    assert_eq!(api.calls(), vec!["chat:Best camera phone under 30000"]);
}

#[tokio::test]
async fn submit_failure_appends_fixed_error_and_clears_recommendations() {
    let (_, controller) = controller(
        MockApi::new()
            .with_chat(Ok(reply_with("first", &[1, 2])))
            .with_chat(Err(ApiError::Status { status: 500, body: "boom".into() })),
    );
    controller.submit_user_message("one").await.unwrap();
    assert_eq!(controller.snapshot().recommendations.len(), 2);

    let completion = controller.submit_user_message("two").await.unwrap();
    assert_eq!(completion, Completion::Absorbed);

    let state = controller.snapshot();
    let last_two: Vec<_> = texts(&state).into_iter().skip(2).collect();
    assert_eq!(
        last_two,
        vec![(Author::User, "two".to_owned()), (Author::Assistant, CHAT_ERROR_TEXT.to_owned())]
    );
    assert!(state.recommendations.is_empty());
    assert_eq!(state.status, SessionStatus::Idle);
}

#[tokio::test]
async fn recommendations_are_replaced_never_accumulated() {
    let (_, controller) = controller(
        MockApi::new()
            .with_chat(Ok(reply_with("a", &[1, 2])))
            .with_chat(Ok(reply_with("b", &[3])))
            .with_chat(Ok(ChatReply { response: "no phones".into(), ..ChatReply::default() })),
    );
    controller.submit_user_message("a").await.unwrap();
    controller.submit_user_message("b").await.unwrap();
    let ids: Vec<PhoneId> = controller
        .snapshot()
        .recommendations
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, vec![3]);

    controller.submit_user_message("c").await.unwrap();
    assert!(controller.snapshot().recommendations.is_empty());
}

#[tokio::test]
async fn submit_blank_text_is_rejected_without_request() {
    let (api, controller) = controller(MockApi::new());
    let err = controller
        .submit_user_message("   \n")
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::ValidationRejected(_)));
    assert!(controller.snapshot().messages.is_empty());
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn submit_trims_text() {
    let (api, controller) = controller(MockApi::new());
    controller.submit_user_message("  hi  ").await.unwrap();
    assert_eq!(controller.snapshot().messages.as_slice()[0].text, "hi");
    assert_eq!(api.calls(), vec!["chat:hi"]);
}

#[tokio::test]
async fn submit_while_awaiting_is_rejected() {
    let gate = Arc::new(Notify::new());
    let (api, controller) = controller(MockApi::new().gated(Arc::clone(&gate)));
    let controller = Arc::new(controller);

    let pending = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.submit_user_message("first").await })
    };
    while !controller.snapshot().is_awaiting() {
        tokio::task::yield_now().await;
    }

    // Optimistic insert is visible before the reply.
    assert_eq!(texts(&controller.snapshot()), vec![(Author::User, "first".to_owned())]);
    assert_eq!(controller.submit_user_message("second").await, Err(SessionError::RequestInFlight));
    assert_eq!(controller.compare_selected().await, Err(SessionError::RequestInFlight));

    gate.notify_one();
    assert_eq!(pending.await.unwrap(), Ok(Completion::Applied));
    assert_eq!(api.calls(), vec!["chat:first"]);
    assert_eq!(controller.snapshot().messages.len(), 2);
}

#[tokio::test]
async fn unauthorized_appends_error_and_escapes() {
    let (_, controller) = controller(MockApi::new().with_chat(Err(ApiError::Unauthorized)));
    let err = controller.submit_user_message("hi").await.unwrap_err();
    assert_eq!(err, SessionError::Unauthorized);
    let state = controller.snapshot();
    assert_eq!(state.messages.last().unwrap().text, CHAT_ERROR_TEXT);
    assert_eq!(state.status, SessionStatus::Idle);
}

#[tokio::test]
async fn conversation_id_is_tracked() {
    let (_, controller) = controller(MockApi::new().with_chat(Ok(ChatReply {
        response: "ok".into(),
        conversation_id: Some(12),
        ..ChatReply::default()
    })));
    controller.submit_user_message("hi").await.unwrap();
    assert_eq!(controller.snapshot().conversation_id, Some(12));
}

// =========================================================================
// toggle / remove
// =========================================================================

#[tokio::test]
async fn toggle_twice_restores_selection() {
    let (_, controller) = with_recommendations(&[1, 2, 3]).await;
    controller.toggle_comparison_member(1).unwrap();
    controller.toggle_comparison_member(2).unwrap();
    let before = controller.snapshot().selection;

    assert_eq!(controller.toggle_comparison_member(1), Ok(Toggle::Removed));
    assert_eq!(controller.toggle_comparison_member(1), Ok(Toggle::Added));
    assert_eq!(controller.snapshot().selection.ids(), before.ids());

    assert_eq!(controller.toggle_comparison_member(3), Ok(Toggle::Added));
    assert_eq!(controller.toggle_comparison_member(3), Ok(Toggle::Removed));
    assert_eq!(controller.snapshot().selection.ids(), before.ids());
}

#[tokio::test]
async fn fourth_add_reports_capacity_and_leaves_selection() {
    let (_, controller) = with_recommendations(&[1, 2, 3, 4]).await;
    for id in 1..=3 {
        controller.toggle_comparison_member(id).unwrap();
    }
    assert_eq!(
        controller.toggle_comparison_member(4),
        Err(SessionError::CapacityExceeded { capacity: COMPARISON_CAPACITY })
    );
    assert_eq!(controller.snapshot().selection.ids(), &[1, 2, 3]);
}

#[tokio::test]
async fn toggle_unknown_phone_is_rejected() {
    let (_, controller) = with_recommendations(&[1]).await;
    let err = controller.toggle_comparison_member(99).unwrap_err();
    assert!(matches!(err, SessionError::ValidationRejected(_)));
    assert!(controller.snapshot().selection.is_empty());
}

#[tokio::test]
async fn selection_survives_new_recommendations() {
    let (_, controller) = controller(
        MockApi::new()
            .with_chat(Ok(reply_with("a", &[1, 2])))
            .with_chat(Ok(reply_with("b", &[5]))),
    );
    controller.submit_user_message("a").await.unwrap();
    controller.toggle_comparison_member(1).unwrap();
    controller.submit_user_message("b").await.unwrap();

    let state = controller.snapshot();
    assert_eq!(state.selection.ids(), &[1]);
    assert_eq!(state.selected_phones(), vec![&test_phone(1)]);

    // Stale selections can still be removed, but not re-added.
    assert_eq!(controller.toggle_comparison_member(1), Ok(Toggle::Removed));
    assert!(controller.toggle_comparison_member(1).is_err());
}

#[tokio::test]
async fn remove_member_is_noop_when_absent() {
    let (_, controller) = with_recommendations(&[1, 2]).await;
    controller.toggle_comparison_member(1).unwrap();
    assert!(!controller.remove_comparison_member(2));
    assert!(controller.remove_comparison_member(1));
    assert!(controller.snapshot().selection.is_empty());
}

// =========================================================================
// compare_selected
// =========================================================================

#[tokio::test]
async fn compare_with_fewer_than_two_sends_nothing() {
    let (api, controller) = with_recommendations(&[1, 2]).await;
    controller.toggle_comparison_member(1).unwrap();
    let messages_before = controller.snapshot().messages.len();

    let err = controller.compare_selected().await.unwrap_err();
    assert!(matches!(err, SessionError::ValidationRejected(_)));
    assert_eq!(controller.snapshot().messages.len(), messages_before);
    assert!(!api.calls().iter().any(|c| c.starts_with("compare")));
}

#[tokio::test]
async fn compare_success_appends_message_and_reveals_once() {
    let (api, controller) = controller(
        MockApi::new()
            .with_chat(Ok(reply_with("a", &[1, 2])))
            .with_compare(Ok(CompareReply { response: "1 vs 2".into(), comparison: None })),
    );
    controller.submit_user_message("a").await.unwrap();
    controller.toggle_comparison_member(1).unwrap();
    controller.toggle_comparison_member(2).unwrap();
    let before = controller.snapshot();

    assert_eq!(controller.compare_selected().await, Ok(Completion::Applied));

    let state = controller.snapshot();
    assert_eq!(state.messages.len(), before.messages.len() + 1);
    assert_eq!(state.messages.last().unwrap().text, "1 vs 2");
    assert_eq!(state.selection.ids(), &[1, 2]);
    assert!(state.comparison_visible);
    assert_eq!(state.comparison_reveal_seq, before.comparison_reveal_seq + 1);
    assert_eq!(state.status, SessionStatus::Idle);
    assert!(api.calls().contains(&"compare:[1, 2]".to_owned()));
}

#[tokio::test]
async fn compare_failure_appends_error_and_stays_hidden() {
    let (_, controller) = controller(
        MockApi::new()
            .with_chat(Ok(reply_with("a", &[1, 2])))
            .with_compare(Err(ApiError::NetworkUnreachable("down".into()))),
    );
    controller.submit_user_message("a").await.unwrap();
    controller.toggle_comparison_member(2).unwrap();
    controller.toggle_comparison_member(1).unwrap();

    assert_eq!(controller.compare_selected().await, Ok(Completion::Absorbed));
    let state = controller.snapshot();
    assert_eq!(state.messages.last().unwrap().text, COMPARE_ERROR_TEXT);
    assert!(!state.comparison_visible);
    assert_eq!(state.comparison_reveal_seq, 0);
    assert_eq!(state.selection.ids(), &[2, 1]);
}

#[tokio::test]
async fn removing_last_member_hides_comparison() {
    let (_, controller) = with_recommendations(&[1, 2]).await;
    controller.toggle_comparison_member(1).unwrap();
    controller.toggle_comparison_member(2).unwrap();
    controller.compare_selected().await.unwrap();
    assert!(controller.snapshot().comparison_visible);

    controller.remove_comparison_member(1);
    assert!(controller.snapshot().comparison_visible);
    controller.remove_comparison_member(2);
    assert!(!controller.snapshot().comparison_visible);
    assert!(!controller.show_comparison());
}

#[tokio::test]
async fn show_and_hide_follow_selection() {
    let (_, controller) = with_recommendations(&[1, 2]).await;
    assert!(!controller.show_comparison());

    controller.toggle_comparison_member(2).unwrap();
    assert!(controller.show_comparison());
    assert!(controller.snapshot().comparison_visible);
    assert_eq!(controller.snapshot().comparison_reveal_seq, 0);

    controller.hide_comparison();
    assert!(!controller.snapshot().comparison_visible);
    assert!(controller.snapshot().is_selected(2));
}

// =========================================================================
// reset / late responses
// =========================================================================

#[tokio::test]
async fn initialize_during_inflight_chat_keeps_user_turn() {
    let gate = Arc::new(Notify::new());
    let (_, controller) = controller(MockApi::new().gated(Arc::clone(&gate)));
    let controller = Arc::new(controller);

    let pending = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.submit_user_message("hello").await })
    };
    while !controller.snapshot().is_awaiting() {
        tokio::task::yield_now().await;
    }

    controller.initialize(true).await;
    assert!(controller.snapshot().is_awaiting());
    gate.notify_one();
    assert_eq!(pending.await.unwrap(), Ok(Completion::Applied));

    assert_eq!(
        texts(&controller.snapshot()),
        vec![
            (Author::User, "hello".to_owned()),
            (Author::Assistant, WELCOME_TEXT.to_owned()),
            (Author::Assistant, "done".to_owned()),
        ]
    );
}

#[tokio::test]
async fn reinitialize_replaces_only_the_opening_message() {
    let (_, controller) = controller(MockApi::new());
    controller.initialize(true).await;
    controller.submit_user_message("hi").await.unwrap();
    controller.initialize(true).await;

    assert_eq!(
        texts(&controller.snapshot()),
        vec![
            (Author::User, "hi".to_owned()),
            (Author::Assistant, "done".to_owned()),
            (Author::Assistant, WELCOME_TEXT.to_owned()),
        ]
    );
}

#[tokio::test]
async fn late_reply_after_reset_is_discarded() {
    let gate = Arc::new(Notify::new());
    let (_, controller) =
        controller(MockApi::new().gated(Arc::clone(&gate)).with_chat(Ok(reply_with("late", &[1]))));
    let controller = Arc::new(controller);
    let first_session = controller.session_id();

    let pending = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.submit_user_message("hello").await })
    };
    while !controller.snapshot().is_awaiting() {
        tokio::task::yield_now().await;
    }

    controller.reset();
    gate.notify_one();
    assert_eq!(pending.await.unwrap(), Ok(Completion::Discarded));

    let state = controller.snapshot();
    assert!(state.messages.is_empty());
    assert!(state.recommendations.is_empty());
    assert_eq!(state.status, SessionStatus::Idle);
    assert_ne!(controller.session_id(), first_session);
}

#[tokio::test]
async fn reset_clears_selection_and_connectivity() {
    let (_, controller) = with_recommendations(&[1, 2]).await;
    controller.initialize(true).await;
    controller.toggle_comparison_member(1).unwrap();
    controller.reset();
    let state = controller.snapshot();
    assert!(state.selection.is_empty());
    assert!(state.catalog.is_empty());
    assert_eq!(state.connectivity, ConnectivityStatus::Unknown);
}
