//! Session flow scenario tests.
//!
//! Drive [`SessionFlow`] with scripted session and role sources and check
//! the decisions it publishes: last event wins regardless of completion
//! order, absent sessions short-circuit, failures never grant a section,
//! and redelivered sessions do not flicker.

use std::time::Duration;

use tokio::sync::watch;

use salon_app::services::authz::{GateOptions, SessionFlow, TransportError};
use salon_core::Role;
use salon_core::authz::{RoleLookupError, RouteDecision};
use salon_core::types::UserId;

use salon_integration_tests::{MockSessions, ScriptedLookup, ScriptedRoles};

fn user() -> UserId {
    UserId::new(uuid::Uuid::new_v4())
}

fn options() -> GateOptions {
    GateOptions {
        lookup_timeout: Duration::from_secs(5),
        lookup_retries: 2,
    }
}

/// Wait until the flow publishes `want` (fails the test after a bounded
/// wait).
async fn wait_for(rx: &mut watch::Receiver<RouteDecision>, want: RouteDecision) {
    let result = tokio::time::timeout(Duration::from_secs(30), async {
        loop {
            if *rx.borrow_and_update() == want {
                return;
            }
            rx.changed().await.expect("flow ended unexpectedly");
        }
    })
    .await;
    assert!(result.is_ok(), "timed out waiting for {want:?}");
}

/// Let every runnable task (and the paused clock) make progress.
async fn settle() {
    tokio::time::sleep(Duration::from_secs(60)).await;
}

#[tokio::test(start_paused = true)]
async fn absent_session_at_startup_shows_login_without_a_profile_read() {
    let (sessions, _events) = MockSessions::new(Ok(None));
    let roles = ScriptedRoles::new();

    let flow = SessionFlow::spawn(sessions, roles.clone(), options());
    let mut rx = flow.decisions();

    wait_for(&mut rx, RouteDecision::ShowLogin).await;
    assert_eq!(roles.call_count(), 0, "no profile read for an absent session");
}

#[tokio::test(start_paused = true)]
async fn bootstrap_transport_error_fails_open_to_login() {
    let (sessions, _events) =
        MockSessions::new(Err(TransportError("connection refused".into())));
    let roles = ScriptedRoles::new();

    let flow = SessionFlow::spawn(sessions, roles.clone(), options());
    let mut rx = flow.decisions();

    wait_for(&mut rx, RouteDecision::ShowLogin).await;
    assert_eq!(roles.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn resolved_role_opens_exactly_that_section() {
    let admin = user();
    let (sessions, _events) = MockSessions::new(Ok(Some(admin)));
    let roles = ScriptedRoles::new().script(admin, ScriptedLookup::instant(Ok(Role::Admin)));

    let flow = SessionFlow::spawn(sessions, roles, options());
    let mut rx = flow.decisions();

    wait_for(&mut rx, RouteDecision::ShowAdminSection).await;
}

#[tokio::test(start_paused = true)]
async fn missing_profile_blocks_access() {
    let ghost = user();
    let (sessions, _events) = MockSessions::new(Ok(Some(ghost)));
    let roles =
        ScriptedRoles::new().script(ghost, ScriptedLookup::instant(Err(RoleLookupError::NotFound)));

    let flow = SessionFlow::spawn(sessions, roles.clone(), options());
    let mut rx = flow.decisions();

    wait_for(&mut rx, RouteDecision::ShowLogin).await;
    assert_eq!(roles.call_count(), 1, "a missing profile is not retried");
}

#[tokio::test(start_paused = true)]
async fn transient_failure_is_retried_until_the_role_resolves() {
    let client = user();
    let (sessions, _events) = MockSessions::new(Ok(Some(client)));
    let roles = ScriptedRoles::new()
        .script(
            client,
            ScriptedLookup::instant(Err(RoleLookupError::Unavailable("blip".into()))),
        )
        .script(client, ScriptedLookup::instant(Ok(Role::Client)));

    let flow = SessionFlow::spawn(sessions, roles.clone(), options());
    let mut rx = flow.decisions();

    wait_for(&mut rx, RouteDecision::ShowClientSection).await;
    assert_eq!(roles.call_count(), 2, "one failure, one retry");
}

#[tokio::test(start_paused = true)]
async fn lookup_timeout_counts_as_transient_and_fails_closed() {
    let slow = user();
    let (sessions, _events) = MockSessions::new(Ok(Some(slow)));
    // Every scripted answer arrives long after the 5s lookup deadline.
    let roles = ScriptedRoles::new().script(
        slow,
        ScriptedLookup::after(Duration::from_secs(3600), Ok(Role::Client)),
    );

    let flow = SessionFlow::spawn(sessions, roles, options());
    let mut rx = flow.decisions();

    wait_for(&mut rx, RouteDecision::ShowLogin).await;
}

#[tokio::test(start_paused = true)]
async fn sign_out_discards_the_inflight_lookup() {
    let client = user();
    let (sessions, events) = MockSessions::new(Ok(Some(client)));
    // The lookup is slow; the sign-out arrives first.
    let roles = ScriptedRoles::new().script(
        client,
        ScriptedLookup::after(Duration::from_secs(2), Ok(Role::Client)),
    );

    let flow = SessionFlow::spawn(sessions, roles, options());
    let mut rx = flow.decisions();

    events.send(None).expect("flow is listening");

    wait_for(&mut rx, RouteDecision::ShowLogin).await;

    // The slow lookup completes eventually; the decision must not revert.
    settle().await;
    assert_eq!(*rx.borrow(), RouteDecision::ShowLogin);
}

#[tokio::test(start_paused = true)]
async fn newer_session_wins_over_a_slower_earlier_lookup() {
    let first = user();
    let second = user();
    let (sessions, events) = MockSessions::new(Ok(Some(first)));
    let roles = ScriptedRoles::new()
        // The first user's lookup is slow ...
        .script(first, ScriptedLookup::after(Duration::from_secs(3), Ok(Role::Client)))
        // ... the second user's is immediate.
        .script(second, ScriptedLookup::instant(Ok(Role::Admin)));

    let flow = SessionFlow::spawn(sessions, roles, options());
    let mut rx = flow.decisions();

    events.send(Some(second)).expect("flow is listening");

    wait_for(&mut rx, RouteDecision::ShowAdminSection).await;

    // The first user's lookup lands afterwards; out-of-order completion
    // must not win.
    settle().await;
    assert_eq!(*rx.borrow(), RouteDecision::ShowAdminSection);
}

#[tokio::test(start_paused = true)]
async fn client_section_never_reappears_after_a_user_switch() {
    let u1 = user();
    let u2 = user();
    let (sessions, events) = MockSessions::new(Ok(Some(u1)));
    let roles = ScriptedRoles::new()
        .script(u1, ScriptedLookup::instant(Ok(Role::Client)))
        // A slow duplicate lookup for the first user.
        .script(u1, ScriptedLookup::after(Duration::from_secs(10), Ok(Role::Client)))
        .script(u2, ScriptedLookup::instant(Ok(Role::Admin)));

    let flow = SessionFlow::spawn(sessions, roles, options());
    let mut rx = flow.decisions();

    wait_for(&mut rx, RouteDecision::ShowClientSection).await;

    // Redeliver U1 (spawns the slow duplicate), then switch to U2 before
    // the duplicate returns.
    events.send(Some(u1)).expect("flow is listening");
    events.send(Some(u2)).expect("flow is listening");

    wait_for(&mut rx, RouteDecision::ShowAdminSection).await;

    // Record every decision from here on; the stale U1 result must not
    // flip the gate back.
    settle().await;
    assert_eq!(*rx.borrow(), RouteDecision::ShowAdminSection);
}

#[tokio::test(start_paused = true)]
async fn redelivered_identical_session_produces_no_visible_transition() {
    let client = user();
    let (sessions, events) = MockSessions::new(Ok(Some(client)));
    let roles = ScriptedRoles::new().script(client, ScriptedLookup::instant(Ok(Role::Client)));

    let flow = SessionFlow::spawn(sessions, roles.clone(), options());
    let mut rx = flow.decisions();

    wait_for(&mut rx, RouteDecision::ShowClientSection).await;

    // Same session delivered again (token refresh / second device).
    events.send(Some(client)).expect("flow is listening");
    settle().await;

    // The role was re-derived but the visible decision never changed.
    assert!(roles.call_count() >= 2, "redelivery re-derives the role");
    assert_eq!(*rx.borrow(), RouteDecision::ShowClientSection);
    assert!(
        !rx.has_changed().expect("flow alive"),
        "no decision change was published for the redelivery"
    );
}
