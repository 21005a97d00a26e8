//! Session/authorization state machine.
//!
//! Decides which application section a user may reach from two inputs: the
//! current session (present or absent) and the role stored on the user's
//! profile row. The machine is pure - the caller fetches sessions, listens
//! for session changes, and performs profile reads; [`SessionGate`] owns the
//! sequencing rules:
//!
//! - Every session observation gets a monotonically increasing sequence
//!   number, and exactly one role lookup ticket is issued per observation of
//!   a live session.
//! - Lookup results are applied in *event* order, not completion order: a
//!   result whose sequence number has been superseded is discarded, so a
//!   slow lookup for an earlier session can never overwrite a newer one.
//! - A missing profile row for an authenticated subject never defaults to a
//!   role; it blocks access to both sections.
//! - Transient lookup failures are retried from a bounded budget before the
//!   gate fails closed to the login screen.
//! - The render decision never regresses to the loading indicator once the
//!   first resolution has landed; during re-resolution the previous decision
//!   holds while [`SessionGate::state`] reports `Loading` as the derived
//!   truth.

use serde::{Deserialize, Serialize};

use crate::types::{Role, UserId};

/// Default number of times a transient role-lookup failure is retried
/// before the gate fails closed.
pub const DEFAULT_LOOKUP_RETRIES: u32 = 2;

/// Derived, in-memory authorization state.
///
/// Never persisted; recomputed on every session change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "role")]
pub enum AuthorizationState {
    /// A role lookup is outstanding for the current session.
    Loading,
    /// No live session, or the session's role could not be established.
    Unauthenticated,
    /// A live session whose profile lookup completed successfully.
    Authenticated(Role),
}

/// The single renderable decision exposed to the navigation shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteDecision {
    /// Nothing has resolved yet; show a spinner.
    ShowLoadingIndicator,
    /// Expose the login entry point.
    ShowLogin,
    /// Expose the staff section.
    ShowAdminSection,
    /// Expose the client section.
    ShowClientSection,
}

impl RouteDecision {
    /// The section a resolved role maps to.
    #[must_use]
    pub const fn for_role(role: Role) -> Self {
        match role {
            Role::Admin => Self::ShowAdminSection,
            Role::Client => Self::ShowClientSection,
        }
    }
}

/// Why a role lookup did not produce a role.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoleLookupError {
    /// The identity layer authenticated a subject with no profile row.
    /// A provisioning inconsistency - never grant a default role.
    #[error("no profile row for authenticated subject")]
    NotFound,
    /// Transient failure reaching profile storage. Retried before the gate
    /// fails closed; must never be cached as a permanent "no role".
    #[error("profile storage unavailable: {0}")]
    Unavailable(String),
}

/// Ticket for a role lookup the driver must perform.
///
/// Carries the sequence number of the session observation that issued it;
/// the result must be handed back to [`SessionGate::resolve_role`] with the
/// same number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleLookup {
    /// Session-observation sequence number this lookup belongs to.
    pub seq: u64,
    /// Subject whose profile row should be read.
    pub user: UserId,
}

/// Outcome of handing a lookup result to the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The result was accepted and the state updated.
    Applied,
    /// Transient failure with budget remaining; perform the lookup again.
    Retry(RoleLookup),
    /// The session observation this result belongs to has been superseded.
    Stale,
}

#[derive(Debug, Clone, Copy)]
struct PendingLookup {
    seq: u64,
    user: UserId,
    retries_left: u32,
}

/// Sequence-numbered tri-state authorization gate.
///
/// ```
/// use salon_core::Role;
/// use salon_core::authz::{Resolution, RouteDecision, SessionGate};
/// use salon_core::types::UserId;
/// use uuid::Uuid;
///
/// let mut gate = SessionGate::new();
/// let user = UserId::new(Uuid::new_v4());
///
/// let ticket = gate.observe_session(Some(user)).expect("lookup issued");
/// assert_eq!(gate.decision(), RouteDecision::ShowLoadingIndicator);
///
/// let outcome = gate.resolve_role(ticket.seq, Ok(Role::Client));
/// assert_eq!(outcome, Resolution::Applied);
/// assert_eq!(gate.decision(), RouteDecision::ShowClientSection);
/// ```
#[derive(Debug)]
pub struct SessionGate {
    next_seq: u64,
    pending: Option<PendingLookup>,
    state: AuthorizationState,
    decision: RouteDecision,
    last_failure: Option<RoleLookupError>,
    retry_budget: u32,
}

impl SessionGate {
    /// A gate with the default retry budget.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_retry_budget(DEFAULT_LOOKUP_RETRIES)
    }

    /// A gate retrying transient lookup failures up to `retries` times per
    /// session observation.
    #[must_use]
    pub const fn with_retry_budget(retries: u32) -> Self {
        Self {
            next_seq: 0,
            pending: None,
            state: AuthorizationState::Loading,
            decision: RouteDecision::ShowLoadingIndicator,
            last_failure: None,
            retry_budget: retries,
        }
    }

    /// Feed the gate a session observation (the bootstrap fetch or a change
    /// notification).
    ///
    /// An absent session settles to `Unauthenticated` immediately and
    /// invalidates any outstanding lookup. A live session returns the lookup
    /// ticket the driver must fulfil; until the result arrives the derived
    /// state is `Loading` while the render decision holds its previous
    /// value.
    pub fn observe_session(&mut self, session: Option<UserId>) -> Option<RoleLookup> {
        let seq = self.next_seq;
        self.next_seq += 1;

        match session {
            None => {
                self.pending = None;
                self.last_failure = None;
                self.settle(AuthorizationState::Unauthenticated, RouteDecision::ShowLogin);
                None
            }
            Some(user) => {
                self.pending = Some(PendingLookup {
                    seq,
                    user,
                    retries_left: self.retry_budget,
                });
                self.state = AuthorizationState::Loading;
                Some(RoleLookup { seq, user })
            }
        }
    }

    /// Hand a role-lookup result back to the gate.
    ///
    /// Results tagged with a superseded sequence number are discarded
    /// (last-write-wins by event order, not completion order).
    pub fn resolve_role(
        &mut self,
        seq: u64,
        result: Result<Role, RoleLookupError>,
    ) -> Resolution {
        let Some(pending) = self.pending.as_mut() else {
            return Resolution::Stale;
        };
        if pending.seq != seq {
            return Resolution::Stale;
        }

        match result {
            Ok(role) => {
                self.pending = None;
                self.last_failure = None;
                self.settle(
                    AuthorizationState::Authenticated(role),
                    RouteDecision::for_role(role),
                );
                Resolution::Applied
            }
            Err(RoleLookupError::NotFound) => {
                self.pending = None;
                self.last_failure = Some(RoleLookupError::NotFound);
                self.settle(AuthorizationState::Unauthenticated, RouteDecision::ShowLogin);
                Resolution::Applied
            }
            Err(err @ RoleLookupError::Unavailable(_)) => {
                if pending.retries_left > 0 {
                    pending.retries_left -= 1;
                    return Resolution::Retry(RoleLookup {
                        seq,
                        user: pending.user,
                    });
                }
                self.pending = None;
                self.last_failure = Some(err);
                self.settle(AuthorizationState::Unauthenticated, RouteDecision::ShowLogin);
                Resolution::Applied
            }
        }
    }

    fn settle(&mut self, state: AuthorizationState, decision: RouteDecision) {
        self.state = state;
        self.decision = decision;
    }

    /// The derived authorization truth. `Loading` whenever a lookup is
    /// outstanding for the current session, so a stale prior role is never
    /// reported as current.
    #[must_use]
    pub fn state(&self) -> AuthorizationState {
        if self.pending.is_some() {
            AuthorizationState::Loading
        } else {
            self.state
        }
    }

    /// The renderable decision. Sticky: once the first resolution lands the
    /// spinner never returns; during re-resolution the previous decision
    /// holds until the new result is applied.
    #[must_use]
    pub const fn decision(&self) -> RouteDecision {
        self.decision
    }

    /// The failure behind the most recent fail-closed settle, if any.
    ///
    /// Lets callers distinguish "signed out" from "couldn't verify your
    /// account" on the login surface.
    #[must_use]
    pub const fn last_failure(&self) -> Option<&RoleLookupError> {
        self.last_failure.as_ref()
    }
}

impl Default for SessionGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn user() -> UserId {
        UserId::new(Uuid::new_v4())
    }

    #[test]
    fn starts_loading() {
        let gate = SessionGate::new();
        assert_eq!(gate.state(), AuthorizationState::Loading);
        assert_eq!(gate.decision(), RouteDecision::ShowLoadingIndicator);
    }

    #[test]
    fn absent_session_at_startup_settles_without_any_lookup() {
        let mut gate = SessionGate::new();
        assert!(gate.observe_session(None).is_none());
        assert_eq!(gate.state(), AuthorizationState::Unauthenticated);
        assert_eq!(gate.decision(), RouteDecision::ShowLogin);
    }

    #[test]
    fn resolved_role_exposes_exactly_one_section() {
        let mut gate = SessionGate::new();
        let ticket = gate.observe_session(Some(user())).expect("ticket");
        assert_eq!(gate.resolve_role(ticket.seq, Ok(Role::Admin)), Resolution::Applied);
        assert_eq!(gate.state(), AuthorizationState::Authenticated(Role::Admin));
        assert_eq!(gate.decision(), RouteDecision::ShowAdminSection);
    }

    #[test]
    fn out_of_order_completion_never_wins() {
        let mut gate = SessionGate::new();
        let slow = gate.observe_session(Some(user())).expect("first ticket");
        let fast = gate.observe_session(Some(user())).expect("second ticket");

        assert_eq!(gate.resolve_role(fast.seq, Ok(Role::Admin)), Resolution::Applied);
        assert_eq!(gate.decision(), RouteDecision::ShowAdminSection);

        // The earlier session's lookup completes late; it must be discarded.
        assert_eq!(gate.resolve_role(slow.seq, Ok(Role::Client)), Resolution::Stale);
        assert_eq!(gate.decision(), RouteDecision::ShowAdminSection);
        assert_eq!(gate.state(), AuthorizationState::Authenticated(Role::Admin));
    }

    #[test]
    fn sign_out_discards_inflight_lookup() {
        let mut gate = SessionGate::new();
        let ticket = gate.observe_session(Some(user())).expect("ticket");
        assert!(gate.observe_session(None).is_none());
        assert_eq!(gate.state(), AuthorizationState::Unauthenticated);

        assert_eq!(gate.resolve_role(ticket.seq, Ok(Role::Client)), Resolution::Stale);
        assert_eq!(gate.state(), AuthorizationState::Unauthenticated);
        assert_eq!(gate.decision(), RouteDecision::ShowLogin);
    }

    #[test]
    fn missing_profile_blocks_both_sections() {
        let mut gate = SessionGate::new();
        let ticket = gate.observe_session(Some(user())).expect("ticket");
        assert_eq!(
            gate.resolve_role(ticket.seq, Err(RoleLookupError::NotFound)),
            Resolution::Applied
        );
        assert_eq!(gate.state(), AuthorizationState::Unauthenticated);
        assert_eq!(gate.decision(), RouteDecision::ShowLogin);
        assert_eq!(gate.last_failure(), Some(&RoleLookupError::NotFound));
    }

    #[test]
    fn transient_failure_retries_then_fails_closed() {
        let mut gate = SessionGate::with_retry_budget(2);
        let ticket = gate.observe_session(Some(user())).expect("ticket");

        let unavailable = || Err(RoleLookupError::Unavailable("timeout".into()));

        let Resolution::Retry(retry) = gate.resolve_role(ticket.seq, unavailable()) else {
            panic!("expected first retry");
        };
        assert_eq!(retry.seq, ticket.seq);
        assert_eq!(gate.state(), AuthorizationState::Loading);

        assert!(matches!(
            gate.resolve_role(retry.seq, unavailable()),
            Resolution::Retry(_)
        ));

        // Budget exhausted: fail closed, but keep the cause distinguishable.
        assert_eq!(gate.resolve_role(retry.seq, unavailable()), Resolution::Applied);
        assert_eq!(gate.state(), AuthorizationState::Unauthenticated);
        assert!(matches!(
            gate.last_failure(),
            Some(RoleLookupError::Unavailable(_))
        ));
    }

    #[test]
    fn newer_session_supersedes_a_pending_retry() {
        let mut gate = SessionGate::new();
        let first = gate.observe_session(Some(user())).expect("ticket");
        let Resolution::Retry(retry) = gate.resolve_role(
            first.seq,
            Err(RoleLookupError::Unavailable("blip".into())),
        ) else {
            panic!("expected retry");
        };

        let second = gate.observe_session(Some(user())).expect("ticket");
        assert_eq!(gate.resolve_role(retry.seq, Ok(Role::Client)), Resolution::Stale);
        assert_eq!(gate.resolve_role(second.seq, Ok(Role::Admin)), Resolution::Applied);
        assert_eq!(gate.decision(), RouteDecision::ShowAdminSection);
    }

    #[test]
    fn redelivered_identical_session_does_not_flicker() {
        let mut gate = SessionGate::new();
        let subject = user();

        let first = gate.observe_session(Some(subject)).expect("ticket");
        gate.resolve_role(first.seq, Ok(Role::Client));
        assert_eq!(gate.decision(), RouteDecision::ShowClientSection);

        // Same session delivered again (token refresh, duplicate event).
        let second = gate.observe_session(Some(subject)).expect("ticket");
        assert_eq!(gate.state(), AuthorizationState::Loading);
        assert_eq!(gate.decision(), RouteDecision::ShowClientSection);

        gate.resolve_role(second.seq, Ok(Role::Client));
        assert_eq!(gate.decision(), RouteDecision::ShowClientSection);
        assert_eq!(gate.state(), AuthorizationState::Authenticated(Role::Client));
    }

    #[test]
    fn user_switch_lands_on_the_new_role() {
        let mut gate = SessionGate::new();

        let u1 = gate.observe_session(Some(user())).expect("ticket");
        gate.resolve_role(u1.seq, Ok(Role::Client));
        assert_eq!(gate.decision(), RouteDecision::ShowClientSection);

        // A second sign-in arrives; a late duplicate of U1's lookup must not
        // drag the gate back to the client section.
        let u2 = gate.observe_session(Some(user())).expect("ticket");
        assert_eq!(gate.resolve_role(u1.seq, Ok(Role::Client)), Resolution::Stale);
        assert_eq!(gate.resolve_role(u2.seq, Ok(Role::Admin)), Resolution::Applied);
        assert_eq!(gate.decision(), RouteDecision::ShowAdminSection);
    }
}
