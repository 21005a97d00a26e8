//! Authorization flow: session bootstrap, role resolution, route gating.
//!
//! The pure sequencing rules live in [`salon_core::authz::SessionGate`];
//! this module drives the gate against real capabilities:
//!
//! - [`SessionSource`] - one bootstrap fetch of the current session plus a
//!   subscription to session-change notifications
//! - [`RoleSource`] - the single profile read behind each lookup ticket
//!
//! Two drivers share the machine. [`resolve_decision`] runs it to
//! completion for one observation (the per-request route gate), and
//! [`SessionFlow`] keeps it running against a change stream, publishing
//! every decision change on a watch channel (the `/api/session/watch`
//! stream). Lookups run under a timeout and are delivered back to the gate
//! tagged with their ticket's sequence number, so a slow lookup for a
//! superseded session is discarded instead of applied.

use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio::sync::{mpsc, watch};

use salon_core::authz::{
    DEFAULT_LOOKUP_RETRIES, Resolution, RoleLookup, RoleLookupError, RouteDecision, SessionGate,
};
use salon_core::{Role, UserId};

use crate::db::RepositoryError;

/// How long a single role lookup may take before it counts as a transient
/// failure.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Tuning for the gate drivers.
#[derive(Debug, Clone)]
pub struct GateOptions {
    /// Per-lookup deadline; an elapsed lookup becomes
    /// [`RoleLookupError::Unavailable`].
    pub lookup_timeout: Duration,
    /// Transient-failure retries per session observation.
    pub lookup_retries: u32,
}

impl Default for GateOptions {
    fn default() -> Self {
        Self {
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
            lookup_retries: DEFAULT_LOOKUP_RETRIES,
        }
    }
}

/// The session fetch itself failed (network/service error).
///
/// Distinct from "no session": the policy for this case is to fail open to
/// the login screen while recording the error.
#[derive(Debug, Clone, thiserror::Error)]
#[error("session fetch failed: {0}")]
pub struct TransportError(pub String);

/// Capability: read the current session and observe session changes.
pub trait SessionSource: Send + Sync {
    /// Fetch the current session once (bootstrap).
    fn current(&self)
    -> impl Future<Output = Result<Option<UserId>, TransportError>> + Send;

    /// Subscribe to session-change notifications. Each item is the session
    /// after the change: `Some(user)` on sign-in or refresh, `None` on
    /// sign-out.
    fn changes(&self) -> impl Stream<Item = Option<UserId>> + Send;
}

/// Capability: read the role stored on a profile row.
pub trait RoleSource: Send + Sync {
    /// Perform exactly one profile read for the given subject.
    fn role_for(
        &self,
        user: UserId,
    ) -> impl Future<Output = Result<Role, RoleLookupError>> + Send;
}

/// [`RoleSource`] backed by the `users` table.
#[derive(Clone)]
pub struct DbRoleSource {
    pool: sqlx::PgPool,
}

impl DbRoleSource {
    #[must_use]
    pub const fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

impl RoleSource for DbRoleSource {
    async fn role_for(&self, user: UserId) -> Result<Role, RoleLookupError> {
        let repo = crate::db::UserRepository::new(&self.pool);
        match repo.role_of(user).await {
            Ok(role) => Ok(role),
            Err(RepositoryError::NotFound) => Err(RoleLookupError::NotFound),
            Err(err) => Err(RoleLookupError::Unavailable(err.to_string())),
        }
    }
}

/// A settled gating outcome for one session observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDecision {
    /// What the navigation shell should render.
    pub decision: RouteDecision,
    /// The failure behind a fail-closed decision, when there was one.
    /// Distinguishes "signed out" from "couldn't verify your account".
    pub failure: Option<RoleLookupError>,
}

/// Run the gate to completion for a single session observation.
///
/// This is the per-request route gate: feed it the session's subject (or
/// `None`), and it performs the role lookup with the configured timeout and
/// retry budget, returning the settled decision.
pub async fn resolve_decision<R: RoleSource>(
    session: Option<UserId>,
    roles: &R,
    options: &GateOptions,
) -> ResolvedDecision {
    let mut gate = SessionGate::with_retry_budget(options.lookup_retries);

    let mut ticket = gate.observe_session(session);
    while let Some(lookup) = ticket {
        let result = run_lookup(roles, lookup, options.lookup_timeout).await;
        ticket = match gate.resolve_role(lookup.seq, result) {
            Resolution::Retry(retry) => Some(retry),
            Resolution::Applied | Resolution::Stale => None,
        };
    }

    log_failure(gate.last_failure(), session);

    ResolvedDecision {
        decision: gate.decision(),
        failure: gate.last_failure().cloned(),
    }
}

/// Perform one role lookup under the deadline.
async fn run_lookup<R: RoleSource>(
    roles: &R,
    ticket: RoleLookup,
    deadline: Duration,
) -> Result<Role, RoleLookupError> {
    match tokio::time::timeout(deadline, roles.role_for(ticket.user)).await {
        Ok(result) => result,
        Err(_) => Err(RoleLookupError::Unavailable(format!(
            "role lookup exceeded {}ms",
            deadline.as_millis()
        ))),
    }
}

fn log_failure(failure: Option<&RoleLookupError>, session: Option<UserId>) {
    match failure {
        Some(RoleLookupError::NotFound) => {
            // The identity layer vouched for a subject we have no profile
            // for; this points at broken provisioning, not a signed-out
            // user.
            tracing::warn!(
                user = ?session,
                "authenticated subject has no profile row; blocking access"
            );
        }
        Some(RoleLookupError::Unavailable(reason)) => {
            tracing::error!(
                user = ?session,
                reason,
                "role lookup failed after retries; failing closed to login"
            );
        }
        None => {}
    }
}

// =============================================================================
// Long-lived flow
// =============================================================================

/// A running session flow: bootstrap fetch, change subscription, and a
/// watch channel carrying the current [`RouteDecision`].
pub struct SessionFlow {
    decisions: watch::Receiver<RouteDecision>,
}

impl SessionFlow {
    /// Spawn a flow over the given sources.
    ///
    /// The flow task ends when the change stream closes; the watch channel
    /// keeps reporting the last decision after that.
    pub fn spawn<S, R>(sessions: S, roles: Arc<R>, options: GateOptions) -> Self
    where
        S: SessionSource + 'static,
        R: RoleSource + 'static,
    {
        let (tx, rx) = watch::channel(RouteDecision::ShowLoadingIndicator);
        tokio::spawn(run_flow(sessions, roles, options, tx));
        Self { decisions: rx }
    }

    /// Subscribe to decision changes.
    #[must_use]
    pub fn decisions(&self) -> watch::Receiver<RouteDecision> {
        self.decisions.clone()
    }
}

async fn run_flow<S, R>(
    sessions: S,
    roles: Arc<R>,
    options: GateOptions,
    tx: watch::Sender<RouteDecision>,
) where
    S: SessionSource,
    R: RoleSource + 'static,
{
    let mut gate = SessionGate::with_retry_budget(options.lookup_retries);
    let (done_tx, mut done_rx) = mpsc::unbounded_channel();

    // Bootstrap: exactly one session fetch. A transport error fails open to
    // the login screen but is recorded.
    let initial = match sessions.current().await {
        Ok(session) => session,
        Err(err) => {
            tracing::error!(error = %err, "session bootstrap failed; treating as signed out");
            None
        }
    };
    if let Some(ticket) = gate.observe_session(initial) {
        spawn_lookup(&roles, &done_tx, ticket, options.lookup_timeout);
    }
    publish(&tx, &gate);

    let mut changes = std::pin::pin!(sessions.changes());
    loop {
        tokio::select! {
            // Every subscriber is gone; stop driving the gate.
            () = tx.closed() => break,
            change = changes.next() => {
                let Some(session) = change else {
                    // Change stream closed; the flow is over.
                    break;
                };
                if let Some(ticket) = gate.observe_session(session) {
                    spawn_lookup(&roles, &done_tx, ticket, options.lookup_timeout);
                }
                publish(&tx, &gate);
            }
            Some((seq, result)) = done_rx.recv() => {
                match gate.resolve_role(seq, result) {
                    Resolution::Applied => log_failure(gate.last_failure(), None),
                    Resolution::Retry(ticket) => {
                        spawn_lookup(&roles, &done_tx, ticket, options.lookup_timeout);
                    }
                    Resolution::Stale => {
                        tracing::debug!(seq, "discarding role lookup for superseded session");
                    }
                }
                publish(&tx, &gate);
            }
        }
    }
}

type LookupResult = (u64, Result<Role, RoleLookupError>);

fn spawn_lookup<R: RoleSource + 'static>(
    roles: &Arc<R>,
    done: &mpsc::UnboundedSender<LookupResult>,
    ticket: RoleLookup,
    deadline: Duration,
) {
    let roles = Arc::clone(roles);
    let done = done.clone();
    tokio::spawn(async move {
        let result = run_lookup(roles.as_ref(), ticket, deadline).await;
        // The flow may have ended while the lookup ran; nothing to do then.
        let _ = done.send((ticket.seq, result));
    });
}

fn publish(tx: &watch::Sender<RouteDecision>, gate: &SessionGate) {
    let decision = gate.decision();
    tx.send_if_modified(|current| {
        if *current == decision {
            false
        } else {
            *current = decision;
            true
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticRoles(Result<Role, RoleLookupError>);

    impl RoleSource for StaticRoles {
        async fn role_for(&self, _user: UserId) -> Result<Role, RoleLookupError> {
            self.0.clone()
        }
    }

    fn user() -> UserId {
        UserId::new(uuid::Uuid::new_v4())
    }

    #[tokio::test]
    async fn absent_session_resolves_to_login_without_a_lookup() {
        // A role source that would panic if consulted.
        struct NoRoles;
        impl RoleSource for NoRoles {
            async fn role_for(&self, _user: UserId) -> Result<Role, RoleLookupError> {
                panic!("role lookup must not run for an absent session");
            }
        }

        let resolved = resolve_decision(None, &NoRoles, &GateOptions::default()).await;
        assert_eq!(resolved.decision, RouteDecision::ShowLogin);
        assert_eq!(resolved.failure, None);
    }

    #[tokio::test]
    async fn resolved_role_picks_the_matching_section() {
        let resolved = resolve_decision(
            Some(user()),
            &StaticRoles(Ok(Role::Admin)),
            &GateOptions::default(),
        )
        .await;
        assert_eq!(resolved.decision, RouteDecision::ShowAdminSection);

        let resolved = resolve_decision(
            Some(user()),
            &StaticRoles(Ok(Role::Client)),
            &GateOptions::default(),
        )
        .await;
        assert_eq!(resolved.decision, RouteDecision::ShowClientSection);
    }

    #[tokio::test]
    async fn missing_profile_fails_closed_with_the_cause() {
        let resolved = resolve_decision(
            Some(user()),
            &StaticRoles(Err(RoleLookupError::NotFound)),
            &GateOptions::default(),
        )
        .await;
        assert_eq!(resolved.decision, RouteDecision::ShowLogin);
        assert_eq!(resolved.failure, Some(RoleLookupError::NotFound));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_lookup_times_out_as_transient_failure() {
        struct NeverRoles;
        impl RoleSource for NeverRoles {
            async fn role_for(&self, _user: UserId) -> Result<Role, RoleLookupError> {
                std::future::pending().await
            }
        }

        let options = GateOptions {
            lookup_timeout: Duration::from_millis(50),
            lookup_retries: 1,
        };
        let resolved = resolve_decision(Some(user()), &NeverRoles, &options).await;
        assert_eq!(resolved.decision, RouteDecision::ShowLogin);
        assert!(matches!(
            resolved.failure,
            Some(RoleLookupError::Unavailable(_))
        ));
    }
}
