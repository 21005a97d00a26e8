//! Session decision API for the navigation shell.
//!
//! The shell never inspects sessions or roles itself; it consumes a single
//! renderable decision. `GET /api/session` answers once; `GET
//! /api/session/watch` keeps a flow running against the app-wide
//! session-change broadcast and streams every decision change as a
//! server-sent event.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use futures::Stream;
use serde::Serialize;
use tokio::sync::broadcast;

use salon_core::UserId;
use salon_core::authz::{RoleLookupError, RouteDecision};

use crate::middleware::OptionalUser;
use crate::services::authz::{
    DbRoleSource, GateOptions, SessionFlow, SessionSource, TransportError, resolve_decision,
};
use crate::state::{AppState, SessionEvent};

/// Build the session API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/session", get(current_decision))
        .route("/api/session/watch", get(watch))
}

/// JSON shape of a decision answer.
#[derive(Debug, Serialize)]
pub struct SessionDecisionResponse {
    pub decision: RouteDecision,
    /// Present when the decision fell closed because the account could not
    /// be verified (as opposed to being signed out).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retriable: Option<bool>,
}

impl SessionDecisionResponse {
    fn new(decision: RouteDecision, failure: Option<&RoleLookupError>) -> Self {
        Self {
            decision,
            retriable: match failure {
                Some(RoleLookupError::Unavailable(_)) => Some(true),
                _ => None,
            },
        }
    }
}

/// Answer the current route decision once.
///
/// GET /api/session
pub async fn current_decision(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
) -> Json<SessionDecisionResponse> {
    let roles = DbRoleSource::new(state.pool().clone());
    let resolved =
        resolve_decision(user.map(|u| u.id), &roles, &GateOptions::default()).await;

    Json(SessionDecisionResponse::new(
        resolved.decision,
        resolved.failure.as_ref(),
    ))
}

/// [`SessionSource`] for one watch connection.
///
/// The bootstrap session is whatever the request's cookie session held;
/// changes are the app-wide sign-in/sign-out broadcast filtered down to
/// that subject. A broadcast about someone else's session is not a change
/// to this one.
struct WatchSource {
    state: AppState,
    user: Option<UserId>,
}

impl SessionSource for WatchSource {
    async fn current(&self) -> Result<Option<UserId>, TransportError> {
        Ok(self.user)
    }

    fn changes(&self) -> impl Stream<Item = Option<UserId>> + Send {
        let mut events = self.state.subscribe_session_events();
        let watched = self.user;
        async_stream::stream! {
            loop {
                match events.recv().await {
                    Ok(event) => match (watched, event) {
                        (Some(user), SessionEvent::SignedOut(id)) if id == user => yield None,
                        // Re-delivery of the same subject (another device
                        // signing in) re-derives the role; the gate keeps
                        // the visible decision stable if it is unchanged.
                        (Some(user), SessionEvent::SignedIn(id)) if id == user => {
                            yield Some(user);
                        }
                        _ => {}
                    },
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "session watch lagged behind the event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
}

/// Stream route decision changes for this session.
///
/// GET /api/session/watch
pub async fn watch(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let source = WatchSource {
        user: user.map(|u| u.id),
        state: state.clone(),
    };
    let roles = Arc::new(DbRoleSource::new(state.pool().clone()));
    let flow = SessionFlow::spawn(source, roles, GateOptions::default());

    let mut decisions = flow.decisions();
    let stream = async_stream::stream! {
        loop {
            let decision = *decisions.borrow_and_update();
            let payload = SessionDecisionResponse::new(decision, None);
            match Event::default().event("decision").json_data(&payload) {
                Ok(event) => yield Ok(event),
                Err(e) => tracing::error!("failed to encode decision event: {e}"),
            }
            if decisions.changed().await.is_err() {
                break;
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}
