//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::broadcast;

use salon_core::UserId;

use crate::config::SalonConfig;
use crate::services::google::GoogleVerifier;

/// Capacity of the session-change broadcast channel.
const SESSION_EVENT_CAPACITY: usize = 64;

/// A session-change notification published by the auth handlers.
///
/// Fires on sign-in and sign-out; long-lived watchers (the session decision
/// stream) re-derive their authorization state from these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The user signed in (or re-established their session).
    SignedIn(UserId),
    /// The user signed out.
    SignedOut(UserId),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: SalonConfig,
    pool: PgPool,
    google: Option<GoogleVerifier>,
    session_events: broadcast::Sender<SessionEvent>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Application configuration
    /// * `pool` - `PostgreSQL` connection pool
    #[must_use]
    pub fn new(config: SalonConfig, pool: PgPool) -> Self {
        let google = config
            .google_client_id
            .clone()
            .map(GoogleVerifier::new);
        let (session_events, _) = broadcast::channel(SESSION_EVENT_CAPACITY);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                google,
                session_events,
            }),
        }
    }

    /// Get a reference to the application configuration.
    #[must_use]
    pub fn config(&self) -> &SalonConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get the Google ID-token verifier, if configured.
    #[must_use]
    pub fn google(&self) -> Option<&GoogleVerifier> {
        self.inner.google.as_ref()
    }

    /// Publish a session-change event to any active watchers.
    pub fn publish_session_event(&self, event: SessionEvent) {
        // No receivers is the normal case; ignore it.
        let _ = self.inner.session_events.send(event);
    }

    /// Subscribe to session-change events.
    #[must_use]
    pub fn subscribe_session_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.session_events.subscribe()
    }
}
