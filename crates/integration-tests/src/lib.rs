//! Integration tests for Smart Salon.
//!
//! The tests drive the public crate APIs without a live database or
//! identity provider: session and role sources are replaced by the mocks
//! in this library, which let a test script sign-ins, sign-outs, slow
//! lookups, and failures, then observe the route decisions the flow
//! publishes.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p salon-integration-tests
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::Stream;
use tokio::sync::broadcast;

use salon_app::services::authz::{RoleSource, SessionSource, TransportError};
use salon_core::authz::RoleLookupError;
use salon_core::{Role, UserId};

/// Buffered mock of the session capability.
///
/// Change events are buffered from construction, so a test may publish
/// before the flow under test has subscribed without losing events.
pub struct MockSessions {
    initial: Result<Option<UserId>, TransportError>,
    changes: Mutex<Option<broadcast::Receiver<Option<UserId>>>>,
}

impl MockSessions {
    /// Create a mock with the given bootstrap answer. The returned sender
    /// publishes change events.
    #[must_use]
    pub fn new(
        initial: Result<Option<UserId>, TransportError>,
    ) -> (Self, broadcast::Sender<Option<UserId>>) {
        let (tx, rx) = broadcast::channel(16);
        (
            Self {
                initial,
                changes: Mutex::new(Some(rx)),
            },
            tx,
        )
    }
}

impl SessionSource for MockSessions {
    async fn current(&self) -> Result<Option<UserId>, TransportError> {
        self.initial.clone()
    }

    fn changes(&self) -> impl Stream<Item = Option<UserId>> + Send {
        let mut rx = self
            .changes
            .lock()
            .expect("mock changes lock")
            .take()
            .expect("changes() called twice on MockSessions");
        async_stream::stream! {
            loop {
                match rx.recv().await {
                    Ok(session) => yield session,
                    Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
}

/// One scripted role lookup: wait `delay`, then answer `result`.
#[derive(Debug, Clone)]
pub struct ScriptedLookup {
    pub delay: Duration,
    pub result: Result<Role, RoleLookupError>,
}

impl ScriptedLookup {
    /// An immediate answer.
    #[must_use]
    pub const fn instant(result: Result<Role, RoleLookupError>) -> Self {
        Self {
            delay: Duration::ZERO,
            result,
        }
    }

    /// An answer delivered after `delay`.
    #[must_use]
    pub const fn after(delay: Duration, result: Result<Role, RoleLookupError>) -> Self {
        Self { delay, result }
    }
}

/// Scripted mock of the profile-role capability.
///
/// Each user id has a queue of scripted lookups consumed in order; when
/// the queue runs dry the last script repeats. Unknown users answer
/// `NotFound`. Every call is counted.
pub struct ScriptedRoles {
    scripts: Mutex<HashMap<UserId, VecDeque<ScriptedLookup>>>,
    calls: AtomicUsize,
}

impl ScriptedRoles {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        })
    }

    /// Append a scripted lookup for a user.
    #[must_use]
    pub fn script(self: Arc<Self>, user: UserId, lookup: ScriptedLookup) -> Arc<Self> {
        self.scripts
            .lock()
            .expect("scripts lock")
            .entry(user)
            .or_default()
            .push_back(lookup);
        self
    }

    /// How many lookups have been performed.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_for(&self, user: UserId) -> ScriptedLookup {
        let mut scripts = self.scripts.lock().expect("scripts lock");
        match scripts.get_mut(&user) {
            Some(queue) => {
                if queue.len() > 1 {
                    queue.pop_front().expect("non-empty queue")
                } else {
                    queue
                        .front()
                        .cloned()
                        .unwrap_or(ScriptedLookup::instant(Err(RoleLookupError::NotFound)))
                }
            }
            None => ScriptedLookup::instant(Err(RoleLookupError::NotFound)),
        }
    }
}

impl RoleSource for ScriptedRoles {
    async fn role_for(&self, user: UserId) -> Result<Role, RoleLookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let lookup = self.next_for(user);
        if lookup.delay > Duration::ZERO {
            tokio::time::sleep(lookup.delay).await;
        }
        lookup.result
    }
}
