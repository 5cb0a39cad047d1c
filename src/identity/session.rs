use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::{AuthError, AuthResult};
use crate::tprintln;

use super::principal::Identity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Nothing has been attempted yet.
    Unresolved,
    /// A profile fetch is in flight.
    Resolving,
    /// Definitive answer: signed in, told "not signed in", or cleared by logout.
    Resolved,
    /// Fetch failed for a transport, timeout or parsing reason. Gates exactly like
    /// `Resolved` without identity, but is a distinct value: code asking "is the
    /// session known yet?" must use [`SessionStatus::is_settled`], not `== Resolved`.
    Failed,
}

impl SessionStatus {
    /// True once bootstrap has finished, successfully or not (`Resolved` or `Failed`).
    pub fn is_settled(&self) -> bool {
        matches!(self, SessionStatus::Resolved | SessionStatus::Failed)
    }
}

#[derive(Debug, Clone)]
pub struct SessionState {
    pub status: SessionStatus,
    pub identity: Option<Identity>,
    pub generation: u64,
    pub last_error: Option<AuthError>,
    pub updated_at: DateTime<Utc>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            status: SessionStatus::Unresolved,
            identity: None,
            generation: 0,
            last_error: None,
            updated_at: Utc::now(),
        }
    }
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Snapshot with the given status and identity, for callers that evaluate gates
    /// against a hand-built session (previews, tests, benches).
    pub fn with(status: SessionStatus, identity: Option<Identity>) -> Self {
        Self { status, identity, ..Default::default() }
    }
}

/// Writes accepted by the store. Only the bootstrapper and `clear_session` dispatch.
#[derive(Debug)]
pub(crate) enum SessionAction {
    Begin,
    Settle { generation: u64, outcome: AuthResult<Identity> },
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Applied {
    /// Fetch may start; carries the generation ticket the result must present.
    Begun(u64),
    Settled(SessionStatus),
    /// Settle for a generation that is no longer current; nothing changed.
    Stale,
    Cleared,
}

struct Inner {
    state: RwLock<SessionState>,
    tx: watch::Sender<SessionState>,
}

/// Process-wide session holder. Cheap to clone; all clones share one state.
///
/// Readers take snapshots or subscribe to changes; every write goes through
/// `dispatch`, which applies one transition under the write lock and then
/// publishes the new snapshot to subscribers.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl Default for SessionStore {
    fn default() -> Self { Self::new() }
}

impl SessionStore {
    pub fn new() -> Self {
        let state = SessionState::default();
        let (tx, _rx) = watch::channel(state.clone());
        Self { inner: Arc::new(Inner { state: RwLock::new(state), tx }) }
    }

    pub fn snapshot(&self) -> SessionState {
        self.inner.state.read().clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.inner.state.read().status
    }

    pub fn generation(&self) -> u64 {
        self.inner.state.read().generation
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.tx.subscribe()
    }

    pub(crate) fn dispatch(&self, action: SessionAction) -> Applied {
        let mut st = self.inner.state.write();
        let applied = match action {
            SessionAction::Begin => {
                st.generation += 1;
                st.status = SessionStatus::Resolving;
                st.identity = None;
                st.last_error = None;
                Applied::Begun(st.generation)
            }
            SessionAction::Settle { generation, outcome } => {
                if generation != st.generation || st.status != SessionStatus::Resolving {
                    debug!(
                        target: "coursegate::session",
                        "discarding stale profile result: ticket={} current={} status={:?}",
                        generation, st.generation, st.status
                    );
                    return Applied::Stale;
                }
                match outcome {
                    Ok(identity) => {
                        info!(target: "coursegate::session", "session resolved: user={} role={:?}", identity.id, identity.role);
                        st.identity = Some(identity);
                        st.status = SessionStatus::Resolved;
                        st.last_error = None;
                    }
                    Err(e) => {
                        st.identity = None;
                        st.status = if e.is_definitive() { SessionStatus::Resolved } else { SessionStatus::Failed };
                        info!(target: "coursegate::session", "session unauthenticated: status={:?} reason={}", st.status, e.code_str());
                        st.last_error = Some(e);
                    }
                }
                Applied::Settled(st.status)
            }
            SessionAction::Clear => {
                st.generation += 1;
                st.identity = None;
                st.status = SessionStatus::Resolved;
                st.last_error = None;
                Applied::Cleared
            }
        };
        st.updated_at = Utc::now();
        tprintln!("session.dispatch applied={:?} gen={} status={:?}", applied, st.generation, st.status);
        self.inner.tx.send_replace(st.clone());
        applied
    }
}
