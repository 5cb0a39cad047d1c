use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::AuthError;

use super::provider::ProfileApi;
use super::session::{Applied, SessionAction, SessionStatus, SessionStore};

pub const DEFAULT_PROFILE_TIMEOUT: Duration = Duration::from_secs(10);

/// Restores "who is signed in" by asking the profile API, and publishes the answer
/// into the shared [`SessionStore`]. Never retries on its own.
#[derive(Clone)]
pub struct SessionBootstrapper {
    store: SessionStore,
    api: Arc<dyn ProfileApi>,
    timeout: Duration,
    mounted: Arc<AtomicBool>,
    disposed: Arc<AtomicBool>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl SessionBootstrapper {
    pub fn new(store: SessionStore, api: Arc<dyn ProfileApi>) -> Self {
        Self {
            store,
            api,
            timeout: DEFAULT_PROFILE_TIMEOUT,
            mounted: Arc::new(AtomicBool::new(false)),
            disposed: Arc::new(AtomicBool::new(false)),
            task: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration { self.timeout }

    pub fn store(&self) -> &SessionStore { &self.store }

    pub fn is_disposed(&self) -> bool { self.disposed.load(Ordering::Acquire) }

    /// Start the one bootstrap owed to this mount on the current tokio runtime.
    /// Returns false when already mounted, disposed, or called outside a runtime
    /// (in which case a later call from inside one may still mount).
    pub fn mount(&self) -> bool {
        let Ok(rt) = tokio::runtime::Handle::try_current() else {
            warn!(target: "coursegate::session", "mount called outside a tokio runtime; session not bootstrapped");
            return false;
        };
        if self.is_disposed() || self.mounted.swap(true, Ordering::AcqRel) {
            return false;
        }
        let this = self.clone();
        let handle = rt.spawn(async move {
            this.bootstrap().await;
        });
        *self.task.lock() = Some(handle);
        true
    }

    /// Resolve the session now. Used by `mount` and by explicit re-triggers after
    /// login. Returns the status the store holds once this attempt is done; when a
    /// logout or a newer attempt superseded it, that is the newer status.
    pub async fn bootstrap(&self) -> SessionStatus {
        if self.is_disposed() {
            return self.store.status();
        }
        let Applied::Begun(ticket) = self.store.dispatch(SessionAction::Begin) else {
            return self.store.status();
        };
        info!(target: "coursegate::session", "resolving session: ticket={} timeout_ms={}", ticket, self.timeout.as_millis());

        let outcome = match tokio::time::timeout(self.timeout, self.api.fetch_profile()).await {
            Ok(res) => res,
            Err(_) => Err(AuthError::timeout(self.timeout)),
        };

        if self.is_disposed() {
            debug!(target: "coursegate::session", "bootstrapper disposed; dropping result for ticket={}", ticket);
            return self.store.status();
        }
        match self.store.dispatch(SessionAction::Settle { generation: ticket, outcome }) {
            Applied::Settled(status) => status,
            _ => self.store.status(),
        }
    }

    /// Tear down: abort the mounted fetch if it is still running and ignore anything
    /// this bootstrapper would publish afterwards. Terminal: a fetch interrupted here
    /// leaves the store in `Resolving` for good, so gates on it keep showing loading
    /// and the owning context must not be used again.
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::Release);
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
        }
    }
}
