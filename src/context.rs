//! `AuthContext` is what the application shell holds: one session store, its
//! bootstrapper, the route table and redirect settings. Views ask it for gate
//! decisions; login/logout flows call its mutators.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::GateConfig;
use crate::error::AuthError;
use crate::gate::{decide, GateDecision, LoadingPolicy, NavigationGate, RedirectTargets, RouteTable};
use crate::identity::{ProfileApi, SessionAction, SessionBootstrapper, SessionState, SessionStatus, SessionStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoutOutcome {
    /// Local session cleared and the server acknowledged.
    Completed,
    /// Local session cleared; the remote call failed and was only logged.
    RemoteFailed(AuthError),
}

#[derive(Clone)]
pub struct AuthContext {
    store: SessionStore,
    bootstrapper: SessionBootstrapper,
    api: Arc<dyn ProfileApi>,
    routes: Arc<RouteTable>,
    redirects: RedirectTargets,
    policy: LoadingPolicy,
}

impl AuthContext {
    pub fn new(api: Arc<dyn ProfileApi>, routes: RouteTable) -> Self {
        let store = SessionStore::new();
        let bootstrapper = SessionBootstrapper::new(store.clone(), api.clone());
        Self {
            store,
            bootstrapper,
            api,
            routes: Arc::new(routes),
            redirects: RedirectTargets::default(),
            policy: LoadingPolicy::default(),
        }
    }

    /// Context wired from configuration (timeout, redirects, loading policy, routes).
    pub fn from_config(api: Arc<dyn ProfileApi>, cfg: &GateConfig) -> Result<Self, crate::error::ConfigError> {
        let routes = cfg.load_routes()?;
        let mut ctx = Self::new(api, routes)
            .with_redirects(cfg.redirects.clone())
            .with_loading_policy(cfg.loading_policy);
        ctx.bootstrapper = ctx.bootstrapper.with_timeout(cfg.profile_timeout);
        Ok(ctx)
    }

    pub fn with_redirects(mut self, redirects: RedirectTargets) -> Self {
        self.redirects = redirects;
        self
    }

    pub fn with_loading_policy(mut self, policy: LoadingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &SessionStore { &self.store }

    pub fn routes(&self) -> &RouteTable { &self.routes }

    pub fn redirects(&self) -> &RedirectTargets { &self.redirects }

    pub fn loading_policy(&self) -> LoadingPolicy { self.policy }

    pub fn snapshot(&self) -> SessionState { self.store.snapshot() }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> { self.store.subscribe() }

    /// Gate decision for `path` against the session as it is right now.
    pub fn current_gate_decision(&self, path: &str) -> GateDecision {
        let snap = self.store.snapshot();
        decide(&snap, self.routes.lookup(path), path, self.policy)
    }

    /// Decision plus where to send the browser when it is a redirect.
    pub fn resolve(&self, path: &str) -> (GateDecision, Option<String>) {
        let d = self.current_gate_decision(path);
        let target = self.redirects.target_for(&d);
        (d, target)
    }

    /// Long-lived gate for one navigation that follows session changes.
    pub fn navigate(&self, path: &str) -> NavigationGate {
        NavigationGate::new(self.routes.clone(), self.policy, self.store.subscribe(), path)
    }

    /// Application start: kick off the single bootstrap in the background.
    pub fn mount(&self) -> bool {
        self.bootstrapper.mount()
    }

    /// Explicit (re-)resolution, e.g. right after login.
    pub async fn bootstrap_session(&self) -> SessionStatus {
        self.bootstrapper.bootstrap().await
    }

    /// Drop the local session immediately. Any profile fetch already in flight will
    /// find its ticket outdated and be discarded.
    pub fn clear_session(&self) {
        self.store.dispatch(SessionAction::Clear);
        info!(target: "coursegate::session", "session cleared: gen={}", self.store.generation());
    }

    /// Clear locally, then tell the server. The local clear stands whatever the
    /// server answers.
    pub async fn logout(&self) -> LogoutOutcome {
        self.clear_session();
        match self.api.logout().await {
            Ok(()) => LogoutOutcome::Completed,
            Err(e) => {
                warn!(target: "coursegate::session", "remote logout failed ({}); local session already cleared", e);
                LogoutOutcome::RemoteFailed(e)
            }
        }
    }

    /// Terminal teardown; see [`SessionBootstrapper::dispose`]. Do not use the
    /// context afterwards.
    pub fn dispose(&self) {
        self.bootstrapper.dispose();
    }
}
