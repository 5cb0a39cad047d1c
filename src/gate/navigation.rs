use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

use crate::identity::SessionState;

use super::decision::{decide, GateDecision, LoadingPolicy};
use super::requirement::{RouteRequirement, RouteTable};

/// Per-navigation gate state. `Pending` only exists before the first evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    Pending,
    Loading,
    Granted,
    DeniedUnauth,
    DeniedRole,
}

impl From<&GateDecision> for GateState {
    fn from(d: &GateDecision) -> Self {
        match d {
            GateDecision::ShowLoading => GateState::Loading,
            GateDecision::ShowChildren => GateState::Granted,
            GateDecision::RedirectToLogin { .. } => GateState::DeniedUnauth,
            GateDecision::RedirectToUnauthorized => GateState::DeniedRole,
        }
    }
}

/// One navigation bound to the live session. Re-evaluates only when the session
/// changes or the route changes; it never polls.
pub struct NavigationGate {
    routes: Arc<RouteTable>,
    policy: LoadingPolicy,
    session: watch::Receiver<SessionState>,
    path: String,
    requirement: RouteRequirement,
    state: GateState,
    decision: Option<GateDecision>,
}

impl NavigationGate {
    pub fn new(routes: Arc<RouteTable>, policy: LoadingPolicy, session: watch::Receiver<SessionState>, path: &str) -> Self {
        let requirement = routes.lookup(path).clone();
        Self {
            routes,
            policy,
            session,
            path: path.to_string(),
            requirement,
            state: GateState::Pending,
            decision: None,
        }
    }

    pub fn path(&self) -> &str { &self.path }

    pub fn requirement(&self) -> &RouteRequirement { &self.requirement }

    /// State as of the last evaluation (`Pending` before any).
    pub fn state(&self) -> GateState { self.state }

    /// Evaluate against the latest session snapshot.
    pub fn evaluate(&mut self) -> GateDecision {
        let decision = {
            let snap = self.session.borrow_and_update();
            decide(&snap, &self.requirement, &self.path, self.policy)
        };
        let next = GateState::from(&decision);
        if next != self.state {
            debug!(target: "coursegate::gate", "gate {} -> {:?} for {}", state_name(self.state), next, self.path);
        }
        self.state = next;
        self.decision = Some(decision.clone());
        decision
    }

    /// Last decision, evaluating first if nothing has been evaluated yet.
    pub fn decision(&mut self) -> GateDecision {
        match &self.decision {
            Some(d) => d.clone(),
            None => self.evaluate(),
        }
    }

    /// Route change: look the new path up and re-evaluate.
    pub fn navigate(&mut self, path: &str) -> GateDecision {
        self.path = path.to_string();
        self.requirement = self.routes.lookup(path).clone();
        self.state = GateState::Pending;
        self.decision = None;
        self.evaluate()
    }

    /// Wait for the next session change and re-evaluate. `None` once the session
    /// store is gone.
    pub async fn changed(&mut self) -> Option<GateDecision> {
        self.session.changed().await.ok()?;
        Some(self.evaluate())
    }

    /// Wait until the gate is out of `Loading`. Returns the settled decision, or the
    /// last one if the session store goes away first.
    pub async fn settle(&mut self) -> GateDecision {
        let mut d = self.evaluate();
        while d == GateDecision::ShowLoading {
            match self.changed().await {
                Some(next) => d = next,
                None => break,
            }
        }
        d
    }
}

fn state_name(s: GateState) -> &'static str {
    match s {
        GateState::Pending => "pending",
        GateState::Loading => "loading",
        GateState::Granted => "granted",
        GateState::DeniedUnauth => "denied_unauth",
        GateState::DeniedRole => "denied_role",
    }
}
