use serde::{Deserialize, Serialize};

use crate::identity::{SessionState, SessionStatus};

use super::requirement::RouteRequirement;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GateDecision {
    ShowLoading,
    ShowChildren,
    /// Carries the path that was asked for so login can send the user back.
    RedirectToLogin { original_path: String },
    RedirectToUnauthorized,
}

impl GateDecision {
    pub fn may_render(&self) -> bool {
        matches!(self, GateDecision::ShowChildren)
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, GateDecision::RedirectToLogin { .. } | GateDecision::RedirectToUnauthorized)
    }
}

/// What public routes do while the session is still being restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadingPolicy {
    /// Every route shows the loading placeholder until the session settles.
    #[default]
    DeferAll,
    /// Routes that need no auth render immediately; only protected routes wait.
    BypassPublic,
}

impl LoadingPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "defer_all" | "defer" => Some(LoadingPolicy::DeferAll),
            "bypass_public" | "bypass" => Some(LoadingPolicy::BypassPublic),
            _ => None,
        }
    }
}

/// Decide what to do with a navigation to `path` given the current session.
///
/// Pure and synchronous. Order: pending session, public route, missing identity,
/// role restriction, grant.
pub fn decide(session: &SessionState, requirement: &RouteRequirement, path: &str, policy: LoadingPolicy) -> GateDecision {
    let pending = matches!(session.status, SessionStatus::Unresolved | SessionStatus::Resolving);
    if pending && !(policy == LoadingPolicy::BypassPublic && !requirement.requires_auth) {
        return GateDecision::ShowLoading;
    }
    if !requirement.requires_auth {
        return GateDecision::ShowChildren;
    }
    // Failed sessions carry no identity, so they land here too.
    let Some(identity) = session.identity.as_ref() else {
        return GateDecision::RedirectToLogin { original_path: path.to_string() };
    };
    if !requirement.allowed_roles.admits(identity.role) {
        return GateDecision::RedirectToUnauthorized;
    }
    GateDecision::ShowChildren
}
