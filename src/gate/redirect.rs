use crate::identity::Identity;

use super::decision::GateDecision;

/// Where gate redirects point and how the requested path travels through login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTargets {
    pub login_path: String,
    pub unauthorized_path: String,
    /// Query parameter on the login URL carrying the originally requested path.
    pub return_param: String,
}

impl Default for RedirectTargets {
    fn default() -> Self {
        Self {
            login_path: "/login".into(),
            unauthorized_path: "/unauthorized".into(),
            return_param: "redirect".into(),
        }
    }
}

impl RedirectTargets {
    /// URL to navigate to for a redirecting decision; `None` for loading or render.
    pub fn target_for(&self, decision: &GateDecision) -> Option<String> {
        match decision {
            GateDecision::RedirectToLogin { original_path } => Some(self.login_url(original_path)),
            GateDecision::RedirectToUnauthorized => Some(self.unauthorized_path.clone()),
            GateDecision::ShowLoading | GateDecision::ShowChildren => None,
        }
    }

    pub fn login_url(&self, original_path: &str) -> String {
        if !is_local_path(original_path) {
            return self.login_path.clone();
        }
        let sep = if self.login_path.contains('?') { '&' } else { '?' };
        format!("{}{}{}={}", self.login_path, sep, self.return_param, urlencoding::encode(original_path))
    }

    /// Recover the carried path from a login URL's query string (with or without
    /// the leading `?`). Only same-site absolute paths come back.
    pub fn return_path_from_query(&self, query: &str) -> Option<String> {
        let query = query.strip_prefix('?').unwrap_or(query);
        for pair in query.split('&') {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            if k != self.return_param {
                continue;
            }
            let decoded = urlencoding::decode(&v.replace('+', " ")).ok()?.into_owned();
            return is_local_path(&decoded).then_some(decoded);
        }
        None
    }

    /// Where to land after a successful login: the carried path, else the role's home,
    /// else the generic dashboard.
    pub fn post_login_target(&self, identity: &Identity, carried: Option<&str>) -> String {
        if let Some(p) = carried.filter(|p| is_local_path(p) && !self.is_login_path(p)) {
            return p.to_string();
        }
        identity.role.map(|r| r.home_path().to_string()).unwrap_or_else(|| "/dashboard".to_string())
    }

    fn is_login_path(&self, p: &str) -> bool {
        let path_only = p.split(['?', '#']).next().unwrap_or(p);
        path_only.trim_end_matches('/') == self.login_path.trim_end_matches('/')
    }
}

// Rejects scheme-relative ("//evil") and backslash tricks browsers normalise to them.
fn is_local_path(p: &str) -> bool {
    p.starts_with('/') && !p.starts_with("//") && !p.starts_with("/\\") && !p.chars().any(|c| c.is_control())
}
