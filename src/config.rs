//! Runtime configuration read from `COURSEGATE_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

use crate::error::ConfigError;
use crate::gate::{LoadingPolicy, RedirectTargets, RouteTable};
use crate::identity::DEFAULT_PROFILE_TIMEOUT;

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8080/api";

#[derive(Debug, Clone)]
pub struct GateConfig {
    pub api_base: String,
    pub profile_timeout: Duration,
    pub redirects: RedirectTargets,
    pub loading_policy: LoadingPolicy,
    /// JSON route table; the built-in marketplace table when unset.
    pub routes_file: Option<PathBuf>,
    /// Bearer token to start with, if the shell already holds one.
    pub token: Option<String>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            profile_timeout: DEFAULT_PROFILE_TIMEOUT,
            redirects: RedirectTargets::default(),
            loading_policy: LoadingPolicy::default(),
            routes_file: None,
            token: None,
        }
    }
}

impl GateConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from any key lookup. Unset or blank keys keep their defaults.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(get: F) -> Result<Self, ConfigError> {
        let get = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut cfg = GateConfig::default();
        if let Some(v) = get("COURSEGATE_API_BASE") {
            cfg.api_base = v;
        }
        if let Some(v) = get("COURSEGATE_PROFILE_TIMEOUT_MS") {
            let ms = v.parse::<u64>().ok().filter(|ms| *ms > 0).ok_or_else(|| ConfigError::InvalidValue {
                key: "COURSEGATE_PROFILE_TIMEOUT_MS".into(),
                value: v.clone(),
            })?;
            cfg.profile_timeout = Duration::from_millis(ms);
        }
        if let Some(v) = get("COURSEGATE_LOGIN_PATH") {
            cfg.redirects.login_path = v;
        }
        if let Some(v) = get("COURSEGATE_UNAUTHORIZED_PATH") {
            cfg.redirects.unauthorized_path = v;
        }
        if let Some(v) = get("COURSEGATE_RETURN_PARAM") {
            cfg.redirects.return_param = v;
        }
        if let Some(v) = get("COURSEGATE_LOADING_POLICY") {
            cfg.loading_policy = LoadingPolicy::parse(&v)
                .ok_or_else(|| ConfigError::InvalidValue { key: "COURSEGATE_LOADING_POLICY".into(), value: v.clone() })?;
        }
        cfg.routes_file = get("COURSEGATE_ROUTES_FILE").map(PathBuf::from);
        cfg.token = get("COURSEGATE_TOKEN");
        Ok(cfg)
    }

    pub fn load_routes(&self) -> Result<RouteTable, ConfigError> {
        match &self.routes_file {
            Some(p) => {
                let table = RouteTable::load(p)?;
                info!(target: "startup", "loaded {} routes from {}", table.len(), p.display());
                Ok(table)
            }
            None => Ok(RouteTable::marketplace()),
        }
    }
}
