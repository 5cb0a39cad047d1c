use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{StatusCode, Url};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{AuthError, AuthResult};

use super::principal::Identity;
use super::role::Role;

/// The two remote operations the session layer consumes. Everything else about the
/// marketplace API lives outside this crate.
#[async_trait]
pub trait ProfileApi: Send + Sync {
    /// Resolve the identity behind the ambient credential.
    async fn fetch_profile(&self) -> AuthResult<Identity>;
    /// Best-effort remote session invalidation.
    async fn logout(&self) -> AuthResult<()>;
}

/// Parse a profile body at the API boundary. Accepts a bare object or one wrapped in
/// `data` / `user`. `id` and `role` must be present; an unrecognised role string is
/// kept as `role: None` so restricted routes reject it.
pub fn parse_profile(body: &Value) -> AuthResult<Identity> {
    let obj = body
        .get("data")
        .or_else(|| body.get("user"))
        .filter(|v| v.is_object())
        .unwrap_or(body);
    if !obj.is_object() {
        return Err(AuthError::malformed("profile is not an object"));
    }
    let id = match obj.get("id").or_else(|| obj.get("_id")) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(AuthError::malformed("missing id")),
    };
    let role = match obj.get("role") {
        Some(Value::String(s)) => Role::parse(s),
        Some(Value::Null) | None => return Err(AuthError::malformed("missing role")),
        Some(_) => None,
    };
    if role.is_none() {
        warn!(target: "coursegate::api", "profile for user={} carries unrecognised role {:?}", id, obj.get("role"));
    }
    let text = |k: &str| obj.get(k).and_then(|v| v.as_str()).map(|s| s.to_string());
    Ok(Identity {
        id,
        name: text("name").unwrap_or_default(),
        email: text("email").unwrap_or_default(),
        role,
        avatar_url: text("avatarUrl").or_else(|| text("avatar_url")),
    })
}

/// `ProfileApi` over the marketplace HTTP API with a bearer token held in memory.
pub struct HttpProfileApi {
    base: Url,
    client: reqwest::Client,
    token: RwLock<Option<String>>,
}

impl HttpProfileApi {
    pub fn new(base: &str) -> anyhow::Result<Self> {
        // join() treats the last segment as a file unless the base ends with '/'
        let normalized = if base.ends_with('/') { base.to_string() } else { format!("{}/", base) };
        let base = Url::parse(&normalized).map_err(|e| anyhow::anyhow!("invalid API base URL '{}': {}", base, e))?;
        let client = reqwest::Client::builder().build()?;
        Ok(Self { base, client, token: RwLock::new(None) })
    }

    pub fn with_token<S: Into<String>>(self, token: S) -> Self {
        self.set_token(token);
        self
    }

    pub fn set_token<S: Into<String>>(&self, token: S) {
        let t = token.into();
        *self.token.write() = if t.trim().is_empty() { None } else { Some(t) };
    }

    pub fn clear_token(&self) {
        *self.token.write() = None;
    }

    pub fn has_token(&self) -> bool {
        self.token.read().is_some()
    }

    pub fn base(&self) -> &Url { &self.base }

    fn bearer(&self) -> Option<HeaderValue> {
        let t = self.token.read().clone()?;
        HeaderValue::from_str(&format!("Bearer {}", t)).ok()
    }

    fn endpoint(&self, path: &str) -> AuthResult<Url> {
        self.base.join(path).map_err(|e| AuthError::network(format!("bad endpoint {}: {}", path, e)))
    }
}

#[async_trait]
impl ProfileApi for HttpProfileApi {
    async fn fetch_profile(&self) -> AuthResult<Identity> {
        let Some(auth) = self.bearer() else {
            debug!(target: "coursegate::api", "no bearer token; skipping profile request");
            return Err(AuthError::Unauthenticated);
        };
        let url = self.endpoint("auth/profile")?;
        let resp = self.client.get(url).header(AUTHORIZATION, auth).send().await?;
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AuthError::Unauthenticated);
        }
        if !status.is_success() {
            return Err(AuthError::network(format!("profile request failed: HTTP {}", status)));
        }
        let body: Value = resp.json().await.map_err(|e| AuthError::malformed(e.to_string()))?;
        parse_profile(&body)
    }

    async fn logout(&self) -> AuthResult<()> {
        let auth = self.bearer();
        // Local credential goes regardless of what the server says.
        self.clear_token();
        let Some(auth) = auth else { return Ok(()); };
        let url = self.endpoint("auth/logout")?;
        let resp = self.client.post(url).header(AUTHORIZATION, auth).send().await?;
        let status = resp.status();
        if status.is_success() || status == StatusCode::UNAUTHORIZED {
            return Ok(());
        }
        Err(AuthError::network(format!("logout failed: HTTP {}", status)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_bare_profile() {
        let p = parse_profile(&json!({
            "id": "u1", "name": "Ada", "email": "ada@example.com", "role": "teacher", "avatarUrl": "https://cdn/a.png"
        }))
        .unwrap();
        assert_eq!(p.id, "u1");
        assert_eq!(p.role, Some(Role::Teacher));
        assert_eq!(p.avatar_url.as_deref(), Some("https://cdn/a.png"));
    }

    #[test]
    fn parses_wrapped_profile_and_numeric_id() {
        let p = parse_profile(&json!({"data": {"id": 42, "role": "Admin"}})).unwrap();
        assert_eq!(p.id, "42");
        assert_eq!(p.role, Some(Role::Admin));
        let p = parse_profile(&json!({"user": {"_id": "abc", "role": "student", "avatar_url": "x"}})).unwrap();
        assert_eq!(p.id, "abc");
        assert_eq!(p.avatar_url.as_deref(), Some("x"));
    }

    #[test]
    fn missing_id_or_role_is_malformed() {
        assert!(matches!(parse_profile(&json!({"role": "student"})), Err(AuthError::Malformed { .. })));
        assert!(matches!(parse_profile(&json!({"id": "", "role": "student"})), Err(AuthError::Malformed { .. })));
        assert!(matches!(parse_profile(&json!({"id": "u1"})), Err(AuthError::Malformed { .. })));
        assert!(matches!(parse_profile(&json!({"id": "u1", "role": null})), Err(AuthError::Malformed { .. })));
        assert!(matches!(parse_profile(&json!("u1")), Err(AuthError::Malformed { .. })));
    }

    #[test]
    fn unknown_role_maps_to_none() {
        let p = parse_profile(&json!({"id": "u1", "role": "superuser"})).unwrap();
        assert_eq!(p.role, None);
        let p = parse_profile(&json!({"id": "u1", "role": 3})).unwrap();
        assert_eq!(p.role, None);
    }

    #[test]
    fn token_handling() {
        let api = HttpProfileApi::new("http://127.0.0.1:9/api").unwrap();
        assert_eq!(api.base().as_str(), "http://127.0.0.1:9/api/");
        assert!(!api.has_token());
        api.set_token("   ");
        assert!(!api.has_token());
        let api = api.with_token("abc");
        assert!(api.has_token());
        api.clear_token();
        assert!(!api.has_token());
    }

    #[tokio::test]
    async fn no_token_is_unauthenticated_without_request() {
        let api = HttpProfileApi::new("http://127.0.0.1:9/api").unwrap();
        assert_eq!(api.fetch_profile().await, Err(AuthError::Unauthenticated));
        assert_eq!(api.logout().await, Ok(()));
    }
}
