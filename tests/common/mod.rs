//! Shared fakes for the integration suites.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;

use coursegate::error::{AuthError, AuthResult};
use coursegate::identity::ProfileApi;
use coursegate::{AuthContext, Identity, Role, RouteTable};

/// Profile API whose fetch blocks until the test releases it.
pub struct GatedApi {
    pub started: Notify,
    pub release: Notify,
    pub result: AuthResult<Identity>,
    pub logout_result: AuthResult<()>,
    pub fetches: AtomicUsize,
    pub logouts: AtomicUsize,
}

impl GatedApi {
    pub fn new(result: AuthResult<Identity>) -> Arc<Self> {
        Arc::new(Self {
            started: Notify::new(),
            release: Notify::new(),
            result,
            logout_result: Ok(()),
            fetches: AtomicUsize::new(0),
            logouts: AtomicUsize::new(0),
        })
    }

    pub fn with_failing_logout(result: AuthResult<Identity>, err: AuthError) -> Arc<Self> {
        Arc::new(Self {
            started: Notify::new(),
            release: Notify::new(),
            result,
            logout_result: Err(err),
            fetches: AtomicUsize::new(0),
            logouts: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ProfileApi for GatedApi {
    async fn fetch_profile(&self) -> AuthResult<Identity> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        self.release.notified().await;
        self.result.clone()
    }

    async fn logout(&self) -> AuthResult<()> {
        self.logouts.fetch_add(1, Ordering::SeqCst);
        self.logout_result.clone()
    }
}

/// Profile API that answers immediately.
pub struct InstantApi(pub AuthResult<Identity>);

#[async_trait]
impl ProfileApi for InstantApi {
    async fn fetch_profile(&self) -> AuthResult<Identity> { self.0.clone() }
    async fn logout(&self) -> AuthResult<()> { Ok(()) }
}

pub fn user(id: &str, role: Role) -> Identity {
    Identity {
        id: id.to_string(),
        name: format!("{} name", id),
        email: format!("{}@example.com", id),
        role: Some(role),
        avatar_url: None,
    }
}

pub async fn signed_in_as(role: Option<Role>) -> AuthContext {
    let identity = Identity { role, ..user("u1", Role::Student) };
    let ctx = AuthContext::new(Arc::new(InstantApi(Ok(identity))), RouteTable::marketplace());
    ctx.bootstrap_session().await;
    ctx
}

pub async fn signed_out() -> AuthContext {
    let ctx = AuthContext::new(Arc::new(InstantApi(Err(AuthError::Unauthenticated))), RouteTable::marketplace());
    ctx.bootstrap_session().await;
    ctx
}
