//! `HttpProfileApi` against a local fake of the marketplace API.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use coursegate::error::AuthError;
use coursegate::identity::{HttpProfileApi, ProfileApi, SessionStatus};
use coursegate::{AuthContext, GateDecision, LogoutOutcome, Role, RouteTable};

#[derive(Clone, Default)]
struct Fake {
    logouts: Arc<AtomicUsize>,
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.to_string())
}

async fn profile(headers: HeaderMap) -> impl IntoResponse {
    match bearer(&headers).as_deref() {
        Some("teacher-token") => (StatusCode::OK, Json(json!({
            "data": {"id": 7, "name": "Grace", "email": "grace@example.com", "role": "teacher", "avatarUrl": "https://cdn/g.png"}
        }))).into_response(),
        Some("weird-role-token") => (StatusCode::OK, Json(json!({"id": "u9", "role": "moderator"}))).into_response(),
        Some("no-role-token") => (StatusCode::OK, Json(json!({"id": "u10"}))).into_response(),
        Some("html-token") => (StatusCode::OK, "<html>maintenance</html>").into_response(),
        Some("broken-token") => (StatusCode::BAD_GATEWAY, "upstream down").into_response(),
        _ => (StatusCode::UNAUTHORIZED, Json(json!({"status": "unauthorized"}))).into_response(),
    }
}

async fn logout(State(fake): State<Fake>, headers: HeaderMap) -> impl IntoResponse {
    fake.logouts.fetch_add(1, Ordering::SeqCst);
    if bearer(&headers).as_deref() == Some("broken-token") {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    StatusCode::NO_CONTENT
}

async fn spawn_fake() -> Result<(SocketAddr, Fake)> {
    let fake = Fake::default();
    let app = Router::new()
        .route("/api/auth/profile", get(profile))
        .route("/api/auth/logout", post(logout))
        .with_state(fake.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((addr, fake))
}

fn api(addr: SocketAddr, token: &str) -> Result<HttpProfileApi> {
    Ok(HttpProfileApi::new(&format!("http://{}/api", addr))?.with_token(token))
}

#[tokio::test]
async fn fetches_and_parses_profile() -> Result<()> {
    let (addr, _) = spawn_fake().await?;
    let p = api(addr, "teacher-token")?.fetch_profile().await.map_err(anyhow::Error::from)?;
    assert_eq!(p.id, "7");
    assert_eq!(p.name, "Grace");
    assert_eq!(p.role, Some(Role::Teacher));
    assert_eq!(p.avatar_url.as_deref(), Some("https://cdn/g.png"));
    Ok(())
}

#[tokio::test]
async fn maps_http_failures() -> Result<()> {
    let (addr, _) = spawn_fake().await?;
    assert_eq!(api(addr, "expired")?.fetch_profile().await, Err(AuthError::Unauthenticated));
    assert!(matches!(api(addr, "broken-token")?.fetch_profile().await, Err(AuthError::Network { .. })));
    assert!(matches!(api(addr, "html-token")?.fetch_profile().await, Err(AuthError::Malformed { .. })));
    assert!(matches!(api(addr, "no-role-token")?.fetch_profile().await, Err(AuthError::Malformed { .. })));
    let weird = api(addr, "weird-role-token")?.fetch_profile().await.map_err(anyhow::Error::from)?;
    assert_eq!(weird.role, None);
    Ok(())
}

#[tokio::test]
async fn unreachable_server_is_network_error() -> Result<()> {
    // bind then drop to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    assert!(matches!(api(addr, "teacher-token")?.fetch_profile().await, Err(AuthError::Network { .. })));
    Ok(())
}

#[tokio::test]
async fn end_to_end_bootstrap_gate_and_logout() -> Result<()> {
    let (addr, fake) = spawn_fake().await?;
    let http = Arc::new(api(addr, "teacher-token")?);
    let ctx = AuthContext::new(http.clone(), RouteTable::marketplace());

    assert_eq!(ctx.bootstrap_session().await, SessionStatus::Resolved);
    assert_eq!(ctx.current_gate_decision("/teach/course/1"), GateDecision::ShowChildren);
    assert_eq!(ctx.current_gate_decision("/admin"), GateDecision::RedirectToUnauthorized);

    assert_eq!(ctx.logout().await, LogoutOutcome::Completed);
    assert_eq!(fake.logouts.load(Ordering::SeqCst), 1);
    assert!(!http.has_token());

    // token is gone, so a fresh bootstrap resolves as signed out without a request
    assert_eq!(ctx.bootstrap_session().await, SessionStatus::Resolved);
    assert_eq!(
        ctx.current_gate_decision("/teach"),
        GateDecision::RedirectToLogin { original_path: "/teach".into() }
    );
    Ok(())
}

#[tokio::test]
async fn server_side_logout_failure_is_reported_but_local_state_cleared() -> Result<()> {
    let (addr, fake) = spawn_fake().await?;
    let http = Arc::new(api(addr, "broken-token")?);
    let ctx = AuthContext::new(http.clone(), RouteTable::marketplace());
    assert_eq!(ctx.bootstrap_session().await, SessionStatus::Failed);

    let outcome = ctx.logout().await;
    assert!(matches!(outcome, LogoutOutcome::RemoteFailed(AuthError::Network { .. })));
    assert_eq!(fake.logouts.load(Ordering::SeqCst), 1);
    assert!(!http.has_token());
    assert_eq!(ctx.snapshot().status, SessionStatus::Resolved);
    Ok(())
}
