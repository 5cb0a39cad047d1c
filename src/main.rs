//!
//! coursegate CLI
//! --------------
//! Restores the session against the marketplace profile API and prints the gate
//! decision for each requested path. Handy for checking a route table or a token
//! without starting the front-end.

use std::env;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use coursegate::config::GateConfig;
use coursegate::identity::HttpProfileApi;
use coursegate::{AuthContext, LogoutOutcome};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--api <url>] [--token <t>] [--routes <file>] [--bypass-public] [--logout] <path>...\n\nFlags:\n  --api <url>        Profile API base (env COURSEGATE_API_BASE, default http://127.0.0.1:8080/api)\n  --token <t>        Bearer token (env COURSEGATE_TOKEN)\n  --routes <file>    JSON route table (env COURSEGATE_ROUTES_FILE, default built-in marketplace routes)\n  --bypass-public    Let public routes render while the session resolves\n  --logout           Log out after printing decisions\n  -h, --help         Show this help\n\nExamples:\n  {program} --token $TOKEN /dashboard/profile /teach /admin/users\n  {program} --routes routes.json /courses/rust-101"
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("log filter")?;
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| "coursegate".to_string());
    let mut cfg = GateConfig::from_env()?;
    let mut paths: Vec<String> = Vec::new();
    let mut do_logout = false;
    while let Some(a) = args.next() {
        match a.as_str() {
            "-h" | "--help" => { print_usage(&program); return Ok(()); }
            "--api" => cfg.api_base = args.next().ok_or_else(|| anyhow!("--api needs a value"))?,
            "--token" => cfg.token = Some(args.next().ok_or_else(|| anyhow!("--token needs a value"))?),
            "--routes" => cfg.routes_file = Some(args.next().ok_or_else(|| anyhow!("--routes needs a value"))?.into()),
            "--bypass-public" => cfg.loading_policy = coursegate::gate::LoadingPolicy::BypassPublic,
            "--logout" => do_logout = true,
            s if s.starts_with('-') => { print_usage(&program); return Err(anyhow!("unknown flag {}", s)); }
            _ => paths.push(a),
        }
    }
    if paths.is_empty() {
        print_usage(&program);
        return Err(anyhow!("no paths given"));
    }

    let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(
        target: "startup",
        "coursegate starting: RUST_LOG='{}', api='{}', timeout_ms={}, policy={:?}, routes={:?}, token={}",
        rust_log, cfg.api_base, cfg.profile_timeout.as_millis(), cfg.loading_policy, cfg.routes_file, cfg.token.is_some()
    );

    let mut api = HttpProfileApi::new(&cfg.api_base)?;
    if let Some(t) = cfg.token.clone() {
        api = api.with_token(t);
    }
    let ctx = AuthContext::from_config(Arc::new(api), &cfg).context("building auth context")?;

    let status = ctx.bootstrap_session().await;
    let snap = ctx.snapshot();
    match &snap.identity {
        Some(id) => println!("session: {:?} user={} role={}", status, id.id, id.role.map(|r| r.as_str()).unwrap_or("<unrecognised>")),
        None => println!(
            "session: {:?} (not signed in{})",
            status,
            snap.last_error.as_ref().map(|e| format!(", {}", e)).unwrap_or_default()
        ),
    }

    for p in &paths {
        let (decision, target) = ctx.resolve(p);
        match target {
            Some(t) => println!("{p}\t{:?}\t-> {t}", decision),
            None => println!("{p}\t{:?}", decision),
        }
    }

    if do_logout {
        match ctx.logout().await {
            LogoutOutcome::Completed => println!("logout: ok"),
            LogoutOutcome::RemoteFailed(e) => println!("logout: local only ({})", e),
        }
    }
    Ok(())
}
