use std::path::PathBuf;

use anyhow::{anyhow, Context};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use fieldops_access::config::AccessConfig;
use fieldops_access::gates::landing_route;
use fieldops_access::identity::Identity;
use fieldops_access::menu::filter_menu;
use fieldops_access::navigation::dashboard_menu;
use fieldops_access::permissions::{DecisionPolicy, Grant, GrantState, PermissionResolver};

/// Evaluation input. `grants` absent means the fetch is still in flight.
#[derive(Debug, Deserialize)]
struct Fixture {
    identity: Option<Identity>,
    #[serde(default)]
    grants: Option<Vec<Grant>>,
    #[serde(default)]
    checks: Vec<Check>,
    #[serde(default)]
    strict: bool,
}

#[derive(Debug, Deserialize)]
struct Check {
    resource: String,
    action: String,
}

fn load_config() -> anyhow::Result<AccessConfig> {
    let cfg = match std::env::var("FIELDOPS_CONFIG") {
        Ok(path) => AccessConfig::from_json_file(&PathBuf::from(&path)).with_context(|| format!("config file {}", path))?,
        Err(_) => AccessConfig::default(),
    };
    Ok(cfg.overlay(|k| std::env::var(k).ok())?)
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let path = std::env::args().nth(1).ok_or_else(|| anyhow!("usage: fieldops-access <fixture.json>"))?;
    let cfg = load_config()?;
    let text = std::fs::read_to_string(&path).with_context(|| format!("reading fixture {}", path))?;
    let fixture: Fixture = serde_json::from_str(&text).context("parsing fixture")?;

    let grants = match fixture.grants {
        Some(list) => GrantState::loaded(list),
        None => GrantState::Loading,
    };
    let mut policy = DecisionPolicy::new(cfg.loading_policy);
    if fixture.strict { policy = policy.strict(); }
    let resolver = PermissionResolver::new(fixture.identity.clone(), grants).with_policy(policy);
    info!(
        identity = ?fixture.identity.as_ref().map(|i| i.username.as_str()),
        loading = resolver.is_loading(),
        "evaluating fixture"
    );

    let decisions: Vec<serde_json::Value> = fixture
        .checks
        .iter()
        .map(|c| {
            let (allowed, basis) = resolver.explain_str(&c.resource, &c.action);
            serde_json::json!({"resource": c.resource, "action": c.action, "allowed": allowed, "basis": basis})
        })
        .collect();

    let out = serde_json::json!({
        "loading": resolver.is_loading(),
        "landing_route": fixture.identity.as_ref().map(|i| landing_route(i, &cfg)).unwrap_or_else(|| cfg.login_route.clone()),
        "decisions": decisions,
        "menu": filter_menu(&dashboard_menu(), &resolver),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
