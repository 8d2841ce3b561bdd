//! GameDock service entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Wire observability** — configure `tracing-subscriber` with an
//!    env-filter layer (and JSON output when `LOG_FORMAT=json`). All `tracing`
//!    spans and structured events emitted by every crate in the workspace flow
//!    through this layer.
//! 2. **Parse configuration** — load [`server::Config`] from the environment
//!    and refuse to start on missing or invalid keys.
//! 3. **Construct infrastructure** — create concrete instances of the GitHub
//!    site-host adapter, the Supabase identity and store adapters, and the
//!    publisher, and inject them into [`server::AppState`].
//! 4. **Serve** — run the axum router until SIGINT/SIGTERM.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use github::GitHubClient;
use publisher::Publisher;
use server::{AppState, Config};
use supabase::{SupabaseAuth, SupabaseStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_env().context("loading configuration")?;

    let host = GitHubClient::new(config.github_username.clone(), config.github_token.clone())
        .context("building GitHub client")?;
    let publisher = Arc::new(Publisher::new(Arc::new(host), config.poll));

    let identity = SupabaseAuth::new(&config.supabase_url, &config.supabase_anon_key)
        .context("building identity verifier")?;
    let store = SupabaseStore::new(&config.supabase_url, &config.supabase_anon_key)
        .context("building deployment store")?;

    let state = AppState::new(Arc::new(identity), Arc::new(store), publisher);

    info!(port = config.port, "starting gamedock");
    server::serve(&config, state).await.context("serving HTTP")?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("LOG_FORMAT").is_ok_and(|v| v == "json") {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt().with_env_filter(filter).init();
    }
}
