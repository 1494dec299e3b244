//! gsw-daemon entry point.
//!
//! Sets up tracing, loads configuration and secrets, logs in upstream,
//! restores state, spawns the poll and maintenance loops and serves the
//! health endpoints. Route handlers live in `routes.rs`; loops and shared
//! state in `state.rs`.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{bail, Context};
use clap::Parser;
use gsw_config::{load_layered_yaml, resolve_secrets, WatchConfig};
use gsw_daemon::{routes, state};
use gsw_feed::{DiscordClient, FallbackFeed, FetchError, FreshnessWindow, PrimaryFeed, RoleResolver};
use gsw_publish::{Publisher, WebhookSink};
use gsw_runtime::{WatchChannels, Watcher, WatcherDeps};
use gsw_store::StateStore;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{error, info, Level};

const LOGIN_RETRY_INITIAL: Duration = Duration::from_secs(2);
const LOGIN_RETRY_MAX: Duration = Duration::from_secs(60);

#[derive(Parser)]
#[command(name = "gsw-daemon")]
#[command(about = "Garden Horizons stock watcher", long_about = None, version)]
struct Args {
    /// Layered config paths in merge order (base -> env -> local)
    #[arg(long = "config", required = true)]
    config_paths: Vec<String>,

    /// Override `state.path` from the config.
    #[arg(long)]
    state: Option<String>,

    /// Run a single reconcile tick and exit.
    #[arg(long, default_value_t = false)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Silent if the file does not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let args = Args::parse();

    let paths: Vec<&str> = args.config_paths.iter().map(String::as_str).collect();
    let loaded = load_layered_yaml(&paths)?;
    let cfg = WatchConfig::from_loaded(&loaded)?;
    let tz = cfg.timezone()?;
    let secrets = resolve_secrets(&cfg)?;
    info!(config_hash = %loaded.config_hash, "config loaded");

    // Login. A rejected token is the one unrecoverable condition; anything
    // else is retried with backoff.
    let unauthenticated = DiscordClient::new_with_base_url(
        secrets.user_token.clone(),
        cfg.discord.api_base.clone(),
    );
    let login = state::login_with_retry(
        || {
            let mut client = unauthenticated.clone();
            async move {
                let me = client.login().await?;
                Ok::<_, FetchError>((me, client))
            }
        },
        LOGIN_RETRY_INITIAL,
        LOGIN_RETRY_MAX,
    )
    .await;
    let (me, client) = match login {
        Ok(v) => v,
        Err(FetchError::Unauthorized) => {
            error!("login rejected: token unauthorized");
            bail!("FATAL_AUTH: upstream rejected the user token");
        }
        Err(e) => return Err(e).context("login failed"),
    };
    info!(user = %me.tag(), "logged in");
    for g in client.guilds() {
        info!(guild_id = %g.id, guild = %g.name, "visible guild");
    }

    let state_path = args.state.clone().unwrap_or_else(|| cfg.state.path.clone());
    let store = StateStore::new(&state_path);
    let initial = store.load_or_default();

    let client = Arc::new(client);
    let resolver = Arc::new(RoleResolver::new(client.clone(), cfg.resolver.cache_capacity));
    let watcher = Watcher::new(
        WatcherDeps {
            primary: PrimaryFeed::new(
                client.clone(),
                resolver.clone(),
                FreshnessWindow::from_secs(cfg.schedule.freshness_window_secs),
            ),
            fallback: FallbackFeed::new(client.clone()),
            channels: WatchChannels {
                primary_seeds: cfg.channels.primary.seeds.clone(),
                primary_gear: cfg.channels.primary.gear.clone(),
                primary_weather: cfg.channels.primary.weather.clone(),
                fallback_seeds: cfg.channels.fallback.seeds.clone(),
                fallback_gear: cfg.channels.fallback.gear.clone(),
            },
            directory: client.clone(),
            own_guild_id: cfg.own_guild_id().map(str::to_string),
            store,
            publisher: Publisher::new(Arc::new(WebhookSink::new(secrets.webhook_url.clone())), tz),
        },
        initial,
    );

    let shared = Arc::new(state::AppState::new().with_resolver(resolver.clone()));

    if args.once {
        let mut watcher = watcher;
        let report = state::run_tick(&shared, &mut watcher).await;
        info!(outcome = ?report.outcome, publish = ?report.publish, "single tick complete");
        return Ok(());
    }

    state::spawn_poll_loop(
        Arc::clone(&shared),
        watcher,
        Duration::from_secs(cfg.schedule.poll_interval_secs),
    );
    state::spawn_maintenance(
        resolver,
        Duration::from_secs(cfg.schedule.maintenance_interval_secs),
    );

    let app = routes::build_router(Arc::clone(&shared)).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    let addr = bind_addr(&cfg)?;
    info!("gsw-daemon listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

/// `GSW_DAEMON_ADDR` wins, then `PORT` (all interfaces), then the config.
fn bind_addr(cfg: &WatchConfig) -> anyhow::Result<SocketAddr> {
    if let Ok(addr) = std::env::var("GSW_DAEMON_ADDR") {
        return addr
            .parse()
            .with_context(|| format!("GSW_DAEMON_ADDR is not a socket address: {addr}"));
    }
    if let Ok(port) = std::env::var("PORT") {
        let port: u16 = port
            .parse()
            .with_context(|| format!("PORT is not a port number: {port}"))?;
        return Ok(SocketAddr::from(([0, 0, 0, 0], port)));
    }
    cfg.daemon
        .bind_addr
        .parse()
        .with_context(|| format!("daemon.bind_addr is not a socket address: {}", cfg.daemon.bind_addr))
}
