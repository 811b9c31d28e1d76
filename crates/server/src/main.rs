// crates/server/src/main.rs
//! Activity aggregation engine server binary.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use activity_db::Database;
use activity_feed::collaborators::test_doubles::{AllowAllOracle, StaticActorDirectory, StaticImageStore};
use activity_kv::{LocalFallbackKv, RedisKv, ResilientKv};
use activity_monitoring::send_startup_notice;
use activity_notifier::Notifier;
use activity_server::config::{get_port, AppConfig};
use activity_server::state::AppState;
use activity_server::{create_app, metrics, workers};

/// Startup flags. Every value also has an environment-variable fallback
/// in `AppConfig::from_env`; the flag wins when both are supplied.
#[derive(Debug, Parser)]
#[command(name = "activity-server")]
struct Cli {
    /// Bind address override, e.g. 0.0.0.0:8080.
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")))
        .json()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    metrics::init_metrics();

    let db = Database::connect(&config.database_url, config.database_max_connections).await?;

    let kv: Arc<dyn activity_kv::KvAdapter> = match &config.redis_url {
        Some(url) => Arc::new(ResilientKv::new(RedisKv::connect(url).await?)),
        None => {
            tracing::warn!("REDIS_URL not set, running on the process-local KV fallback only");
            Arc::new(LocalFallbackKv::new())
        }
    };

    let http_client = reqwest::Client::builder().timeout(Duration::from_secs(10)).build()?;
    let notifier = Arc::new(Notifier::new(config.notifier.clone(), http_client));

    let state = AppState::new(
        db,
        kv,
        notifier,
        config.feed.clone(),
        config.monitoring.clone(),
        Arc::new(AllowAllOracle::new()),
        Arc::new(StaticActorDirectory::new()),
        Arc::new(StaticImageStore::new()),
    );

    let alerter: Arc<dyn activity_monitoring::Alerter> = state.notifier.clone();
    send_startup_notice(&*state.kv, &*alerter, &state.monitoring_config).await.ok();

    tokio::spawn(workers::run_job_poll_loop(state.clone()));
    tokio::spawn(workers::run_health_loop(state.clone()));
    tokio::spawn(workers::run_batch_alert_loop(state.clone()));
    tokio::spawn(workers::run_daily_digest_loop(state.clone()));

    let app = create_app(state.clone());

    let addr = cli.bind.unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], get_port())));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "activity-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}
