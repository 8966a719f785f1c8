//! UTM Attribution Dashboard
//!
//! Captures UTM parameters from page visits into ClickHouse and serves a
//! pivoted date × source × medium × campaign × term summary table.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};

use api::{router, AppState};
use clickhouse_client::{ClickHouseClient, ClickHouseConfig};
use telemetry::{health, init_tracing_from_env, HealthStatus};
use utm_core::Depth;

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    /// Grouping depth when a request names none
    #[serde(default)]
    default_depth: Depth,

    /// Seconds between background ClickHouse health checks
    #[serde(default = "default_health_interval")]
    health_check_interval_secs: u64,

    #[serde(default)]
    clickhouse: ClickHouseConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_health_interval() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            default_depth: Depth::default(),
            health_check_interval_secs: default_health_interval(),
            clickhouse: ClickHouseConfig::default(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing_from_env().context("Failed to initialize tracing")?;

    info!("Starting UTM Dashboard v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    info!(
        host = %config.host,
        port = config.port,
        default_depth = %config.default_depth,
        clickhouse = %config.clickhouse.url,
        "Loaded configuration"
    );

    let clickhouse = Arc::new(ClickHouseClient::new(config.clickhouse.clone()));

    if let Err(e) = clickhouse_client::init_schema(&clickhouse).await {
        error!("Failed to initialize ClickHouse schema: {}", e);
        // Continue anyway - the table may already exist
    }

    check_health(&clickhouse).await;
    let _health_task = spawn_health_checks(
        clickhouse.clone(),
        Duration::from_secs(config.health_check_interval_secs.max(1)),
    );

    let state = AppState::with_default_depth(clickhouse, config.default_depth);
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        .add_source(config::Config::try_from(&Config::default())?)
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("UTM")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    // The config crate's nested parsing doesn't work reliably with underscored field names
    if let Ok(url) = std::env::var("UTM_CLICKHOUSE_URL") {
        config.clickhouse.url = url;
    }
    if let Ok(database) = std::env::var("UTM_CLICKHOUSE_DATABASE") {
        config.clickhouse.database = database;
    }
    if let Ok(username) = std::env::var("UTM_CLICKHOUSE_USERNAME") {
        config.clickhouse.username = Some(username);
    }
    if let Ok(password) = std::env::var("UTM_CLICKHOUSE_PASSWORD") {
        config.clickhouse.password = Some(password);
    }
    if let Ok(depth) = std::env::var("UTM_DEFAULT_DEPTH") {
        config.default_depth = depth
            .parse()
            .with_context(|| format!("Invalid UTM_DEFAULT_DEPTH '{}'", depth))?;
    }

    Ok(config)
}

/// Check ClickHouse and log the resulting health report.
async fn check_health(clickhouse: &ClickHouseClient) {
    clickhouse_client::check_connection(clickhouse).await;
    log_health();
}

fn log_health() {
    let report = health().report();
    match report.status {
        HealthStatus::Healthy => info!("ClickHouse connection: healthy"),
        HealthStatus::Unhealthy => {
            let reason = report
                .components
                .iter()
                .find_map(|c| c.message.clone())
                .unwrap_or_default();
            warn!(reason = %reason, "ClickHouse connection: unhealthy");
        }
    }
}

/// Re-check ClickHouse periodically so readiness recovers after an outage.
fn spawn_health_checks(
    clickhouse: Arc<ClickHouseClient>,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.tick().await;
        loop {
            interval.tick().await;
            let was_ready = health().is_ready();
            clickhouse_client::check_connection(&clickhouse).await;
            if was_ready != health().is_ready() {
                log_health();
            }
        }
    })
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
