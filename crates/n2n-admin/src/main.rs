//! # n2n-admin
//!
//! Administration backend for an n2n supernode.
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging (`N2N_LOG_LEVEL`, `N2N_JSON_LOGS`)
//! 2. Load configuration (TOML file, then environment, then CLI flags)
//! 3. Wire the network-state services and start the background tasks
//! 4. Serve the admin router until Ctrl+C
//! 5. Stop the background tasks

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use n2n_admin::{build_router, AppState};
use n2n_netstate::{
    InMemoryInventory, NetStateConfig, NetworkStateApi, NetworkStateRuntime, StaticCredentials,
    TomlConfigProvider,
};
use n2n_telemetry::TelemetryConfig;

/// Administration backend for an n2n supernode
#[derive(Parser, Debug)]
#[command(name = "n2n-admin", version)]
#[command(about = "Live edge state, relay detection and GeoIP for an n2n supernode")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTTP port (overrides config and N2N_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print an `auth.password_hash` value for PASSWORD and exit
    #[arg(long, value_name = "PASSWORD")]
    hash_password: Option<String>,
}

fn load_config(args: &Args) -> Result<NetStateConfig> {
    let provider = match &args.config {
        Some(path) => TomlConfigProvider::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => TomlConfigProvider::default(),
    };

    let mut config = provider
        .with_env()
        .context("applying environment overrides")?
        .into_config()
        .context("validating configuration")?;

    if let Some(port) = args.port {
        config.server.port = port;
    }
    Ok(config)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
        return;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(password) = &args.hash_password {
        let hash = StaticCredentials::hash_password(password)
            .map_err(|e| anyhow::anyhow!("hashing password: {e}"))?;
        println!("{hash}");
        return Ok(());
    }

    n2n_telemetry::init_logging(&TelemetryConfig::from_env())?;

    let config = load_config(&args)?;
    let listen_addr = config.server.listen_addr();

    let inventory = Arc::new(InMemoryInventory::from_config(&config));
    info!(
        nodes = config.nodes.len(),
        communities = config.communities.len(),
        "Inventory seeded from configuration"
    );

    let runtime = NetworkStateRuntime::from_config(config.clone(), inventory)
        .context("building network state runtime")?;
    runtime.start();

    let api: Arc<dyn NetworkStateApi> = runtime.aggregator();
    let state = AppState::new(api, runtime.auth(), runtime.logs(), runtime.diagnostics())
        .with_trusted_proxy(config.server.trust_proxy_headers);
    let router = build_router(state, &config.server);

    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("binding {listen_addr}"))?;
    info!(addr = %listen_addr, "Admin API listening");

    let served = axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await;

    runtime.shutdown().await;
    served.context("admin server failed")?;
    Ok(())
}
