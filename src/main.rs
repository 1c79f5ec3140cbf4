//! Channel Timer - switches a TV viewer to a channel and puts the system to sleep
//!
//! This is the main entry point for the channel-timer daemon.

use std::sync::Arc;
use anyhow::Context;
use tokio::{net::TcpListener, sync::mpsc};
use tracing::info;

use channel_timer::{
    api::create_router,
    config::Config,
    host::ChannelCatalog,
    services::check_systemctl_available,
    state::{AppState, ChannelTimer},
    tasks::{timer_loop_task, RuntimeHost},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("channel_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting channel-timer v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, confirm={}, confirm_timeout={}s, sleep_mode={}, dry_run={}",
          config.host, config.port, !config.no_confirm, config.confirm_timeout, config.sleep_mode, config.dry_run);

    // Sleeping goes through systemctl
    if !config.dry_run {
        if let Err(e) = check_systemctl_available().await {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    }

    let catalog = match &config.catalog {
        Some(path) => ChannelCatalog::load_from(path)
            .with_context(|| format!("loading channel catalog {}", path.display()))?,
        None => ChannelCatalog::default(),
    };
    info!("Channel catalog: {} drivers", catalog.drivers.len());

    // The session lives on the timer loop; everything else talks to it by message
    let (command_tx, command_rx) = mpsc::channel(32);
    let session = ChannelTimer::new(RuntimeHost::new(catalog), config.plugin_options());
    let runner = config.action_runner();
    tokio::spawn(async move {
        timer_loop_task(session, command_rx, runner).await;
    });

    let state = Arc::new(AppState::new(command_tx, config.port, config.host.clone()));
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /enable            - Enable the timer (optionally with settings)");
    info!("  POST /disable           - Disable the timer");
    info!("  POST /settings          - Replace the timer settings");
    info!("  POST /confirm/:decision - Accept or cancel a pending sleep");
    info!("  PUT  /viewer/program    - Update the current program");
    info!("  PUT  /viewer/recording  - Update the recording status");
    info!("  PUT  /viewer/catalog    - Replace the channel catalog");
    info!("  GET  /drivers           - List drivers, tuning spaces and channels");
    info!("  GET  /status            - Check current status");
    info!("  GET  /health            - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
