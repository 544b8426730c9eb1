// SPDX-FileCopyrightText: 2026 Relato Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `relato serve` command implementation.
//!
//! Starts the full service: the selected storage backend, the Telegram
//! channel, the correlation engine loop, and the optional read-only
//! dashboard. Supports graceful shutdown via signal handlers.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use relato_config::model::{RelatoConfig, StorageBackend};
use relato_core::traits::{ActivityStore, ChannelAdapter};
use relato_core::RelatoError;
use relato_engine::{shutdown, EngineLoop};
use relato_filestore::FileStore;
use relato_storage::SqliteStore;
use relato_telegram::TelegramChannel;

/// Runs the `relato serve` command.
///
/// Restarting the process implicitly cancels every in-flight photo wait,
/// so any activity still marked pending is finalized before events flow.
pub async fn run_serve(config: RelatoConfig) -> Result<(), RelatoError> {
    init_tracing(&config.bot.log_level);

    info!("starting relato serve");

    // Initialize the configured storage backend.
    let store: Arc<dyn ActivityStore + Send + Sync> = match config.storage.backend {
        StorageBackend::Sqlite => Arc::new(SqliteStore::new(config.storage.clone())),
        StorageBackend::File => Arc::new(FileStore::new(&config.storage)),
    };
    store.initialize().await?;
    info!(backend = store.name(), "storage initialized");

    // Startup sweep: finalize activities left pending by a previous run.
    let cleared = store.clear_all_pending().await?;
    if cleared > 0 {
        info!(cleared, "finalized stale photo waits from previous run");
    }

    // Initialize and connect the Telegram channel.
    let mut channel = TelegramChannel::new(config.telegram.clone()).map_err(|e| {
        error!(error = %e, "failed to initialize Telegram channel");
        eprintln!(
            "error: Telegram bot token required. Set telegram.bot_token or RELATO_TELEGRAM_BOT_TOKEN."
        );
        e
    })?;
    channel.connect().await?;
    info!("telegram channel connected");

    // Install signal handler.
    let cancel = shutdown::install_signal_handler();

    // Spawn the dashboard server (if enabled).
    if config.dashboard.enabled {
        let dashboard_config = config.dashboard.clone();
        let dashboard_store = store.clone();
        let dashboard_cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                result = relato_dashboard::start_server(&dashboard_config, dashboard_store) => {
                    if let Err(e) = result {
                        error!(error = %e, "dashboard server failed");
                    }
                }
                _ = dashboard_cancel.cancelled() => {
                    info!("dashboard shutting down");
                }
            }
        });
        info!(
            host = config.dashboard.host.as_str(),
            port = config.dashboard.port,
            "dashboard enabled"
        );
    }

    // Create and run the engine loop.
    let mut engine_loop = EngineLoop::new(
        Box::new(channel),
        store,
        Duration::from_secs(config.bot.photo_wait_secs),
    );
    engine_loop.run(cancel).await?;

    info!("relato serve stopped");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("relato={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
