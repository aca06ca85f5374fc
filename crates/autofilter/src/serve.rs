// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long-running bot process.
//!
//! The low-level protocol client is supplied by the embedder as a
//! [`ClientFactory`]; everything else is built from configuration.

use std::sync::Arc;

use autofilter_config::AutofilterConfig;
use autofilter_core::{AutofilterError, ClientFactory, Messenger};
use autofilter_telegram::TelegramMessenger;
use autofilter_telegram::polling::{Router, spawn_polling};
use tracing::{info, warn};

use crate::app::App;
use crate::shutdown;

/// Runs the bot until SIGINT or SIGTERM.
///
/// In-flight runs are checkpointed on the way out and resume on the next
/// start.
pub async fn run_serve(
    config: AutofilterConfig,
    clients: Arc<dyn ClientFactory>,
) -> Result<(), AutofilterError> {
    info!(name = %config.app.name, "starting autofilter");

    let messenger = TelegramMessenger::new(&config.telegram)?;
    let bot = messenger.bot().clone();
    let messenger: Arc<dyn Messenger> = Arc::new(messenger);

    let app = App::start(&config, messenger, clients).await?;
    if config.telegram.admins.is_empty() {
        warn!("telegram.admins is empty; nobody can start index operations");
    }

    let cancel = shutdown::install_signal_handler();
    let router = Router::new(
        Arc::clone(app.controls()),
        Arc::clone(app.bridge()),
        config.telegram.admins.clone(),
    );
    let polling = spawn_polling(bot, router, cancel.clone());

    cancel.cancelled().await;
    if let Err(e) = polling.await {
        warn!(error = %e, "polling task ended abnormally");
    }
    app.shutdown().await?;

    info!("autofilter shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("autofilter={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
