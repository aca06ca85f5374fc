// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Startup and shutdown of the index stack.

use std::sync::Arc;
use std::time::Duration;

use autofilter_config::AutofilterConfig;
use autofilter_conversation::Bridge;
use autofilter_core::traits::protocol::Credentials;
use autofilter_core::{AutofilterError, ClientFactory, Messenger};
use autofilter_index::{Controls, EngineSettings, IndexEngine};
use autofilter_storage::Stores;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// A running index stack.
pub struct App {
    stores: Stores,
    engine: IndexEngine,
    bridge: Arc<Bridge>,
    controls: Arc<Controls>,
    cancel: CancellationToken,
    rebalancer: JoinHandle<()>,
}

impl App {
    /// Opens storage, wires the engine, starts the rebalancer and relaunches
    /// every operation that was running when the process last stopped.
    pub async fn start(
        config: &AutofilterConfig,
        messenger: Arc<dyn Messenger>,
        clients: Arc<dyn ClientFactory>,
    ) -> Result<Self, AutofilterError> {
        let credentials = credentials(config)?;
        let stores = Stores::open(&config.storage).await?;

        let engine = IndexEngine::new(
            stores.operations.clone(),
            stores.files.clone(),
            Arc::clone(&messenger),
            clients,
            credentials,
            EngineSettings::from(&config.index),
        );
        let bridge = Arc::new(Bridge::new(
            Arc::clone(&messenger),
            Duration::from_secs(config.index.prompt_timeout_secs),
        ));
        let controls = Arc::new(Controls::new(engine.clone(), Arc::clone(&bridge), messenger));

        let cancel = CancellationToken::new();
        let rebalancer = tokio::spawn(
            Arc::clone(&stores.files)
                .run_rebalancer(config.storage.rebalance_interval(), cancel.child_token()),
        );

        let restarted = engine.restart_all_active().await?;
        info!(
            restarted,
            shards = stores.files.shard_count(),
            "index stack started"
        );

        Ok(Self {
            stores,
            engine,
            bridge,
            controls,
            cancel,
            rebalancer,
        })
    }

    pub fn engine(&self) -> &IndexEngine {
        &self.engine
    }

    pub fn bridge(&self) -> &Arc<Bridge> {
        &self.bridge
    }

    pub fn controls(&self) -> &Arc<Controls> {
        &self.controls
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    /// Stops every run at its next checkpoint, then the rebalancer, then
    /// flushes storage. Interrupted records stay active for the next start.
    pub async fn shutdown(self) -> Result<(), AutofilterError> {
        self.engine.shutdown().await;
        self.bridge.clear();
        self.cancel.cancel();
        if let Err(e) = self.rebalancer.await {
            warn!(error = %e, "rebalancer task ended abnormally");
        }
        self.stores.shutdown().await?;
        info!("index stack stopped");
        Ok(())
    }
}

/// Protocol credentials: the bot token plus the optional application pair.
pub fn credentials(config: &AutofilterConfig) -> Result<Credentials, AutofilterError> {
    let bot_token = config
        .telegram
        .bot_token
        .clone()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AutofilterError::Config("telegram.bot_token is required".into()))?;
    Ok(Credentials {
        app_id: config.protocol.app_id,
        app_hash: config.protocol.app_hash.clone(),
        bot_token,
    })
}
