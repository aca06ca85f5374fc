// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the stores over temporary SQLite files, the
//! index engine with a scripted protocol client, the bridge and the
//! controls, all sharing one [`MockMessenger`].

use std::sync::Arc;
use std::time::Duration;

use autofilter_config::model::StorageConfig;
use autofilter_conversation::Bridge;
use autofilter_core::traits::protocol::Credentials;
use autofilter_core::{AutofilterError, InboundMessage, Messenger};
use autofilter_index::{Controls, EngineSettings, IndexEngine, Operator};
use autofilter_storage::Stores;

use crate::mock_messenger::MockMessenger;
use crate::scripted_client::{ClientScript, ScriptedClientFactory};

/// Chat the harness operator talks from.
pub const OPERATOR_CHAT: i64 = 5;
/// User id of the harness operator.
pub const OPERATOR_USER: i64 = 9;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    shards: usize,
    settings: EngineSettings,
    prompt_timeout: Duration,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            shards: 1,
            settings: EngineSettings {
                batch_size: 200,
                progress_interval: Duration::from_millis(50),
                flood_wait_fallback: Duration::from_millis(10),
            },
            prompt_timeout: Duration::from_secs(5),
        }
    }

    /// Number of file shard databases (at least one).
    pub fn with_shards(mut self, shards: usize) -> Self {
        self.shards = shards.max(1);
        self
    }

    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.settings.batch_size = batch_size;
        self
    }

    pub fn with_prompt_timeout(mut self, timeout: Duration) -> Self {
        self.prompt_timeout = timeout;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, AutofilterError> {
        let temp_dir = tempfile::TempDir::new().map_err(|e| AutofilterError::Storage {
            source: Box::new(e),
        })?;
        let path = |name: String| temp_dir.path().join(name).to_string_lossy().to_string();

        let storage_config = StorageConfig {
            database_path: path("primary.db".into()),
            shards: (1..self.shards).map(|i| path(format!("shard-{i}.db"))).collect(),
            write_target: 0,
            rebalance_interval_secs: 600,
            wal_mode: true,
        };
        let stores = Stores::open(&storage_config).await?;

        let messenger = Arc::new(MockMessenger::new());
        let script = ClientScript::new();
        let clients = Arc::new(ScriptedClientFactory::new(Arc::clone(&script)));

        let engine = IndexEngine::new(
            stores.operations.clone(),
            stores.files.clone(),
            messenger.clone(),
            clients.clone(),
            Credentials {
                app_id: None,
                app_hash: None,
                bot_token: "123456:test-token".into(),
            },
            self.settings,
        );
        let bridge = Arc::new(Bridge::new(messenger.clone(), self.prompt_timeout));
        let controls = Arc::new(Controls::new(
            engine.clone(),
            Arc::clone(&bridge),
            messenger.clone() as Arc<dyn Messenger>,
        ));

        Ok(TestHarness {
            messenger,
            script,
            clients,
            stores,
            engine,
            bridge,
            controls,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete index stack with mock collaborators and temp storage.
pub struct TestHarness {
    pub messenger: Arc<MockMessenger>,
    /// History served to every protocol client.
    pub script: Arc<ClientScript>,
    pub clients: Arc<ScriptedClientFactory>,
    pub stores: Stores,
    pub engine: IndexEngine,
    pub bridge: Arc<Bridge>,
    pub controls: Arc<Controls>,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    pub fn operator(&self) -> Operator {
        Operator {
            chat_id: OPERATOR_CHAT,
            user_id: OPERATOR_USER,
        }
    }

    /// Builds an operator message with a message id far above any id the
    /// mock messenger has handed out, so it always follows pending prompts.
    pub fn operator_message(&self, message_id: i64, text: &str) -> InboundMessage {
        InboundMessage {
            chat_id: OPERATOR_CHAT,
            user_id: OPERATOR_USER,
            message_id: 1_000_000 + message_id,
            text: Some(text.to_string()),
            forwarded_from: None,
        }
    }

    /// Waits for a prompt containing `needle`, then answers it with `text`.
    pub async fn answer(&self, needle: &str, message_id: i64, text: &str) -> Result<(), AutofilterError> {
        self.messenger
            .wait_for_sent(|s| s.msg.text.contains(needle), Duration::from_secs(5))
            .await?;
        self.deliver(self.operator_message(message_id, text)).await
    }

    /// Dispatches `msg` to the bridge, retrying briefly until a prompt has
    /// registered for it.
    pub async fn deliver(&self, msg: InboundMessage) -> Result<(), AutofilterError> {
        for _ in 0..500 {
            if self.bridge.dispatch(&msg) {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        Err(AutofilterError::Timeout {
            duration: Duration::from_secs(5),
        })
    }
}
