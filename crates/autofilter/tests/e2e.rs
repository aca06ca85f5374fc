// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests of the assembled process: config, storage on disk,
//! startup recovery and graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use autofilter::App;
use autofilter::commands;
use autofilter_config::AutofilterConfig;
use autofilter_core::{ClientFactory, ControlAction, Messenger, Operation, OperationStore};
use autofilter_index::{IndexRequest, Operator};
use autofilter_storage::{FileFilter, Stores};
use autofilter_test_utils::fixtures::{document, no_media};
use autofilter_test_utils::harness::{OPERATOR_CHAT, OPERATOR_USER};
use autofilter_test_utils::{ClientScript, MockMessenger, ScriptedClientFactory};
use tempfile::TempDir;

const CHANNEL: i64 = -1001234567890;

struct Env {
    config: AutofilterConfig,
    messenger: Arc<MockMessenger>,
    script: Arc<ClientScript>,
    clients: Arc<ScriptedClientFactory>,
    _dir: TempDir,
}

fn env() -> Env {
    let dir = TempDir::new().unwrap();
    let path = |name: &str| dir.path().join(name).to_string_lossy().to_string();
    let toml = format!(
        r#"
[telegram]
bot_token = "123456:test-token"
admins = [{OPERATOR_USER}]

[storage]
database_path = "{}"
shards = ["{}"]

[index]
batch_size = 3
progress_interval_secs = 1
flood_wait_fallback_secs = 1
"#,
        path("primary.db"),
        path("shard-1.db"),
    );
    let config = autofilter_config::load_and_validate_str(&toml).unwrap();
    let script = ClientScript::new();
    Env {
        config,
        messenger: Arc::new(MockMessenger::new()),
        clients: Arc::new(ScriptedClientFactory::new(Arc::clone(&script))),
        script,
        _dir: dir,
    }
}

async fn start(env: &Env) -> App {
    App::start(
        &env.config,
        env.messenger.clone() as Arc<dyn Messenger>,
        env.clients.clone() as Arc<dyn ClientFactory>,
    )
    .await
    .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn operator_flow_indexes_into_shards() {
    let env = env();
    env.script
        .add_messages((1..=6).map(|id| document(id, &format!("part-{id}.mkv"))));
    env.script.add_messages([no_media(7)]);
    let app = start(&env).await;

    let op = app
        .controls()
        .open(IndexRequest {
            chat_id: OPERATOR_CHAT,
            channel_id: CHANNEL,
            start_id: 1,
            end_id: 7,
        })
        .await
        .unwrap();
    let operator = Operator {
        chat_id: OPERATOR_CHAT,
        user_id: OPERATOR_USER,
    };
    let reply = app.controls().handle(&op.id, ControlAction::Start, operator).await;
    assert!(!reply.alert);
    app.engine().join(&op.id).await;

    assert!(app.engine().get(&op.id).await.is_err());
    let stored = app
        .stores()
        .files
        .find(FileFilter::all())
        .collect_all()
        .await
        .unwrap();
    assert_eq!(stored.len(), 6);
    assert_eq!(app.stores().files.estimated_total().await.unwrap(), 6);
    assert_eq!(env.script.fetches().len(), 3);

    app.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn startup_relaunches_active_operations() {
    let env = env();
    env.script
        .add_messages([document(10, "a.pdf"), document(11, "b.pdf")]);

    {
        let stores = Stores::open(&env.config.storage).await.unwrap();
        let mut active = Operation::new("Act1ve", CHANNEL, 10, 11, OPERATOR_CHAT);
        active.is_paused = false;
        stores.operations.insert(&active).await.unwrap();
        stores
            .operations
            .insert(&Operation::new("Paus3d", CHANNEL, 10, 11, OPERATOR_CHAT))
            .await
            .unwrap();
        stores.shutdown().await.unwrap();
    }

    let app = start(&env).await;
    app.engine().join("Act1ve").await;

    assert!(app.engine().get("Act1ve").await.is_err());
    assert!(app.engine().get("Paus3d").await.unwrap().is_paused);
    assert_eq!(env.clients.logins(), 1);
    assert_eq!(app.stores().files.estimated_total().await.unwrap(), 2);

    app.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_leaves_interrupted_runs_active() {
    let env = env();
    env.script
        .add_messages((1..=30).map(|id| document(id, &format!("f{id}.zip"))));
    env.script.set_fetch_delay(Duration::from_millis(200));
    let app = start(&env).await;

    let op = app.engine().create(CHANNEL, 1, 30, OPERATOR_CHAT).await.unwrap();
    app.engine().start_or_resume(&op.id).await.unwrap();
    tokio::time::timeout(Duration::from_secs(10), async {
        while env.script.fetches().is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    app.shutdown().await.unwrap();

    let stores = Stores::open(&env.config.storage).await.unwrap();
    let stored = stores.operations.get(&op.id).await.unwrap().unwrap();
    assert!(!stored.is_paused);
    assert!(stored.current_id >= 1);
    assert_eq!(stores.operations.list(Some(false)).await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cli_reports_run_against_configured_databases() {
    let env = env();
    commands::run_check(&env.config).await.unwrap();
    commands::run_operations(&env.config, true).await.unwrap();
    commands::run_shards(&env.config).await.unwrap();

    let stores = Stores::open(&env.config.storage).await.unwrap();
    assert_eq!(stores.databases().len(), 2);
    assert_eq!(stores.files.estimated_counts().await.unwrap(), vec![0, 0]);
}
