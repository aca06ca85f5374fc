// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator control flows: overview, button presses and prompt conversations.

use std::sync::Arc;
use std::time::Duration;

use autofilter_core::types::ForwardedPost;
use autofilter_core::{AutofilterError, InboundMessage, Markup, Operation};
use autofilter_index::{ControlReply, IndexRequest};
use autofilter_test_utils::TestHarness;
use autofilter_test_utils::fixtures::document;
use autofilter_test_utils::harness::{OPERATOR_CHAT, OPERATOR_USER};
use autofilter_test_utils::mock_messenger::SentMessage;

const CHANNEL: i64 = -1001234567890;
const WAIT: Duration = Duration::from_secs(10);

async fn harness() -> Arc<TestHarness> {
    Arc::new(TestHarness::builder().build().await.unwrap())
}

async fn paused_operation(h: &TestHarness, start: i64, end: i64) -> Operation {
    h.engine.create(CHANNEL, start, end, OPERATOR_CHAT).await.unwrap()
}

/// Presses `action` on `id` in the background; the conversation is driven by
/// the test.
fn press(h: &Arc<TestHarness>, id: &str, action: char) -> tokio::task::JoinHandle<ControlReply> {
    let h = Arc::clone(h);
    let data = format!("index|{id}_{action}");
    tokio::spawn(async move { h.controls.handle_callback(&data, h.operator()).await })
}

async fn reply_with(h: &TestHarness, text: &str) -> SentMessage {
    h.messenger
        .wait_for_sent(|s| s.msg.text == text, WAIT)
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn open_shows_overview_with_controls() {
    let h = harness().await;
    let op = h
        .controls
        .open(IndexRequest {
            chat_id: OPERATOR_CHAT,
            channel_id: CHANNEL,
            start_id: 10,
            end_id: 60,
        })
        .await
        .unwrap();

    assert!(op.is_paused);
    assert_eq!(op.progress_chat_id, OPERATOR_CHAT);
    let placeholder = h.messenger.sent().await[0].clone();
    assert_eq!(placeholder.msg.text, "<code>Setting Up Index Operation ...</code>");

    let overview = h.messenger.last_edit_of(placeholder.at).await.unwrap();
    assert!(overview.text.starts_with("<b><u>Index Operation Overview</u></b>"));
    assert!(overview.text.ends_with("<b>Total Messages</b>: 50"));
    let Markup::Inline(rows) = &overview.markup else {
        panic!("overview must carry controls");
    };
    let data: Vec<&str> = rows[0].iter().map(|b| b.callback_data.as_str()).collect();
    assert_eq!(
        data,
        [
            format!("index|{}_c", op.id),
            format!("index|{}_m", op.id),
            format!("index|{}_s", op.id)
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn open_rejects_reversed_range() {
    let h = harness().await;
    let err = h
        .controls
        .open(IndexRequest {
            chat_id: OPERATOR_CHAT,
            channel_id: CHANNEL,
            start_id: 60,
            end_id: 10,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AutofilterError::InvalidRange { .. }));
    assert_eq!(
        h.messenger.sent_texts().await,
        ["First Message Cannot be After The Last :/"]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn buttons_start_and_pause() {
    let h = harness().await;
    h.script.add_messages([document(1, "a.pdf")]);
    let op = paused_operation(&h, 1, 1).await;

    let reply = h
        .controls
        .handle_callback(&format!("index|{}_s", op.id), h.operator())
        .await;
    assert_eq!(reply, ControlReply::notice("Starting Index Operation..."));
    h.engine.join(&op.id).await;
    assert!(h.engine.get(&op.id).await.is_err());

    let reply = h
        .controls
        .handle_callback(&format!("index|{}_s", op.id), h.operator())
        .await;
    assert!(reply.alert);
    assert!(reply.text.starts_with("Operation Not Found!"));

    let other = paused_operation(&h, 1, 5).await;
    let reply = h
        .controls
        .handle_callback(&format!("index|{}_p", other.id), h.operator())
        .await;
    assert_eq!(reply, ControlReply::notice("Operation Will Pause Shortly 🎉"));

    let reply = h.controls.handle_callback("index|zzzzzz_p", h.operator()).await;
    assert!(reply.alert);
    assert!(reply.text.starts_with("Operation not found in database!"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn malformed_payload_raises_alert() {
    let h = harness().await;
    let reply = h.controls.handle_callback("index|abc_x", h.operator()).await;
    assert!(reply.alert);
    assert!(!reply.text.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancel_requires_matching_pid() {
    let h = harness().await;
    let op = paused_operation(&h, 1, 5).await;

    let pressed = press(&h, &op.id, 'c');
    h.answer("permanently cancel", 1, "wrong").await.unwrap();
    assert_eq!(pressed.await.unwrap(), ControlReply::silent());
    let mismatch = reply_with(&h, "❗ Operation pid does not match. Cancel Failed.").await;
    assert_eq!(mismatch.msg.reply_to, Some(1_000_001));
    assert!(h.engine.get(&op.id).await.is_ok());

    let pressed = press(&h, &op.id, 'c');
    h.messenger
        .wait_for_sent(
            |s| s.msg.text.contains(&format!("<code>{}</code> to confirm", op.id)),
            WAIT,
        )
        .await
        .unwrap();
    h.deliver(h.operator_message(2, &format!("  {}  ", op.id)))
        .await
        .unwrap();
    assert_eq!(pressed.await.unwrap(), ControlReply::silent());
    reply_with(&h, "✅ Operation Cancelled Successfully!").await;
    assert!(h.engine.get(&op.id).await.is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unanswered_cancel_prompt_expires_quietly() {
    let h = Arc::new(
        TestHarness::builder()
            .with_prompt_timeout(Duration::from_millis(50))
            .build()
            .await
            .unwrap(),
    );
    let op = paused_operation(&h, 1, 5).await;

    let reply = press(&h, &op.id, 'c').await.unwrap();
    assert_eq!(reply, ControlReply::silent());
    assert_eq!(h.bridge.pending(), 0);
    assert!(h.engine.get(&op.id).await.is_ok());
    assert_eq!(h.messenger.sent().await.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn modify_declined_leaves_end() {
    let h = harness().await;
    let op = paused_operation(&h, 1, 50).await;

    let pressed = press(&h, &op.id, 'm');
    let prompt = h
        .messenger
        .wait_for_sent(|s| s.msg.text == "Would you like to change the end of the index?", WAIT)
        .await
        .unwrap();
    assert_eq!(
        prompt.msg.markup,
        Markup::Choices(vec!["Yes".into(), "No".into()])
    );
    h.deliver(h.operator_message(1, "No")).await.unwrap();
    pressed.await.unwrap();

    let reply = reply_with(&h, "Index not modified.").await;
    assert_eq!(reply.msg.markup, Markup::RemoveKeyboard);
    assert_eq!(h.engine.get(&op.id).await.unwrap().end_id, 50);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn modify_with_private_link_sets_new_end() {
    let h = harness().await;
    let op = paused_operation(&h, 1, 50).await;

    let pressed = press(&h, &op.id, 'm');
    h.answer("change the end", 1, "YES").await.unwrap();
    h.answer("new end message", 2, "https://t.me/c/1234567890/300")
        .await
        .unwrap();
    pressed.await.unwrap();

    let reply = reply_with(
        &h,
        "New end location has been set successfully 🎉\n\nOperation has been paused, please resume to continue indexing files.",
    )
    .await;
    assert_eq!(reply.msg.markup, Markup::RemoveKeyboard);
    assert_eq!(reply.msg.reply_to, Some(1_000_002));

    let stored = h.engine.get(&op.id).await.unwrap();
    assert_eq!(stored.end_id, 300);
    assert!(stored.is_paused);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn modify_with_public_link_resolves_username() {
    let h = harness().await;
    h.messenger.add_username("films", CHANNEL).await;
    let op = paused_operation(&h, 1, 50).await;

    let pressed = press(&h, &op.id, 'm');
    h.answer("change the end", 1, "yes").await.unwrap();
    h.answer("new end message", 2, "t.me/films/250").await.unwrap();
    pressed.await.unwrap();

    assert_eq!(h.engine.get(&op.id).await.unwrap().end_id, 250);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn modify_rejects_bad_targets() {
    let h = harness().await;
    let op = paused_operation(&h, 100, 500).await;

    let cases: [(InboundMessage, &str); 3] = [
        (
            h.operator_message(2, "just some words"),
            "This is not a message link or a forwarded message!",
        ),
        (
            InboundMessage {
                forwarded_from: Some(ForwardedPost {
                    channel_id: -1009999999999,
                    message_id: 900,
                }),
                ..h.operator_message(4, "")
            },
            "This message is not from the same channel as the index operation!",
        ),
        (
            h.operator_message(6, "https://t.me/c/1234567890/100"),
            "New message comes before the current index location!",
        ),
    ];

    for (n, (answer, expected)) in cases.into_iter().enumerate() {
        let pressed = press(&h, &op.id, 'm');
        h.answer("change the end", 10 + n as i64, "yes").await.unwrap();
        h.messenger
            .wait_for_sent(
                |s| s.msg.text.contains("new end message") && s.at.message_id > 1000 + 3 * n as i64,
                WAIT,
            )
            .await
            .unwrap();
        h.deliver(answer).await.unwrap();
        pressed.await.unwrap();

        let reply = reply_with(&h, expected).await;
        assert_eq!(reply.msg.markup, Markup::RemoveKeyboard);
    }
    assert_eq!(h.engine.get(&op.id).await.unwrap().end_id, 500);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn index_command_with_both_links() {
    let h = harness().await;
    let op = h
        .controls
        .index_command(
            h.operator(),
            "https://t.me/c/1234567890/10 https://t.me/c/1234567890/20",
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(op.channel_id, CHANNEL);
    assert_eq!((op.start_id, op.end_id), (10, 20));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn index_command_prompts_for_missing_positions() {
    let h = harness().await;
    let runner = Arc::clone(&h);
    let command =
        tokio::spawn(async move { runner.controls.index_command(runner.operator(), "").await });

    h.messenger
        .wait_for_sent(|s| s.msg.text.contains("first message in the batch"), WAIT)
        .await
        .unwrap();
    h.deliver(InboundMessage {
        chat_id: OPERATOR_CHAT,
        user_id: OPERATOR_USER,
        message_id: 1_000_001,
        text: None,
        forwarded_from: Some(ForwardedPost {
            channel_id: CHANNEL,
            message_id: 40,
        }),
    })
    .await
    .unwrap();
    h.answer("last message in the batch", 2, "https://t.me/c/1234567890/90")
        .await
        .unwrap();

    let op = command.await.unwrap().unwrap().unwrap();
    assert_eq!((op.channel_id, op.start_id, op.end_id), (CHANNEL, 40, 90));
    assert!(h.engine.get(&op.id).await.unwrap().is_paused);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn index_command_rejects_unusable_answer() {
    let h = harness().await;
    let runner = Arc::clone(&h);
    let command =
        tokio::spawn(async move { runner.controls.index_command(runner.operator(), "").await });

    h.answer("first message in the batch", 1, "hello").await.unwrap();
    assert!(command.await.unwrap().unwrap().is_none());
    reply_with(&h, "Message Is Not a Forwarded Channel Post or Message Link!").await;
}
