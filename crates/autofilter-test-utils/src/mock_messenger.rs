// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock messenger for deterministic testing.
//!
//! `MockMessenger` implements `Messenger` by recording every send and edit.
//! Sent messages get increasing ids per process, starting at 1000.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use autofilter_core::traits::adapter::PluginAdapter;
use autofilter_core::{
    AdapterType, AutofilterError, HealthStatus, MessageRef, Messenger, OutboundMessage,
};

/// A message sent through the mock, with where it landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub at: MessageRef,
    pub msg: OutboundMessage,
}

/// An edit applied through the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditedMessage {
    pub target: MessageRef,
    pub msg: OutboundMessage,
}

pub struct MockMessenger {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    edits: Arc<Mutex<Vec<EditedMessage>>>,
    usernames: Arc<Mutex<HashMap<String, i64>>>,
    next_id: AtomicI64,
    fail_sends: AtomicBool,
    notify: Arc<Notify>,
}

impl MockMessenger {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            edits: Arc::new(Mutex::new(Vec::new())),
            usernames: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicI64::new(1000),
            fail_sends: AtomicBool::new(false),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Makes `resolve_chat(username)` return `chat_id`.
    pub async fn add_username(&self, username: &str, chat_id: i64) {
        self.usernames
            .lock()
            .await
            .insert(username.to_string(), chat_id);
    }

    /// Makes every following `send` fail.
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    /// Texts of every sent message, in order.
    pub async fn sent_texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .map(|s| s.msg.text.clone())
            .collect()
    }

    pub async fn edits(&self) -> Vec<EditedMessage> {
        self.edits.lock().await.clone()
    }

    /// The most recent edit of `target`.
    pub async fn last_edit_of(&self, target: MessageRef) -> Option<OutboundMessage> {
        self.edits
            .lock()
            .await
            .iter()
            .rev()
            .find(|e| e.target == target)
            .map(|e| e.msg.clone())
    }

    /// Waits until a sent message satisfies `accept` and returns it.
    pub async fn wait_for_sent(
        &self,
        accept: impl Fn(&SentMessage) -> bool,
        timeout: Duration,
    ) -> Result<SentMessage, AutofilterError> {
        tokio::time::timeout(timeout, async {
            loop {
                let notified = self.notify.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();
                if let Some(found) = self.sent.lock().await.iter().find(|s| accept(s)) {
                    return found.clone();
                }
                notified.await;
            }
        })
        .await
        .map_err(|_| AutofilterError::Timeout { duration: timeout })
    }

    /// Waits until an edit satisfies `accept` and returns it.
    pub async fn wait_for_edit(
        &self,
        accept: impl Fn(&EditedMessage) -> bool,
        timeout: Duration,
    ) -> Result<EditedMessage, AutofilterError> {
        tokio::time::timeout(timeout, async {
            loop {
                let notified = self.notify.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();
                if let Some(found) = self.edits.lock().await.iter().find(|e| accept(e)) {
                    return found.clone();
                }
                notified.await;
            }
        })
        .await
        .map_err(|_| AutofilterError::Timeout { duration: timeout })
    }
}

impl Default for MockMessenger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockMessenger {
    fn name(&self) -> &str {
        "mock-messenger"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Messenger
    }

    async fn health_check(&self) -> Result<HealthStatus, AutofilterError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), AutofilterError> {
        Ok(())
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn send(&self, msg: OutboundMessage) -> Result<MessageRef, AutofilterError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(AutofilterError::Messenger {
                message: "mock send failure".into(),
                source: None,
            });
        }
        let at = MessageRef {
            chat_id: msg.chat_id,
            message_id: self.next_id.fetch_add(1, Ordering::SeqCst),
        };
        self.sent.lock().await.push(SentMessage { at, msg });
        self.notify.notify_waiters();
        Ok(at)
    }

    async fn edit(&self, target: MessageRef, msg: OutboundMessage) -> Result<(), AutofilterError> {
        self.edits.lock().await.push(EditedMessage { target, msg });
        self.notify.notify_waiters();
        Ok(())
    }

    async fn resolve_chat(&self, username: &str) -> Result<i64, AutofilterError> {
        self.usernames
            .lock()
            .await
            .get(username)
            .copied()
            .ok_or_else(|| AutofilterError::Messenger {
                message: format!("chat not found: @{username}"),
                source: None,
            })
    }
}
