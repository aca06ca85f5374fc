// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt registry and dispatch.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, trace};

use autofilter_core::{AutofilterError, InboundMessage, Messenger, OutboundMessage};

/// How long a prompt waits for its answer unless the caller says otherwise.
pub const DEFAULT_PROMPT_TIMEOUT: Duration = Duration::from_secs(300);

/// Decides whether an inbound message answers a pending prompt.
pub type Predicate = Box<dyn Fn(&InboundMessage) -> bool + Send + Sync>;

struct Listener {
    id: u64,
    predicate: Predicate,
    reply: oneshot::Sender<InboundMessage>,
}

/// Matches inbound operator messages to outstanding prompts.
///
/// Each listener receives at most one message. Registration, matching and
/// removal happen under one lock, so concurrent `dispatch` calls never hand
/// the same listener two messages.
pub struct Bridge {
    messenger: Arc<dyn Messenger>,
    listeners: Mutex<Vec<Listener>>,
    next_id: AtomicU64,
    default_timeout: Duration,
}

impl Bridge {
    pub fn new(messenger: Arc<dyn Messenger>, default_timeout: Duration) -> Self {
        Self {
            messenger,
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            default_timeout,
        }
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    pub fn messenger(&self) -> &Arc<dyn Messenger> {
        &self.messenger
    }

    /// Sends `prompt` and waits for the next message from `user_id` in the
    /// prompt's chat that arrives after the prompt itself.
    ///
    /// Returns [`AutofilterError::Timeout`] when nothing arrives in time
    /// (`None` uses the bridge default).
    pub async fn ask(
        &self,
        user_id: i64,
        prompt: OutboundMessage,
        timeout: Option<Duration>,
    ) -> Result<InboundMessage, AutofilterError> {
        let chat_id = prompt.chat_id;
        let sent = self.messenger.send(prompt).await?;
        let last_seen = sent.message_id;

        self.wait_for(
            Box::new(move |msg: &InboundMessage| {
                msg.chat_id == chat_id && msg.user_id == user_id && msg.message_id > last_seen
            }),
            timeout.unwrap_or(self.default_timeout),
        )
        .await
    }

    /// Registers `predicate` and waits for the first message it accepts.
    pub async fn wait_for(
        &self,
        predicate: Predicate,
        timeout: Duration,
    ) -> Result<InboundMessage, AutofilterError> {
        let (tx, rx) = oneshot::channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners().push(Listener {
            id,
            predicate,
            reply: tx,
        });
        let _guard = ListenerGuard { bridge: self, id };
        trace!(listener = id, "prompt registered");

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(msg)) => Ok(msg),
            Ok(Err(_)) => Err(AutofilterError::Internal(
                "prompt was abandoned before an answer arrived".into(),
            )),
            Err(_) => {
                debug!(listener = id, ?timeout, "prompt timed out");
                Err(AutofilterError::Timeout { duration: timeout })
            }
        }
    }

    /// Delivers `msg` to the first pending prompt that accepts it.
    ///
    /// Returns `false` when no prompt took the message; the caller should then
    /// pass it on to its other handlers.
    pub fn dispatch(&self, msg: &InboundMessage) -> bool {
        let mut listeners = self.listeners();
        let mut msg = msg.clone();
        loop {
            let Some(pos) = listeners.iter().position(|l| (l.predicate)(&msg)) else {
                return false;
            };
            let listener = listeners.remove(pos);
            match listener.reply.send(msg) {
                Ok(()) => {
                    trace!(listener = listener.id, "prompt answered");
                    return true;
                }
                // The waiting side is gone; try the next match.
                Err(returned) => msg = returned,
            }
        }
    }

    /// Number of prompts still waiting for an answer.
    pub fn pending(&self) -> usize {
        self.listeners().len()
    }

    /// Drops every pending prompt; their callers get an error.
    pub fn clear(&self) {
        self.listeners().clear();
    }

    fn listeners(&self) -> MutexGuard<'_, Vec<Listener>> {
        // Listener removal leaves no half-updated state behind a panic.
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove(&self, id: u64) {
        self.listeners().retain(|l| l.id != id);
    }
}

/// Unregisters a listener when its waiting future ends or is dropped.
struct ListenerGuard<'a> {
    bridge: &'a Bridge,
    id: u64,
}

impl Drop for ListenerGuard<'_> {
    fn drop(&mut self) {
        self.bridge.remove(self.id);
    }
}
