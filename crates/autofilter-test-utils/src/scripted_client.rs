// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A protocol client that serves canned channel history.
//!
//! Tests fill a shared [`ClientScript`] with messages and queued failures;
//! every client the factory hands out reads from it and records its calls.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use autofilter_core::traits::protocol::{
    ChannelHandle, ClientFactory, Credentials, FetchedMessage, ProtocolClient, ProtocolError,
};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared state behind scripted clients.
#[derive(Default)]
pub struct ClientScript {
    messages: Mutex<BTreeMap<i64, FetchedMessage>>,
    fetch_errors: Mutex<VecDeque<ProtocolError>>,
    resolve_error: Mutex<Option<ProtocolError>>,
    fetch_delay: Mutex<Duration>,
    fetches: Mutex<Vec<Vec<i64>>>,
    fetch_times: Mutex<Vec<Instant>>,
    resolved: Mutex<Vec<i64>>,
}

impl ClientScript {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Adds history. Ids without an entry are omitted from fetch results.
    pub fn add_messages(&self, messages: impl IntoIterator<Item = FetchedMessage>) {
        let mut map = lock(&self.messages);
        for msg in messages {
            map.insert(fetched_id(&msg), msg);
        }
    }

    /// Queues an error for the next fetch; queued errors are returned in order.
    pub fn push_fetch_error(&self, err: ProtocolError) {
        lock(&self.fetch_errors).push_back(err);
    }

    pub fn fail_resolve(&self, err: ProtocolError) {
        *lock(&self.resolve_error) = Some(err);
    }

    /// Slows every fetch down, so a test can act while a run is in flight.
    pub fn set_fetch_delay(&self, delay: Duration) {
        *lock(&self.fetch_delay) = delay;
    }

    /// Id lists of every fetch, in order.
    pub fn fetches(&self) -> Vec<Vec<i64>> {
        lock(&self.fetches).clone()
    }

    /// When each fetch was issued, on the tokio clock.
    pub fn fetch_times(&self) -> Vec<Instant> {
        lock(&self.fetch_times).clone()
    }

    /// Protocol-native channel ids passed to `resolve_channel`.
    pub fn resolved(&self) -> Vec<i64> {
        lock(&self.resolved).clone()
    }
}

fn fetched_id(msg: &FetchedMessage) -> i64 {
    match msg {
        FetchedMessage::Regular(m) => m.id,
        FetchedMessage::Service { id } | FetchedMessage::Empty { id } => *id,
    }
}

/// A logged-in client reading from a [`ClientScript`].
pub struct ScriptedClient {
    script: Arc<ClientScript>,
}

#[async_trait]
impl ProtocolClient for ScriptedClient {
    async fn resolve_channel(&self, channel_id: i64) -> Result<ChannelHandle, ProtocolError> {
        lock(&self.script.resolved).push(channel_id);
        if let Some(err) = lock(&self.script.resolve_error).clone() {
            return Err(err);
        }
        Ok(ChannelHandle {
            id: channel_id,
            access_hash: channel_id.wrapping_mul(31),
        })
    }

    async fn fetch_messages(
        &self,
        _channel: &ChannelHandle,
        ids: &[i64],
    ) -> Result<Vec<FetchedMessage>, ProtocolError> {
        lock(&self.script.fetches).push(ids.to_vec());
        lock(&self.script.fetch_times).push(Instant::now());
        let delay = *lock(&self.script.fetch_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = lock(&self.script.fetch_errors).pop_front() {
            return Err(err);
        }
        let messages = lock(&self.script.messages);
        Ok(ids.iter().filter_map(|id| messages.get(id).cloned()).collect())
    }
}

/// Hands out [`ScriptedClient`]s, or a login failure when told to.
pub struct ScriptedClientFactory {
    script: Arc<ClientScript>,
    login_error: Mutex<Option<ProtocolError>>,
    logins: AtomicUsize,
}

impl ScriptedClientFactory {
    pub fn new(script: Arc<ClientScript>) -> Self {
        Self {
            script,
            login_error: Mutex::new(None),
            logins: AtomicUsize::new(0),
        }
    }

    pub fn fail_login(&self, err: Option<ProtocolError>) {
        *lock(&self.login_error) = err;
    }

    /// Number of authentication attempts so far.
    pub fn logins(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClientFactory for ScriptedClientFactory {
    async fn authenticate(
        &self,
        _credentials: &Credentials,
    ) -> Result<Box<dyn ProtocolClient>, ProtocolError> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = lock(&self.login_error).clone() {
            return Err(err);
        }
        Ok(Box::new(ScriptedClient {
            script: Arc::clone(&self.script),
        }))
    }
}
