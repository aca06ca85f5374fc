// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Low-level messaging protocol client used to crawl channel history.
//!
//! Only the surface the index engine needs is modelled: authenticate,
//! resolve a channel, and fetch messages by id. Raw messages carry the
//! document fields the classifier and the file-id codec consume.

use async_trait::async_trait;
use thiserror::Error;

/// An error returned by the protocol client.
///
/// Rate-limit signals are ordinary errors whose text embeds the mandated
/// wait, e.g. `"FLOOD_WAIT_X: A wait of 17 seconds is required"`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("protocol error: {message}")]
pub struct ProtocolError {
    pub message: String,
}

impl ProtocolError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Credentials used to log the client in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub app_id: Option<i32>,
    pub app_hash: Option<String>,
    pub bot_token: String,
}

/// A resolved channel, ready for history requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelHandle {
    /// Protocol-native channel id.
    pub id: i64,
    pub access_hash: i64,
}

/// Declared attributes of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentAttribute {
    ImageSize { width: i32, height: i32 },
    Animated,
    Sticker,
    HasStickers,
    Video { duration_secs: u32 },
    Audio { voice: bool },
    Filename(String),
    Other(String),
}

/// A binary document attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub id: i64,
    pub access_hash: i64,
    pub file_reference: Vec<u8>,
    pub dc_id: i32,
    pub size: i64,
    pub mime_type: String,
    pub attributes: Vec<DocumentAttribute>,
}

/// Media attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawMedia {
    /// A document; `None` when the server returned an empty document.
    Document(Option<RawDocument>),
    Photo,
    /// Any other media kind, named for logging.
    Other(String),
}

/// A regular message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub id: i64,
    /// Unix timestamp of the post.
    pub date: i64,
    pub media: Option<RawMedia>,
}

/// One entry of a history response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchedMessage {
    Regular(RawMessage),
    /// A service message (pin, join, ...).
    Service { id: i64 },
    /// The id does not exist or was deleted.
    Empty { id: i64 },
}

/// A logged-in protocol client.
#[async_trait]
pub trait ProtocolClient: Send + Sync {
    /// Resolves a channel by its protocol-native id.
    async fn resolve_channel(&self, channel_id: i64) -> Result<ChannelHandle, ProtocolError>;

    /// Fetches messages by id from a resolved channel.
    async fn fetch_messages(
        &self,
        channel: &ChannelHandle,
        ids: &[i64],
    ) -> Result<Vec<FetchedMessage>, ProtocolError>;
}

/// Creates and authenticates a fresh client for each run.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<Box<dyn ProtocolClient>, ProtocolError>;
}
