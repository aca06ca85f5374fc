// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bot-facing messaging surface.

use async_trait::async_trait;

use crate::error::AutofilterError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{MessageRef, OutboundMessage};

/// Sends and edits HTML text messages with optional keyboards.
#[async_trait]
pub trait Messenger: PluginAdapter {
    /// Sends a message and returns where it landed.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageRef, AutofilterError>;

    /// Replaces the text and keyboard of a message sent earlier.
    /// `msg.chat_id` is ignored in favour of `target`.
    async fn edit(&self, target: MessageRef, msg: OutboundMessage) -> Result<(), AutofilterError>;

    /// Resolves a public `@username` to a chat id in bot-API numbering.
    async fn resolve_chat(&self, username: &str) -> Result<i64, AutofilterError>;
}
