// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common domain types shared across the autofilter workspace.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Smallest bot-API channel id; channel ids in bot-API numbering lie below it.
pub const ZERO_CHANNEL_ID: i64 = -1_000_000_000_000;

/// Converts a bot-API channel id (e.g. `-1001234567890`) to the protocol-native
/// numbering (`1234567890`).
pub fn to_protocol_channel_id(bot_api_id: i64) -> i64 {
    ZERO_CHANNEL_ID - bot_api_id
}

/// Converts a protocol-native channel id back to bot-API numbering.
pub fn to_bot_api_channel_id(protocol_id: i64) -> i64 {
    ZERO_CHANNEL_ID - protocol_id
}

/// Builds the public deep link to a message in a channel.
pub fn message_link(bot_api_channel_id: i64, message_id: i64) -> String {
    format!(
        "https://t.me/c/{}/{message_id}",
        to_protocol_channel_id(bot_api_channel_id)
    )
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// The kind of adapter behind a [`PluginAdapter`](crate::PluginAdapter).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Messenger,
}

// --- Index operations ---

/// One persisted index job with a resumable checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Short random id, used in every control payload.
    pub id: String,
    /// Source channel in bot-API numbering.
    pub channel_id: i64,
    /// First message id of the range (inclusive).
    pub start_id: i64,
    /// Last message id of the range (inclusive).
    pub end_id: i64,
    /// Next message id to fetch.
    pub current_id: i64,
    /// Messages classified and stored.
    pub saved: i64,
    /// Messages rejected or failed to store.
    pub failed: i64,
    /// `false` only while a run is meant to be advancing `current_id`.
    pub is_paused: bool,
    /// Chat that receives progress messages.
    pub progress_chat_id: i64,
}

impl Operation {
    /// A fresh, paused operation positioned at `start_id`.
    pub fn new(
        id: impl Into<String>,
        channel_id: i64,
        start_id: i64,
        end_id: i64,
        progress_chat_id: i64,
    ) -> Self {
        Self {
            id: id.into(),
            channel_id,
            start_id,
            end_id,
            current_id: start_id,
            saved: 0,
            failed: 0,
            is_paused: true,
            progress_chat_id,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.current_id >= self.end_id
    }

    /// Channel id in protocol-native numbering.
    pub fn protocol_channel_id(&self) -> i64 {
        to_protocol_channel_id(self.channel_id)
    }
}

/// Typed partial updates accepted by an [`OperationStore`](crate::OperationStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationUpdate {
    /// Progress checkpoint written by a run.
    Checkpoint {
        current_id: i64,
        saved: i64,
        failed: i64,
    },
    /// New end of range; set by `modify`.
    End { end_id: i64 },
    /// Persisted run intent.
    Paused(bool),
}

/// Operator control actions carried by inline buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum ControlAction {
    #[strum(serialize = "s")]
    Start,
    #[strum(serialize = "p")]
    Pause,
    #[strum(serialize = "c")]
    Cancel,
    #[strum(serialize = "m")]
    Modify,
}

// --- Files ---

/// Media kind of an indexed file.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Document,
    Video,
    Audio,
    Voice,
}

/// One ingested media item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    /// Random opaque key; primary key of the store.
    pub unique_id: String,
    /// Codec-produced handle used to re-send the media.
    pub file_handle: String,
    pub name: String,
    pub file_type: FileType,
    pub size: i64,
    /// Unix timestamp of the source message.
    pub saved_at: i64,
}

// --- Bot-facing messages ---

/// Address of a message the bot sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: i64,
    pub message_id: i64,
}

/// An inline button carrying a callback payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// Keyboard attached to an outgoing message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Markup {
    #[default]
    None,
    /// Rows of inline buttons.
    Inline(Vec<Vec<InlineButton>>),
    /// A one-time reply keyboard with a single row of choices.
    Choices(Vec<String>),
    /// Removes a previously shown reply keyboard.
    RemoveKeyboard,
}

/// A text message to send or to edit into place. Text is HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub chat_id: i64,
    pub text: String,
    pub markup: Markup,
    /// Message id to reply to, if any.
    pub reply_to: Option<i64>,
}

impl OutboundMessage {
    pub fn new(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            markup: Markup::None,
            reply_to: None,
        }
    }

    pub fn with_markup(mut self, markup: Markup) -> Self {
        self.markup = markup;
        self
    }

    pub fn reply_to(mut self, message_id: i64) -> Self {
        self.reply_to = Some(message_id);
        self
    }
}

/// Origin of a message forwarded from a channel post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardedPost {
    /// Source channel in bot-API numbering.
    pub channel_id: i64,
    pub message_id: i64,
}

/// An inbound operator message, as delivered to the correlation bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub chat_id: i64,
    pub user_id: i64,
    pub message_id: i64,
    pub text: Option<String>,
    pub forwarded_from: Option<ForwardedPost>,
}

impl InboundMessage {
    /// Trimmed text of the message, empty when there is none.
    pub fn text(&self) -> &str {
        self.text.as_deref().map(str::trim).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn channel_id_numbering_converts_both_ways() {
        assert_eq!(to_protocol_channel_id(-1001234567890), 1234567890);
        assert_eq!(to_bot_api_channel_id(1234567890), -1001234567890);
    }

    #[test]
    fn message_link_uses_protocol_numbering() {
        assert_eq!(
            message_link(-1001234567890, 42),
            "https://t.me/c/1234567890/42"
        );
    }

    #[test]
    fn new_operation_starts_paused_at_start() {
        let op = Operation::new("abc123", -100500, 10, 20, 7);
        assert_eq!(op.current_id, 10);
        assert!(op.is_paused);
        assert!(!op.is_complete());
        assert_eq!(op.saved, 0);
        assert_eq!(op.failed, 0);
    }

    #[test]
    fn control_action_chars() {
        assert_eq!(ControlAction::Start.to_string(), "s");
        assert_eq!(ControlAction::Modify.to_string(), "m");
        assert_eq!(ControlAction::from_str("p").unwrap(), ControlAction::Pause);
        assert!(ControlAction::from_str("x").is_err());
    }

    #[test]
    fn file_type_is_lowercase() {
        assert_eq!(FileType::Voice.to_string(), "voice");
        assert_eq!(FileType::from_str("video").unwrap(), FileType::Video);
        let json = serde_json::to_string(&FileType::Document).unwrap();
        assert_eq!(json, "\"document\"");
    }

    #[test]
    fn inbound_text_is_trimmed() {
        let msg = InboundMessage {
            chat_id: 1,
            user_id: 2,
            message_id: 3,
            text: Some("  yes \n".into()),
            forwarded_from: None,
        };
        assert_eq!(msg.text(), "yes");
    }
}
