// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel message links and forwarded posts as index positions.
//!
//! Two link shapes are understood: `t.me/c/<protocol_channel_id>/<message_id>`
//! for private channels and `t.me/<username>/<message_id>` for public ones.

use autofilter_core::types::to_bot_api_channel_id;
use autofilter_core::{AutofilterError, InboundMessage, Messenger};

/// The chat part of a message link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkChat {
    /// Channel id in bot-API numbering, converted from the link's
    /// protocol-native id.
    Id(i64),
    Username(String),
}

/// A parsed, unresolved message link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageLink {
    pub chat: LinkChat,
    pub message_id: i64,
}

impl MessageLink {
    /// Parses the last two path segments of `text` as chat and message id.
    pub fn parse(text: &str) -> Result<Self, AutofilterError> {
        let invalid = || AutofilterError::InvalidInput(format!("not a message link: {text}"));

        let mut segments = text.trim().trim_end_matches('/').rsplit('/');
        let message_id = segments
            .next()
            .and_then(|s| s.parse::<i64>().ok())
            .filter(|id| *id > 0)
            .ok_or_else(invalid)?;
        let chat = segments
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(invalid)?;

        let chat = match chat.parse::<i64>() {
            Ok(protocol_id) => LinkChat::Id(to_bot_api_channel_id(protocol_id)),
            Err(_) => LinkChat::Username(chat.trim_start_matches('@').to_string()),
        };
        Ok(Self { chat, message_id })
    }

    /// Resolves the chat part, looking usernames up through `messenger`.
    pub async fn resolve(&self, messenger: &dyn Messenger) -> Result<MessageTarget, AutofilterError> {
        let channel_id = match &self.chat {
            LinkChat::Id(id) => *id,
            LinkChat::Username(name) => messenger.resolve_chat(name).await?,
        };
        Ok(MessageTarget {
            channel_id,
            message_id: self.message_id,
        })
    }
}

/// A resolved message position in a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageTarget {
    /// Channel id in bot-API numbering.
    pub channel_id: i64,
    pub message_id: i64,
}

impl MessageTarget {
    /// Reads a position from an operator message: a forwarded channel post
    /// wins over a link in the text. `Ok(None)` when the message carries
    /// neither.
    pub async fn from_inbound(
        msg: &InboundMessage,
        messenger: &dyn Messenger,
    ) -> Result<Option<Self>, AutofilterError> {
        if let Some(post) = msg.forwarded_from {
            return Ok(Some(Self {
                channel_id: post.channel_id,
                message_id: post.message_id,
            }));
        }
        match MessageLink::parse(msg.text()) {
            Ok(link) => link.resolve(messenger).await.map(Some),
            Err(_) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_private_and_public_links() {
        assert_eq!(
            MessageLink::parse("https://t.me/c/1234567890/9876").unwrap(),
            MessageLink {
                chat: LinkChat::Id(-1001234567890),
                message_id: 9876
            }
        );
        assert_eq!(
            MessageLink::parse("t.me/c/2235842999/1").unwrap(),
            MessageLink {
                chat: LinkChat::Id(-1002235842999),
                message_id: 1
            }
        );
        assert_eq!(
            MessageLink::parse("https://t.me/durov/12").unwrap(),
            MessageLink {
                chat: LinkChat::Username("durov".into()),
                message_id: 12
            }
        );
        assert_eq!(
            MessageLink::parse("  t.me/MyUsername/123456/ ").unwrap().message_id,
            123456
        );
    }

    #[test]
    fn rejects_text_that_is_not_a_link() {
        for text in ["", "hello", "12", "/12", "t.me/durov/abc", "t.me/durov/-4"] {
            assert!(MessageLink::parse(text).is_err(), "{text:?} should not parse");
        }
    }
}
