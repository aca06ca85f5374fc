// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authorization and conversion of Telegram updates.
//!
//! Only configured admins drive index operations. Their messages are turned
//! into channel-agnostic [`InboundMessage`]s for the conversation bridge.

use autofilter_core::InboundMessage;
use autofilter_core::types::ForwardedPost;
use teloxide::types::{Message, MessageOrigin, User};

const INDEX_COMMAND: &str = "/index";

/// Returns `true` when `user` is listed in `admins`.
///
/// An empty list rejects everyone.
pub fn is_admin(user: &User, admins: &[i64]) -> bool {
    i64::try_from(user.id.0).is_ok_and(|id| admins.contains(&id))
}

/// Checks the sender of `msg`. Messages without a sender (channel posts)
/// are never authorized.
pub fn is_authorized(msg: &Message, admins: &[i64]) -> bool {
    msg.from.as_ref().is_some_and(|user| is_admin(user, admins))
}

/// Converts a Telegram message into an [`InboundMessage`].
///
/// Text falls back to the caption; a post forwarded from a channel keeps
/// its origin so it can stand in for a message link.
pub fn to_inbound_message(msg: &Message) -> InboundMessage {
    let user_id = msg
        .from
        .as_ref()
        .and_then(|u| i64::try_from(u.id.0).ok())
        .unwrap_or_default();

    let forwarded_from = match msg.forward_origin() {
        Some(MessageOrigin::Channel {
            chat, message_id, ..
        }) => Some(ForwardedPost {
            channel_id: chat.id.0,
            message_id: i64::from(message_id.0),
        }),
        _ => None,
    };

    InboundMessage {
        chat_id: msg.chat.id.0,
        user_id,
        message_id: i64::from(msg.id.0),
        text: msg.text().or(msg.caption()).map(str::to_string),
        forwarded_from,
    }
}

/// Arguments of an `/index` command (`/index@botname` included), or `None`
/// when `text` is some other message.
pub fn index_args(text: &str) -> Option<&str> {
    let text = text.trim_start();
    let (command, args) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
    let name = command.split_once('@').map_or(command, |(name, _)| name);
    (name == INDEX_COMMAND).then(|| args.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn private_message(extra: serde_json::Value) -> Message {
        let mut json = serde_json::json!({
            "message_id": 7,
            "date": 1700000000i64,
            "chat": {
                "id": 12345i64,
                "type": "private",
                "first_name": "Test",
            },
            "from": {
                "id": 12345u64,
                "is_bot": false,
                "first_name": "Test",
            },
        });
        if let (Some(base), Some(extra)) = (json.as_object_mut(), extra.as_object()) {
            base.extend(extra.clone());
        }
        serde_json::from_value(json).expect("failed to deserialize mock message")
    }

    fn channel_post() -> Message {
        serde_json::from_value(serde_json::json!({
            "message_id": 3,
            "date": 1700000000i64,
            "chat": {
                "id": -1001234567890i64,
                "type": "channel",
                "title": "Films",
            },
            "text": "new upload",
        }))
        .expect("failed to deserialize mock channel post")
    }

    #[test]
    fn admins_are_matched_by_id() {
        let msg = private_message(serde_json::json!({ "text": "hi" }));
        assert!(is_authorized(&msg, &[12345]));
        assert!(!is_authorized(&msg, &[999]));
        assert!(!is_authorized(&msg, &[]));
    }

    #[test]
    fn posts_without_sender_are_rejected() {
        assert!(!is_authorized(&channel_post(), &[12345]));
    }

    #[test]
    fn text_message_maps_fields() {
        let msg = private_message(serde_json::json!({ "text": "https://t.me/c/1234567890/5" }));
        let inbound = to_inbound_message(&msg);
        assert_eq!(inbound.chat_id, 12345);
        assert_eq!(inbound.user_id, 12345);
        assert_eq!(inbound.message_id, 7);
        assert_eq!(inbound.text(), "https://t.me/c/1234567890/5");
        assert!(inbound.forwarded_from.is_none());
    }

    #[test]
    fn forwarded_channel_post_keeps_origin() {
        let msg = private_message(serde_json::json!({
            "caption": "movie.mkv",
            "forward_origin": {
                "type": "channel",
                "date": 1699999999i64,
                "chat": {
                    "id": -1001234567890i64,
                    "type": "channel",
                    "title": "Films",
                },
                "message_id": 42,
            },
        }));
        let inbound = to_inbound_message(&msg);
        assert_eq!(
            inbound.forwarded_from,
            Some(ForwardedPost {
                channel_id: -1001234567890,
                message_id: 42,
            })
        );
        assert_eq!(inbound.text(), "movie.mkv");
    }

    #[test]
    fn index_command_arguments() {
        assert_eq!(index_args("/index"), Some(""));
        assert_eq!(index_args("/index  a b "), Some("a b"));
        assert_eq!(index_args("/index@filter_bot a"), Some("a"));
        assert_eq!(index_args("/indexer"), None);
        assert_eq!(index_args("index"), None);
        assert_eq!(index_args("hello /index"), None);
    }
}
