// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram surface of the autofilter bot.
//!
//! [`TelegramMessenger`] implements [`Messenger`] over the Bot API via
//! teloxide, sending HTML text with inline or reply keyboards.
//! [`polling`] runs the long-polling dispatcher that feeds operator messages
//! to the conversation bridge and button presses to the index controls.

pub mod handler;
pub mod keyboard;
pub mod polling;

use async_trait::async_trait;
use autofilter_config::model::TelegramConfig;
use autofilter_core::traits::PluginAdapter;
use autofilter_core::{
    AdapterType, AutofilterError, HealthStatus, Markup, MessageRef, Messenger, OutboundMessage,
};
use teloxide::prelude::*;
use teloxide::types::{MessageId, ParseMode, Recipient, ReplyParameters};
use tracing::debug;

/// Bot API implementation of [`Messenger`].
#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    /// Creates the messenger. Requires `config.bot_token` to be set.
    pub fn new(config: &TelegramConfig) -> Result<Self, AutofilterError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            AutofilterError::Config("telegram.bot_token is required".into())
        })?;
        if token.is_empty() {
            return Err(AutofilterError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }
        Ok(Self {
            bot: Bot::new(token),
        })
    }

    /// The underlying teloxide bot, shared with the dispatcher.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

#[async_trait]
impl PluginAdapter for TelegramMessenger {
    fn name(&self) -> &str {
        "telegram"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Messenger
    }

    async fn health_check(&self) -> Result<HealthStatus, AutofilterError> {
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), AutofilterError> {
        debug!("Telegram messenger shutting down");
        Ok(())
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send(&self, msg: OutboundMessage) -> Result<MessageRef, AutofilterError> {
        let mut request = self
            .bot
            .send_message(ChatId(msg.chat_id), msg.text)
            .parse_mode(ParseMode::Html);
        if let Some(markup) = keyboard::reply_markup(&msg.markup) {
            request = request.reply_markup(markup);
        }
        if let Some(reply_to) = msg.reply_to {
            request = request.reply_parameters(ReplyParameters::new(to_message_id(reply_to)?));
        }

        let sent = request
            .await
            .map_err(|e| messenger_error("failed to send message", e))?;
        Ok(MessageRef {
            chat_id: sent.chat.id.0,
            message_id: i64::from(sent.id.0),
        })
    }

    async fn edit(&self, target: MessageRef, msg: OutboundMessage) -> Result<(), AutofilterError> {
        let mut request = self
            .bot
            .edit_message_text(
                ChatId(target.chat_id),
                to_message_id(target.message_id)?,
                msg.text,
            )
            .parse_mode(ParseMode::Html);
        match &msg.markup {
            Markup::Inline(rows) => request = request.reply_markup(keyboard::inline_keyboard(rows)),
            Markup::None => {}
            other => debug!(?other, "reply keyboards cannot be edited in, dropped"),
        }

        match request.await {
            Ok(_) => Ok(()),
            // Same text and buttons as before.
            Err(e) if e.to_string().contains("message is not modified") => Ok(()),
            Err(e) => Err(messenger_error("failed to edit message", e)),
        }
    }

    async fn resolve_chat(&self, username: &str) -> Result<i64, AutofilterError> {
        let username = username.trim_start_matches('@');
        let chat = self
            .bot
            .get_chat(Recipient::ChannelUsername(format!("@{username}")))
            .await
            .map_err(|e| messenger_error("failed to resolve chat", e))?;
        Ok(chat.id.0)
    }
}

fn to_message_id(id: i64) -> Result<MessageId, AutofilterError> {
    i32::try_from(id)
        .map(MessageId)
        .map_err(|_| AutofilterError::InvalidInput(format!("message id out of range: {id}")))
}

fn messenger_error(what: &str, e: teloxide::RequestError) -> AutofilterError {
    AutofilterError::Messenger {
        message: format!("{what}: {e}"),
        source: Some(Box::new(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(token: Option<&str>) -> TelegramConfig {
        TelegramConfig {
            bot_token: token.map(str::to_string),
            admins: vec![],
        }
    }

    #[test]
    fn new_requires_bot_token() {
        assert!(TelegramMessenger::new(&config(None)).is_err());
        assert!(TelegramMessenger::new(&config(Some(""))).is_err());
        assert!(TelegramMessenger::new(&config(Some("123456:ABC-DEF1234ghIkl"))).is_ok());
    }

    #[test]
    fn adapter_metadata() {
        let messenger = TelegramMessenger::new(&config(Some("test:token"))).unwrap();
        assert_eq!(messenger.name(), "telegram");
        assert_eq!(messenger.adapter_type(), AdapterType::Messenger);
    }

    #[test]
    fn message_ids_must_fit_the_bot_api() {
        assert_eq!(to_message_id(42).unwrap(), MessageId(42));
        assert!(to_message_id(i64::from(i32::MAX) + 1).is_err());
    }
}
