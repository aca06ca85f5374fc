// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator controls: the `/index` setup flow, button presses, and the
//! confirmation prompts behind cancel and modify.

use std::sync::Arc;

use tracing::{debug, error, warn};

use autofilter_conversation::Bridge;
use autofilter_core::{
    AutofilterError, ControlAction, InboundMessage, Markup, Messenger, Operation, OutboundMessage,
};

use crate::engine::IndexEngine;
use crate::link::{MessageLink, MessageTarget};
use crate::payload::ControlPayload;
use crate::progress::{SETTING_UP_TEXT, overview};

const INVALID_CONTROL: &str = "Invalid control button!";
const START_OK: &str = "Starting Index Operation...";
const START_NOT_FOUND: &str = "Operation Not Found!\nOperation may be completed or cancelled.";
const START_FAILED: &str = "Failed to start the operation, please check logs!";
const PAUSE_OK: &str = "Operation Will Pause Shortly 🎉";
const PAUSE_NOT_FOUND: &str = "Operation not found in database!\nMay have ended or been cancelled.";
const PAUSE_FAILED: &str = "Setting DB status to paused failed, please check logs!";

const CANCEL_MISMATCH: &str = "❗ Operation pid does not match. Cancel Failed.";
const CANCEL_OK: &str = "✅ Operation Cancelled Successfully!";
const CANCEL_FAILED: &str = "An error occurred while trying to delete the operation, please check logs!";

const MODIFY_CONFIRM: &str = "Would you like to change the end of the index?";
const MODIFY_DECLINED: &str = "Index not modified.";
const MODIFY_ASK_END: &str = "Please send the link or forward(with quotes) the new end message: ";
const MODIFY_NOT_A_LINK: &str = "This is not a message link or a forwarded message!";
const MODIFY_WRONG_CHANNEL: &str = "This message is not from the same channel as the index operation!";
const MODIFY_BEFORE_CURRENT: &str = "New message comes before the current index location!";
const MODIFY_NOT_FOUND: &str = "Operation not found!\nMay have ended or been cancelled.";
const MODIFY_FAILED: &str = "Failed to set new end, a db error occurred. Please check logs for more.";
const MODIFY_OK: &str = "New end location has been set successfully 🎉\n\nOperation has been paused, please resume to continue indexing files.";

const ASK_FIRST: &str = "Please forward or send the post link of the first message in the batch:";
const ASK_LAST: &str = "Please forward or send the post link of the last message in the batch:";
const NOT_A_POST: &str = "Message Is Not a Forwarded Channel Post or Message Link!";
const CHAT_NOT_FOUND: &str = "Unable to find the channel of that link, make sure the bot can access it.";
const RANGE_INVALID: &str = "First Message Cannot be After The Last :/";

/// Answer to a button press: a toast, or an alert when `alert` is set.
/// An empty text answers silently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlReply {
    pub text: String,
    pub alert: bool,
}

impl ControlReply {
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn notice(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            alert: false,
        }
    }

    pub fn alert(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            alert: true,
        }
    }
}

/// Who pressed a button, and where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operator {
    pub chat_id: i64,
    pub user_id: i64,
}

/// A validated request to index `start_id..=end_id` of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRequest {
    /// Chat that receives the overview and progress messages.
    pub chat_id: i64,
    /// Source channel in bot-API numbering.
    pub channel_id: i64,
    pub start_id: i64,
    pub end_id: i64,
}

/// Glue between operator input and the [`IndexEngine`].
pub struct Controls {
    engine: IndexEngine,
    bridge: Arc<Bridge>,
    messenger: Arc<dyn Messenger>,
}

impl Controls {
    pub fn new(engine: IndexEngine, bridge: Arc<Bridge>, messenger: Arc<dyn Messenger>) -> Self {
        Self {
            engine,
            bridge,
            messenger,
        }
    }

    pub fn engine(&self) -> &IndexEngine {
        &self.engine
    }

    /// Creates the operation behind `request` and shows its overview with
    /// Cancel/Modify/Start buttons.
    pub async fn open(&self, request: IndexRequest) -> Result<Operation, AutofilterError> {
        if request.start_id > request.end_id {
            self.messenger
                .send(OutboundMessage::new(request.chat_id, RANGE_INVALID))
                .await?;
            return Err(AutofilterError::InvalidRange {
                start: request.start_id,
                end: request.end_id,
            });
        }

        let placeholder = self
            .messenger
            .send(OutboundMessage::new(request.chat_id, SETTING_UP_TEXT))
            .await?;
        let op = self
            .engine
            .create(
                request.channel_id,
                request.start_id,
                request.end_id,
                placeholder.chat_id,
            )
            .await?;
        if let Err(e) = self.messenger.edit(placeholder, overview(&op)).await {
            warn!(pid = %op.id, error = %e, "failed to show operation overview");
        }
        Ok(op)
    }

    /// Handles `/index [first_link] [last_link]`, prompting for whatever
    /// position the arguments leave out, then opens the operation.
    /// Returns `Ok(None)` when the operator gave up or sent something unusable.
    pub async fn index_command(
        &self,
        operator: Operator,
        args: &str,
    ) -> Result<Option<Operation>, AutofilterError> {
        let mut links = args.split_whitespace().filter_map(|s| MessageLink::parse(s).ok());

        let start = match links.next() {
            Some(link) => match link.resolve(self.messenger.as_ref()).await {
                Ok(target) => target,
                Err(e) => {
                    debug!(error = %e, "failed to resolve start link");
                    self.say(operator.chat_id, CHAT_NOT_FOUND).await?;
                    return Ok(None);
                }
            },
            None => match self.ask_position(operator, ASK_FIRST).await? {
                Some(target) => target,
                None => return Ok(None),
            },
        };
        let end_id = match links.next() {
            Some(link) => link.message_id,
            None => match self.ask_position(operator, ASK_LAST).await? {
                Some(target) => target.message_id,
                None => return Ok(None),
            },
        };

        let request = IndexRequest {
            chat_id: operator.chat_id,
            channel_id: start.channel_id,
            start_id: start.message_id,
            end_id,
        };
        match self.open(request).await {
            Ok(op) => Ok(Some(op)),
            Err(AutofilterError::InvalidRange { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Parses a callback payload and runs its action.
    pub async fn handle_callback(&self, data: &str, operator: Operator) -> ControlReply {
        match data.parse::<ControlPayload>() {
            Ok(payload) => {
                self.handle(&payload.operation_id, payload.action, operator)
                    .await
            }
            Err(e) => {
                warn!(data, error = %e, "invalid index callback");
                ControlReply::alert(INVALID_CONTROL)
            }
        }
    }

    /// Runs one control action. Cancel and modify hold a conversation with
    /// the operator before they return.
    pub async fn handle(&self, id: &str, action: ControlAction, operator: Operator) -> ControlReply {
        match action {
            ControlAction::Start => match self.engine.start_or_resume(id).await {
                Ok(()) => ControlReply::notice(START_OK),
                Err(AutofilterError::OperationNotFound { .. }) => ControlReply::alert(START_NOT_FOUND),
                Err(e) => {
                    error!(pid = %id, error = %e, "failed to start operation");
                    ControlReply::alert(START_FAILED)
                }
            },
            ControlAction::Pause => match self.engine.pause(id).await {
                Ok(()) => ControlReply::notice(PAUSE_OK),
                Err(AutofilterError::OperationNotFound { .. }) => ControlReply::alert(PAUSE_NOT_FOUND),
                Err(e) => {
                    error!(pid = %id, error = %e, "failed to set paused status");
                    ControlReply::alert(PAUSE_FAILED)
                }
            },
            ControlAction::Cancel => {
                if let Err(e) = self.confirm_cancel(id, operator).await {
                    log_conversation_error(id, "cancel", &e);
                }
                ControlReply::silent()
            }
            ControlAction::Modify => {
                if let Err(e) = self.modify_end(id, operator).await {
                    log_conversation_error(id, "modify", &e);
                }
                ControlReply::silent()
            }
        }
    }

    async fn confirm_cancel(&self, id: &str, operator: Operator) -> Result<(), AutofilterError> {
        let prompt = OutboundMessage::new(
            operator.chat_id,
            format!(
                "⚠️ Are you sure you want to permanently cancel this index function? \
                 Please send the process id <code>{id}</code> to confirm: "
            ),
        );
        let answer = self.bridge.ask(operator.user_id, prompt, None).await?;

        if answer.text() != id {
            return self.reply(&answer, CANCEL_MISMATCH, Markup::None).await;
        }
        let text = match self.engine.cancel(id).await {
            Ok(()) => CANCEL_OK,
            Err(AutofilterError::OperationNotFound { .. }) => START_NOT_FOUND,
            Err(e) => {
                warn!(pid = %id, error = %e, "failed to delete operation");
                CANCEL_FAILED
            }
        };
        self.reply(&answer, text, Markup::None).await
    }

    async fn modify_end(&self, id: &str, operator: Operator) -> Result<(), AutofilterError> {
        let confirm = OutboundMessage::new(operator.chat_id, MODIFY_CONFIRM)
            .with_markup(Markup::Choices(vec!["Yes".into(), "No".into()]));
        let answer = self.bridge.ask(operator.user_id, confirm, None).await?;
        if !answer.text().eq_ignore_ascii_case("yes") {
            debug!(pid = %id, "end left unchanged");
            return self
                .reply(&answer, MODIFY_DECLINED, Markup::RemoveKeyboard)
                .await;
        }

        let answer = self
            .bridge
            .ask(
                operator.user_id,
                OutboundMessage::new(operator.chat_id, MODIFY_ASK_END),
                None,
            )
            .await?;
        let text = self.apply_new_end(id, &answer).await?;
        self.reply(&answer, text, Markup::RemoveKeyboard).await
    }

    async fn apply_new_end(
        &self,
        id: &str,
        answer: &InboundMessage,
    ) -> Result<&'static str, AutofilterError> {
        let target = match MessageTarget::from_inbound(answer, self.messenger.as_ref()).await {
            Ok(Some(target)) => target,
            Ok(None) => return Ok(MODIFY_NOT_A_LINK),
            Err(e) => {
                debug!(pid = %id, error = %e, "failed to resolve new end link");
                return Ok(CHAT_NOT_FOUND);
            }
        };

        let op = match self.engine.get(id).await {
            Ok(op) => op,
            Err(AutofilterError::OperationNotFound { .. }) => return Ok(MODIFY_NOT_FOUND),
            Err(e) => return Err(e),
        };
        if target.channel_id != op.channel_id {
            debug!(pid = %id, received = target.channel_id, expected = op.channel_id, "new end from another channel");
            return Ok(MODIFY_WRONG_CHANNEL);
        }
        if target.message_id <= op.current_id {
            return Ok(MODIFY_BEFORE_CURRENT);
        }

        Ok(match self.engine.modify(id, target.message_id).await {
            Ok(()) => MODIFY_OK,
            Err(AutofilterError::InvalidEnd { .. }) => MODIFY_BEFORE_CURRENT,
            Err(AutofilterError::OperationNotFound { .. }) => MODIFY_NOT_FOUND,
            Err(e) => {
                error!(pid = %id, error = %e, "failed to set new end");
                MODIFY_FAILED
            }
        })
    }

    /// Asks for a channel position. `Ok(None)` when the answer is unusable
    /// or never comes; the operator has been told in the first case.
    async fn ask_position(
        &self,
        operator: Operator,
        prompt: &str,
    ) -> Result<Option<MessageTarget>, AutofilterError> {
        let answer = match self
            .bridge
            .ask(
                operator.user_id,
                OutboundMessage::new(operator.chat_id, prompt),
                None,
            )
            .await
        {
            Ok(answer) => answer,
            Err(e) if e.is_timeout() => {
                debug!("index setup prompt expired");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        match MessageTarget::from_inbound(&answer, self.messenger.as_ref()).await {
            Ok(Some(target)) => Ok(Some(target)),
            Ok(None) => {
                self.reply(&answer, NOT_A_POST, Markup::None).await?;
                Ok(None)
            }
            Err(e) => {
                debug!(error = %e, "failed to resolve position link");
                self.reply(&answer, CHAT_NOT_FOUND, Markup::None).await?;
                Ok(None)
            }
        }
    }

    async fn reply(
        &self,
        to: &InboundMessage,
        text: &str,
        markup: Markup,
    ) -> Result<(), AutofilterError> {
        self.messenger
            .send(
                OutboundMessage::new(to.chat_id, text)
                    .reply_to(to.message_id)
                    .with_markup(markup),
            )
            .await?;
        Ok(())
    }

    async fn say(&self, chat_id: i64, text: &str) -> Result<(), AutofilterError> {
        self.messenger.send(OutboundMessage::new(chat_id, text)).await?;
        Ok(())
    }
}

fn log_conversation_error(id: &str, flow: &str, e: &AutofilterError) {
    if e.is_timeout() {
        debug!(pid = %id, flow, "operator did not answer in time");
    } else {
        warn!(pid = %id, flow, error = %e, "control conversation failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replies() {
        assert_eq!(ControlReply::silent().text, "");
        assert!(!ControlReply::silent().alert);
        assert!(ControlReply::alert("x").alert);
        assert!(!ControlReply::notice("x").alert);
    }
}
