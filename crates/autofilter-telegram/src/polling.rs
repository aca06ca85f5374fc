// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long polling and update routing.
//!
//! teloxide hands updates of one chat to its handler in order, so anything
//! that waits on the conversation bridge runs in its own task; otherwise the
//! answer it waits for would queue behind it.

use std::sync::Arc;

use autofilter_conversation::Bridge;
use autofilter_core::ControlAction;
use autofilter_index::{ControlPayload, ControlReply, Controls, Operator};
use teloxide::prelude::*;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::handler;

/// Shared state of the update handlers.
#[derive(Clone)]
pub struct Router {
    controls: Arc<Controls>,
    bridge: Arc<Bridge>,
    admins: Arc<Vec<i64>>,
}

impl Router {
    pub fn new(controls: Arc<Controls>, bridge: Arc<Bridge>, admins: Vec<i64>) -> Self {
        Self {
            controls,
            bridge,
            admins: Arc::new(admins),
        }
    }

    /// Routes an operator message: pending prompts first, then commands.
    pub async fn on_message(&self, msg: Message) {
        if !handler::is_authorized(&msg, &self.admins) {
            debug!(chat_id = msg.chat.id.0, "ignoring message from non-admin");
            return;
        }

        let inbound = handler::to_inbound_message(&msg);
        if self.bridge.dispatch(&inbound) {
            return;
        }
        let Some(args) = handler::index_args(inbound.text()) else {
            return;
        };

        let operator = Operator {
            chat_id: inbound.chat_id,
            user_id: inbound.user_id,
        };
        let args = args.to_string();
        let controls = Arc::clone(&self.controls);
        tokio::spawn(async move {
            match controls.index_command(operator, &args).await {
                Ok(Some(op)) => info!(pid = %op.id, channel = op.channel_id, "index operation created"),
                Ok(None) => debug!("index setup abandoned"),
                Err(e) => warn!(error = %e, "index command failed"),
            }
        });
    }

    /// Runs a control button press and answers the callback query.
    pub async fn on_callback(&self, bot: Bot, query: CallbackQuery) {
        let Some(data) = query.data.clone() else {
            return;
        };
        if !ControlPayload::matches(&data) {
            return;
        }
        if !handler::is_admin(&query.from, &self.admins) {
            answer(&bot, &query, ControlReply::silent()).await;
            return;
        }

        let operator = Operator {
            chat_id: query
                .message
                .as_ref()
                .map(|m| m.chat().id.0)
                .unwrap_or_else(|| i64::try_from(query.from.id.0).unwrap_or_default()),
            user_id: i64::try_from(query.from.id.0).unwrap_or_default(),
        };

        let converses = matches!(
            data.parse::<ControlPayload>(),
            Ok(p) if matches!(p.action, ControlAction::Cancel | ControlAction::Modify)
        );
        if converses {
            // Answered up front: the prompt may outlive the query.
            answer(&bot, &query, ControlReply::silent()).await;
            let controls = Arc::clone(&self.controls);
            tokio::spawn(async move {
                controls.handle_callback(&data, operator).await;
            });
            return;
        }

        let reply = self.controls.handle_callback(&data, operator).await;
        answer(&bot, &query, reply).await;
    }
}

async fn answer(bot: &Bot, query: &CallbackQuery, reply: ControlReply) {
    let mut request = bot.answer_callback_query(query.id.clone());
    if !reply.text.is_empty() {
        request = request.text(reply.text).show_alert(reply.alert);
    }
    if let Err(e) = request.await {
        debug!(error = %e, "failed to answer callback query");
    }
}

/// Starts long polling; the dispatcher stops when `cancel` fires.
pub fn spawn_polling(bot: Bot, router: Router, cancel: CancellationToken) -> JoinHandle<()> {
    info!("starting Telegram long polling");

    tokio::spawn(async move {
        let on_message = {
            let router = router.clone();
            move |msg: Message| {
                let router = router.clone();
                async move {
                    router.on_message(msg).await;
                    respond(())
                }
            }
        };
        let on_callback = move |bot: Bot, query: CallbackQuery| {
            let router = router.clone();
            async move {
                router.on_callback(bot, query).await;
                respond(())
            }
        };

        let handler = dptree::entry()
            .branch(Update::filter_message().endpoint(on_message))
            .branch(Update::filter_callback_query().endpoint(on_callback));

        let mut dispatcher = Dispatcher::builder(bot, handler)
            .default_handler(|_| async {})
            .build();

        let shutdown = dispatcher.shutdown_token();
        tokio::spawn(async move {
            cancel.cancelled().await;
            match shutdown.shutdown() {
                Ok(done) => done.await,
                Err(e) => debug!(error = %e, "dispatcher was not running"),
            }
        });

        dispatcher.dispatch().await;
        info!("Telegram long polling stopped");
    })
}

