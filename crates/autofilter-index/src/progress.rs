// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator-facing texts for an index operation: overview, start and stop
//! notices, and the periodic progress block with its bar and ETA.

use std::time::Duration;

use chrono::{DateTime, Utc};

use autofilter_core::types::message_link;
use autofilter_core::{Markup, Operation, OutboundMessage};

use crate::payload::{
    cancel_button, modify_button, pause_button, resume_button, start_button,
};

/// Number of blocks in the progress bar.
pub const BAR_LENGTH: usize = 25;

const TIMESTAMP_FORMAT: &str = "%b %d %H:%M:%S UTC";

/// Where a run stands when its progress message is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Paused,
    Completed,
    Cancelled,
}

impl RunState {
    fn suffix(self) -> &'static str {
        match self {
            RunState::Running => "\n<b>Index in Progress ⚡️</b>",
            RunState::Paused => "\n<b>Index Operation Paused ▶️</b>",
            RunState::Completed => "\n<b>Index Operation Completed 🎉</b>",
            RunState::Cancelled => "\n<b>Index Operation Cancelled 🚫</b>",
        }
    }

    fn markup(self, operation_id: &str) -> Markup {
        match self {
            RunState::Running => Markup::Inline(vec![vec![
                pause_button(operation_id),
                cancel_button(operation_id),
            ]]),
            RunState::Paused => Markup::Inline(vec![vec![
                resume_button(operation_id),
                modify_button(operation_id),
                cancel_button(operation_id),
            ]]),
            RunState::Completed | RunState::Cancelled => Markup::None,
        }
    }
}

/// Throughput reference for one run: the checkpoint it started from and how
/// long it has been going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunClock {
    pub run_start_id: i64,
    pub elapsed: Duration,
}

/// First message a run sends; it becomes the progress message.
pub fn start_text(op: &Operation) -> String {
    let verb = if op.current_id == op.start_id {
        "Starting"
    } else {
        "Resuming"
    };
    format!(
        "{verb} index from {} at {} to {} ...",
        op.start_id, op.current_id, op.end_id
    )
}

/// Notice sent when a run stops on an unrecoverable failure. `step` names
/// what could not be done, e.g. `"Get Chat"`.
pub fn stop_notice(op: &Operation, step: &str) -> OutboundMessage {
    OutboundMessage::new(
        op.progress_chat_id,
        format!("🛑 Index Stopped: Unable to {step}."),
    )
    .with_markup(Markup::Inline(vec![vec![resume_button(&op.id)]]))
}

/// Placeholder sent while an operation is being created.
pub const SETTING_UP_TEXT: &str = "<code>Setting Up Index Operation ...</code>";

/// Overview shown for a freshly created operation, with its controls.
pub fn overview(op: &Operation) -> OutboundMessage {
    let text = format!(
        "<b><u>Index Operation Overview</u></b>\n\n\
         <b>Channel</b>: <code>{}</code>\n\
         <b>Start</b>: <a href='{}'>{}</a>\n\
         <b>End</b>: <a href='{}'>{}</a>\n\
         <b>Total Messages</b>: {}",
        op.channel_id,
        message_link(op.channel_id, op.start_id),
        op.start_id,
        message_link(op.channel_id, op.end_id),
        op.end_id,
        op.end_id - op.start_id,
    );
    OutboundMessage::new(op.progress_chat_id, text).with_markup(Markup::Inline(vec![vec![
        cancel_button(&op.id),
        modify_button(&op.id),
        start_button(&op.id),
    ]]))
}

/// Full progress message for `op` in `state`.
pub fn render(op: &Operation, state: RunState, clock: RunClock, now: DateTime<Utc>) -> OutboundMessage {
    let mut text = progress_text(op, clock, now);
    text.push_str(state.suffix());
    OutboundMessage::new(op.progress_chat_id, text).with_markup(state.markup(&op.id))
}

/// The progress block: bar, counters, ETA, id, timestamp and a link to the
/// last indexed message.
pub fn progress_text(op: &Operation, clock: RunClock, now: DateTime<Utc>) -> String {
    format!(
        "\n{}\n\n\
         <b>Saved :</b>   {}\n\
         <b>Failed :</b>  {}\n\
         <b>ETA :</b>     {}\n\
         <b>PID :</b> <code>{}</code>\n\
         <b>Last Update :</b> {}\n\n\
         <a href='{}'><i><b>Last Indexed Message</b></i></a>\n",
        progress_bar(op.start_id, op.current_id, op.end_id),
        op.saved,
        op.failed,
        eta(clock.run_start_id, op.current_id, op.end_id, clock.elapsed),
        op.id,
        now.format(TIMESTAMP_FORMAT),
        message_link(op.channel_id, op.current_id),
    )
}

/// Block bar of the whole range, then percentage and position.
pub fn progress_bar(start_id: i64, current_id: i64, end_id: i64) -> String {
    let done = current_id - start_id;
    let total = end_id - start_id;
    let progress = if total <= 0 {
        1.0
    } else {
        done as f64 / total as f64
    };
    let filled = ((progress * BAR_LENGTH as f64) as usize).min(BAR_LENGTH);

    let mut bar = String::with_capacity(BAR_LENGTH * 3 + 64);
    bar.extend(std::iter::repeat_n('█', filled));
    bar.extend(std::iter::repeat_n('░', BAR_LENGTH - filled));
    bar.push_str(&format!(
        "\n  <code>{:.2}%</code> | <code>{done}</code><b>/</b><code>{total}</code>",
        progress * 100.0
    ));
    bar
}

/// Remaining time at the run's observed rate, as `HHh MMm SSs`.
pub fn eta(run_start_id: i64, current_id: i64, end_id: i64, elapsed: Duration) -> String {
    let completed = (current_id - run_start_id).max(1);
    let elapsed = elapsed.as_secs_f64().max(1.0);

    let rate = completed as f64 / elapsed;
    let remaining = ((end_id - current_id).max(0) as f64 / rate) as u64;

    format!(
        "{:02}<b>h</b> {:02}<b>m</b> {:02}<b>s</b>",
        remaining / 3600,
        (remaining / 60) % 60,
        remaining % 60
    )
}
