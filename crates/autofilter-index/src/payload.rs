// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inline control buttons and their callback payloads.
//!
//! Payloads look like `index|<operation_id>_<action>`.

use std::fmt;
use std::str::FromStr;

use autofilter_core::types::InlineButton;
use autofilter_core::{AutofilterError, ControlAction};

/// Callback path shared by every index control.
pub const CALLBACK_PATH: &str = "index";

/// An operator action bound to one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlPayload {
    pub operation_id: String,
    pub action: ControlAction,
}

impl ControlPayload {
    pub fn new(operation_id: impl Into<String>, action: ControlAction) -> Self {
        Self {
            operation_id: operation_id.into(),
            action,
        }
    }

    /// Returns `true` when `data` is addressed to index controls.
    pub fn matches(data: &str) -> bool {
        data.split_once('|')
            .is_some_and(|(path, _)| path == CALLBACK_PATH)
    }
}

impl fmt::Display for ControlPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{CALLBACK_PATH}|{}_{}", self.operation_id, self.action)
    }
}

impl FromStr for ControlPayload {
    type Err = AutofilterError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let invalid = || AutofilterError::InvalidInput(format!("invalid control payload: {data}"));

        let args = data
            .strip_prefix(CALLBACK_PATH)
            .and_then(|rest| rest.strip_prefix('|'))
            .ok_or_else(invalid)?;
        let (operation_id, action) = args.rsplit_once('_').ok_or_else(invalid)?;
        if operation_id.is_empty() {
            return Err(invalid());
        }
        let action = ControlAction::from_str(action).map_err(|_| invalid())?;
        Ok(Self::new(operation_id, action))
    }
}

fn button(text: &str, operation_id: &str, action: ControlAction) -> InlineButton {
    InlineButton::new(text, ControlPayload::new(operation_id, action).to_string())
}

pub fn start_button(operation_id: &str) -> InlineButton {
    button("Start ⚡", operation_id, ControlAction::Start)
}

/// Same action as [`start_button`], labelled for a paused operation.
pub fn resume_button(operation_id: &str) -> InlineButton {
    button("Resume ⏸️", operation_id, ControlAction::Start)
}

pub fn pause_button(operation_id: &str) -> InlineButton {
    button("Pause ⏹️", operation_id, ControlAction::Pause)
}

pub fn cancel_button(operation_id: &str) -> InlineButton {
    button("Cancel ❌", operation_id, ControlAction::Cancel)
}

pub fn modify_button(operation_id: &str) -> InlineButton {
    button("Modify ⚙️", operation_id, ControlAction::Modify)
}
