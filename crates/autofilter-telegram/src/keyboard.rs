// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion of [`Markup`] into Bot API keyboards.

use autofilter_core::Markup;
use autofilter_core::types::InlineButton;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup, KeyboardRemove,
    ReplyMarkup,
};

/// Keyboard to attach to a new message, if any.
pub fn reply_markup(markup: &Markup) -> Option<ReplyMarkup> {
    match markup {
        Markup::None => None,
        Markup::Inline(rows) => Some(ReplyMarkup::InlineKeyboard(inline_keyboard(rows))),
        Markup::Choices(choices) => Some(ReplyMarkup::Keyboard(
            KeyboardMarkup::new([choices.iter().map(|c| KeyboardButton::new(c.as_str()))])
                .resize_keyboard()
                .one_time_keyboard(),
        )),
        Markup::RemoveKeyboard => Some(ReplyMarkup::KeyboardRemove(KeyboardRemove::new())),
    }
}

/// Rows of callback buttons.
pub fn inline_keyboard(rows: &[Vec<InlineButton>]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(rows.iter().map(|row| {
        row.iter()
            .map(|b| InlineKeyboardButton::callback(b.text.as_str(), b.callback_data.as_str()))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;

    #[test]
    fn no_markup_attaches_nothing() {
        assert!(reply_markup(&Markup::None).is_none());
    }

    #[test]
    fn inline_rows_keep_order_and_data() {
        let markup = Markup::Inline(vec![vec![
            InlineButton::new("Pause ⏹️", "index|Ab12Cd_p"),
            InlineButton::new("Cancel ❌", "index|Ab12Cd_c"),
        ]]);
        let Some(ReplyMarkup::InlineKeyboard(kb)) = reply_markup(&markup) else {
            panic!("expected an inline keyboard");
        };
        assert_eq!(kb.inline_keyboard.len(), 1);
        let row = &kb.inline_keyboard[0];
        assert_eq!(row[0].text, "Pause ⏹️");
        assert_eq!(
            row[1].kind,
            InlineKeyboardButtonKind::CallbackData("index|Ab12Cd_c".into())
        );
    }

    #[test]
    fn choices_become_one_reply_row() {
        let markup = Markup::Choices(vec!["Yes".into(), "No".into()]);
        let Some(ReplyMarkup::Keyboard(kb)) = reply_markup(&markup) else {
            panic!("expected a reply keyboard");
        };
        let texts: Vec<&str> = kb.keyboard[0].iter().map(|b| b.text.as_str()).collect();
        assert_eq!(texts, ["Yes", "No"]);
    }

    #[test]
    fn remove_keyboard() {
        assert!(matches!(
            reply_markup(&Markup::RemoveKeyboard),
            Some(ReplyMarkup::KeyboardRemove(_))
        ));
    }
}
