// SPDX-FileCopyrightText: 2026 Relato Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Update decoding, authorization filtering, and callback payload parsing.
//!
//! Telegram updates are decoded once here into tagged [`InboundEvent`]s;
//! the correlation engine never sees platform types.

use teloxide::prelude::*;
use teloxide::types::ChatKind;
use tracing::debug;

use relato_core::{Command, InboundEvent, RegisterChoice, RelatoError, UserId};

use crate::media;

/// Callback payload tag for the "register as plain text" button.
pub const CALLBACK_PLAIN_TEXT: &str = "register_text";

/// Callback payload tag for the "I will send a photo" button.
pub const CALLBACK_AWAIT_PHOTO: &str = "await_photo";

/// Checks whether the message sender is authorized.
///
/// Authorization passes if the sender's user ID (as string) or username
/// matches any entry in the `allowed_users` list. If `allowed_users` is
/// empty, all messages are rejected (secure default).
///
/// Messages without a sender (e.g., channel posts) always return `false`.
pub fn is_authorized(msg: &Message, allowed_users: &[String]) -> bool {
    match msg.from.as_ref() {
        Some(user) => is_user_allowed(user, allowed_users),
        None => false,
    }
}

/// Same authorization rule for the sender of a callback query.
pub fn is_user_allowed(user: &teloxide::types::User, allowed_users: &[String]) -> bool {
    if allowed_users.is_empty() {
        return false;
    }

    let user_id_str = user.id.0.to_string();
    for allowed in allowed_users {
        if *allowed == user_id_str {
            return true;
        }
        if let Some(ref username) = user.username {
            let allowed_clean = allowed.strip_prefix('@').unwrap_or(allowed);
            if username.eq_ignore_ascii_case(allowed_clean) {
                return true;
            }
        }
    }

    false
}

/// Checks whether the message is from a private (DM) chat.
///
/// Group, supergroup, and channel messages return `false`.
pub fn is_dm(msg: &Message) -> bool {
    matches!(msg.chat.kind, ChatKind::Private(_))
}

/// Decodes a Telegram message into an [`InboundEvent`].
///
/// Handles commands, text, and photos. Returns `None` for unsupported
/// message types (stickers, locations, voice, etc.).
pub async fn decode_message(bot: &Bot, msg: &Message) -> Result<Option<InboundEvent>, RelatoError> {
    let user = match msg.from.as_ref() {
        Some(u) => UserId(u.id.0 as i64),
        None => return Ok(None),
    };
    let message_id = i64::from(msg.id.0);
    let reply_to = msg.reply_to_message().map(|m| i64::from(m.id.0));

    if let Some(text) = msg.text() {
        if let Some(command) = parse_command(text) {
            return Ok(Some(InboundEvent::Command {
                user,
                message_id,
                command,
            }));
        }
        return Ok(Some(InboundEvent::Text {
            user,
            message_id,
            text: text.to_string(),
            reply_to,
        }));
    }

    if let Some(photos) = msg.photo() {
        let (filename, data) = media::download_photo(bot, photos).await?;
        return Ok(Some(InboundEvent::Photo {
            user,
            message_id,
            filename,
            data,
            caption: msg.caption().map(str::to_owned),
            reply_to,
        }));
    }

    debug!(msg_id = msg.id.0, "ignoring unsupported message type");
    Ok(None)
}

/// Decodes a callback query into a [`InboundEvent::Choice`].
///
/// Returns `None` for malformed payloads or queries without an attached
/// prompt message.
pub fn decode_callback(q: &CallbackQuery) -> Option<InboundEvent> {
    let data = q.data.as_deref()?;
    let (choice, origin_message_id) = parse_choice_payload(data)?;
    let prompt_id = q.message.as_ref().map(|m| i64::from(m.id().0))?;
    Some(InboundEvent::Choice {
        user: UserId(q.from.id.0 as i64),
        message_id: prompt_id,
        choice,
        origin_message_id,
    })
}

/// Parse a `<tag>|<origin message id>` choice payload.
pub fn parse_choice_payload(data: &str) -> Option<(RegisterChoice, i64)> {
    let (tag, origin) = data.split_once('|')?;
    let origin = origin.parse().ok()?;
    let choice = match tag {
        CALLBACK_PLAIN_TEXT => RegisterChoice::PlainText,
        CALLBACK_AWAIT_PHOTO => RegisterChoice::AwaitPhoto,
        _ => return None,
    };
    Some((choice, origin))
}

fn parse_command(text: &str) -> Option<Command> {
    // Commands may carry the bot mention suffix, e.g. "/start@relato_bot".
    let first_word = text.split_whitespace().next()?;
    let command = first_word.split('@').next()?;
    match command {
        "/start" => Some(Command::Start),
        "/help" => Some(Command::Help),
        "/list" => Some(Command::List),
        _ => None,
    }
}
