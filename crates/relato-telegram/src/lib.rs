// SPDX-FileCopyrightText: 2026 Relato Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram channel adapter for the Relato activity logger.
//!
//! Implements [`ChannelAdapter`] for the Telegram Bot API via teloxide:
//! long polling for messages and callback queries, photo downloads, the
//! persistent quick-action keyboard, and the inline two-way choice prompt.

pub mod handler;
pub mod media;

use std::sync::Arc;

use async_trait::async_trait;
use teloxide::dptree;
use teloxide::prelude::*;
use teloxide::types::{
    ChatId, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup, Recipient,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use relato_config::model::TelegramConfig;
use relato_core::traits::{ChannelAdapter, ChannelCapabilities, PluginAdapter};
use relato_core::{
    AdapterType, HealthStatus, InboundEvent, MessageId, OutboundAction, OutboundKind, RelatoError,
};
use relato_engine::messages;

/// Telegram channel adapter implementing [`ChannelAdapter`].
///
/// Connects to Telegram via long polling, filters updates by authorization
/// and chat type, decodes them into [`InboundEvent`]s, and delivers
/// [`OutboundAction`]s with the appropriate keyboards.
pub struct TelegramChannel {
    bot: Bot,
    config: TelegramConfig,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<InboundEvent>>,
    inbound_tx: mpsc::Sender<InboundEvent>,
    polling_handle: Option<tokio::task::JoinHandle<()>>,
}

impl TelegramChannel {
    /// Creates a new Telegram channel adapter.
    ///
    /// Requires `config.bot_token` to be set.
    pub fn new(config: TelegramConfig) -> Result<Self, RelatoError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            RelatoError::Config("telegram.bot_token is required for Telegram adapter".into())
        })?;

        if token.is_empty() {
            return Err(RelatoError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }

        let bot = Bot::new(token);
        let (inbound_tx, inbound_rx) = mpsc::channel(100);

        Ok(Self {
            bot,
            config,
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            inbound_tx,
            polling_handle: None,
        })
    }

    /// Returns a reference to the underlying teloxide Bot.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

#[async_trait]
impl PluginAdapter for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, RelatoError> {
        // Check if the bot token is valid by calling getMe.
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), RelatoError> {
        debug!("Telegram channel shutting down");
        // The polling handle will be dropped when TelegramChannel is dropped,
        // which aborts the task. For graceful shutdown, the engine loop should
        // stop calling receive() first.
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for TelegramChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_edit: true,
            supports_choice: true,
            supports_photos: true,
            max_message_length: Some(4096),
        }
    }

    async fn connect(&mut self) -> Result<(), RelatoError> {
        if self.polling_handle.is_some() {
            return Ok(()); // Already connected
        }

        let bot = self.bot.clone();
        let allowed_users: Arc<Vec<String>> = Arc::new(self.config.allowed_users.clone());

        info!("starting Telegram long polling");

        let message_tx = self.inbound_tx.clone();
        let message_allowed = allowed_users.clone();
        let message_branch = Update::filter_message().endpoint(move |bot: Bot, msg: Message| {
            let tx = message_tx.clone();
            let allowed = message_allowed.clone();
            async move {
                if !handler::is_dm(&msg) {
                    debug!(chat_id = msg.chat.id.0, "ignoring non-DM message");
                    return respond(());
                }
                if !handler::is_authorized(&msg, &allowed) {
                    debug!(chat_id = msg.chat.id.0, "ignoring unauthorized user");
                    return respond(());
                }

                match handler::decode_message(&bot, &msg).await {
                    Ok(Some(event)) => {
                        if tx.send(event).await.is_err() {
                            warn!("inbound channel closed, dropping message");
                        }
                    }
                    Ok(None) => {
                        debug!(msg_id = msg.id.0, "ignoring unsupported message type");
                    }
                    Err(e) => {
                        error!(error = %e, "failed to decode message");
                    }
                }

                respond(())
            }
        });

        let callback_tx = self.inbound_tx.clone();
        let callback_allowed = allowed_users.clone();
        let callback_branch =
            Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
                let tx = callback_tx.clone();
                let allowed = callback_allowed.clone();
                async move {
                    // Always acknowledge so the button stops spinning.
                    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
                        debug!(error = %e, "failed to answer callback query");
                    }

                    if !handler::is_user_allowed(&q.from, &allowed) {
                        debug!(user_id = q.from.id.0, "ignoring unauthorized callback");
                        return respond(());
                    }

                    match handler::decode_callback(&q) {
                        Some(event) => {
                            if tx.send(event).await.is_err() {
                                warn!("inbound channel closed, dropping callback");
                            }
                        }
                        None => {
                            debug!(data = ?q.data, "ignoring malformed callback payload");
                        }
                    }

                    respond(())
                }
            });

        let handle = tokio::spawn(async move {
            Dispatcher::builder(
                bot,
                dptree::entry().branch(message_branch).branch(callback_branch),
            )
            .default_handler(|_| async {}) // Silently ignore other update kinds
            .build()
            .dispatch()
            .await;
        });

        self.polling_handle = Some(handle);
        Ok(())
    }

    async fn send(&self, action: OutboundAction) -> Result<MessageId, RelatoError> {
        let chat = Recipient::Id(ChatId(action.user.0));
        let sent = match action.kind {
            OutboundKind::Reply | OutboundKind::Notice => self
                .bot
                .send_message(chat, &action.text)
                .await
                .map_err(map_send_err)?,
            OutboundKind::Menu => self
                .bot
                .send_message(chat, &action.text)
                .reply_markup(quick_action_keyboard())
                .await
                .map_err(map_send_err)?,
            OutboundKind::Choice { origin_message_id } => self
                .bot
                .send_message(chat, &action.text)
                .reply_markup(choice_keyboard(origin_message_id))
                .await
                .map_err(map_send_err)?,
            OutboundKind::Edit { message_id } => {
                let msg_id = teloxide::types::MessageId(message_id as i32);
                let result = self
                    .bot
                    .edit_message_text(ChatId(action.user.0), msg_id, &action.text)
                    .await;
                match result {
                    Ok(edited) => edited,
                    Err(e) if e.to_string().contains("message is not modified") => {
                        return Ok(MessageId(message_id.to_string()));
                    }
                    Err(e) => return Err(map_send_err(e)),
                }
            }
        };
        Ok(MessageId(sent.id.0.to_string()))
    }

    async fn receive(&self) -> Result<InboundEvent, RelatoError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await.ok_or_else(|| RelatoError::Channel {
            message: "Telegram inbound channel closed".into(),
            source: None,
        })
    }
}

fn map_send_err(e: teloxide::RequestError) -> RelatoError {
    RelatoError::Channel {
        message: format!("failed to send message: {e}"),
        source: Some(Box::new(e)),
    }
}

/// The persistent two-button quick-action keyboard.
fn quick_action_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new([[
        KeyboardButton::new(messages::NEW_ACTIVITY_PHRASE),
        KeyboardButton::new(messages::LIST_PHRASE),
    ]])
    .resize_keyboard()
}

/// The inline two-way registration choice tied to the origin message.
fn choice_keyboard(origin_message_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([[
        InlineKeyboardButton::callback(
            "📝 Apenas texto",
            format!("{}|{origin_message_id}", handler::CALLBACK_PLAIN_TEXT),
        ),
        InlineKeyboardButton::callback(
            "📷 Vou enviar foto",
            format!("{}|{origin_message_id}", handler::CALLBACK_AWAIT_PHOTO),
        ),
    ]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_requires_bot_token() {
        let config = TelegramConfig {
            bot_token: None,
            allowed_users: vec![],
        };
        assert!(TelegramChannel::new(config).is_err());
    }

    #[test]
    fn new_rejects_empty_token() {
        let config = TelegramConfig {
            bot_token: Some(String::new()),
            allowed_users: vec![],
        };
        assert!(TelegramChannel::new(config).is_err());
    }

    #[test]
    fn new_accepts_valid_token() {
        let config = TelegramConfig {
            bot_token: Some("123456:ABC-DEF1234ghIkl-zyx57W2v1u123ew11".into()),
            allowed_users: vec!["user1".into()],
        };
        assert!(TelegramChannel::new(config).is_ok());
    }

    #[test]
    fn capabilities_are_correct() {
        let config = TelegramConfig {
            bot_token: Some("test:token".into()),
            allowed_users: vec![],
        };
        let channel = TelegramChannel::new(config).unwrap();
        let caps = channel.capabilities();
        assert!(caps.supports_edit);
        assert!(caps.supports_choice);
        assert!(caps.supports_photos);
        assert_eq!(caps.max_message_length, Some(4096));
    }

    #[test]
    fn choice_keyboard_encodes_origin_message_id() {
        let markup = choice_keyboard(42);
        let buttons: Vec<_> = markup.inline_keyboard.iter().flatten().collect();
        assert_eq!(buttons.len(), 2);
        for button in buttons {
            match &button.kind {
                teloxide::types::InlineKeyboardButtonKind::CallbackData(data) => {
                    let parsed = handler::parse_choice_payload(data);
                    assert!(matches!(parsed, Some((_, 42))));
                }
                other => panic!("expected callback button, got {other:?}"),
            }
        }
    }

    #[test]
    fn plugin_adapter_metadata() {
        let config = TelegramConfig {
            bot_token: Some("test:token".into()),
            allowed_users: vec![],
        };
        let channel = TelegramChannel::new(config).unwrap();
        assert_eq!(channel.name(), "telegram");
        assert_eq!(channel.version(), semver::Version::new(0, 1, 0));
        assert_eq!(channel.adapter_type(), AdapterType::Channel);
    }
}
