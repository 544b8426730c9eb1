// SPDX-FileCopyrightText: 2026 Relato Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The activity correlation engine.
//!
//! Given one decoded inbound event, decides which activity it belongs to,
//! performs the store and timer mutations, and returns the outbound actions
//! to deliver. An explicit reply always wins over implicit awaiting state:
//! a reply expresses unambiguous intent that a stale timer-driven
//! expectation must not override.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use relato_core::{
    Activity, ActivityStore, Command, InboundEvent, NewMedia, NoteKind, OutboundAction,
    RegisterChoice, RelatoError, UserId,
};

use crate::messages;
use crate::session::{SessionPhase, UserSession};
use crate::timer::PhotoTimer;

/// How many activities the list command shows.
const LIST_LIMIT: usize = 20;

pub struct CorrelationEngine {
    store: Arc<dyn ActivityStore + Send + Sync>,
    timer: Arc<PhotoTimer>,
    sessions: HashMap<UserId, UserSession>,
    window_secs: u64,
}

impl CorrelationEngine {
    pub fn new(
        store: Arc<dyn ActivityStore + Send + Sync>,
        timer: Arc<PhotoTimer>,
        window_secs: u64,
    ) -> Self {
        Self {
            store,
            timer,
            sessions: HashMap::new(),
            window_secs,
        }
    }

    /// Handle one inbound event, returning the outbound actions to deliver.
    ///
    /// Events for the same user must arrive serialized; the transient session
    /// state is not safe for concurrent mutation.
    pub async fn handle_event(
        &mut self,
        event: InboundEvent,
    ) -> Result<Vec<OutboundAction>, RelatoError> {
        match event {
            InboundEvent::Text {
                user,
                message_id,
                text,
                reply_to,
            } => self.handle_text(user, message_id, text, reply_to).await,
            InboundEvent::Photo {
                user,
                message_id,
                filename,
                data,
                caption,
                reply_to,
            } => {
                self.handle_photo(user, message_id, filename, data, caption, reply_to)
                    .await
            }
            InboundEvent::Choice {
                user,
                message_id,
                choice,
                origin_message_id,
            } => {
                self.handle_choice(user, message_id, choice, origin_message_id)
                    .await
            }
            InboundEvent::Command {
                user,
                message_id: _,
                command,
            } => self.handle_command(user, command).await,
        }
    }

    async fn handle_text(
        &mut self,
        user: UserId,
        message_id: i64,
        text: String,
        reply_to: Option<i64>,
    ) -> Result<Vec<OutboundAction>, RelatoError> {
        // A reply to a message linked to an activity appends there, whatever
        // state the dialogue is in.
        if let Some(replied) = reply_to {
            if let Some(activity) = self.store.resolve_message(user, replied).await? {
                self.store
                    .append_note(user, &activity, &text, Some(message_id), NoteKind::Note)
                    .await?;
                self.store.link_message(user, message_id, &activity).await?;
                debug!(%user, %activity, "reply text appended as note");
                return Ok(vec![OutboundAction::reply(user, messages::NOTE_APPENDED)]);
            }
        }

        if text == messages::NEW_ACTIVITY_PHRASE {
            let session = self.session(user);
            // A second press while the seed is still outstanding.
            if session.phase == SessionPhase::AwaitingSeed {
                return Ok(vec![OutboundAction::reply(user, messages::SEED_PROMPT_REPEAT)]);
            }
            session.phase = SessionPhase::AwaitingSeed;
            return Ok(vec![OutboundAction::reply(user, messages::SEED_PROMPT)]);
        }

        if text == messages::LIST_PHRASE {
            return self.render_listing(user).await;
        }

        // Seed content or any other free-standing text: hold it and offer
        // the two-way choice.
        self.session(user).hold_text(message_id, text);
        Ok(vec![OutboundAction::choice(
            user,
            messages::CHOICE_PROMPT,
            message_id,
        )])
    }

    async fn handle_choice(
        &mut self,
        user: UserId,
        prompt_message_id: i64,
        choice: RegisterChoice,
        origin_message_id: i64,
    ) -> Result<Vec<OutboundAction>, RelatoError> {
        // Consumed-once: a second press of the same button lands here.
        let text = self
            .session(user)
            .take_held(origin_message_id)
            .ok_or(RelatoError::HeldTextNotFound { origin_message_id })?;

        match choice {
            RegisterChoice::PlainText => {
                let activity = self.store.create_activity(user, Some(&text), false).await?;
                self.store
                    .link_message(user, origin_message_id, &activity)
                    .await?;
                self.session(user).phase = SessionPhase::Idle;
                debug!(%user, %activity, "registered plain text activity");
                Ok(vec![OutboundAction::edit(
                    user,
                    messages::registered_text(&activity),
                    prompt_message_id,
                )])
            }
            RegisterChoice::AwaitPhoto => {
                let activity = self.store.create_activity(user, Some(&text), true).await?;
                self.store
                    .link_message(user, origin_message_id, &activity)
                    .await?;
                self.timer.arm(user, activity.clone());
                self.session(user).open_photo_wait(activity.clone());
                debug!(%user, %activity, window_secs = self.window_secs, "photo wait opened");
                Ok(vec![OutboundAction::edit(
                    user,
                    messages::registered_awaiting_photo(&activity, self.window_secs),
                    prompt_message_id,
                )])
            }
        }
    }

    async fn handle_photo(
        &mut self,
        user: UserId,
        message_id: i64,
        filename: String,
        data: Vec<u8>,
        caption: Option<String>,
        reply_to: Option<i64>,
    ) -> Result<Vec<OutboundAction>, RelatoError> {
        let media = NewMedia {
            filename,
            data,
            caption,
            message_id: Some(message_id),
        };

        // Priority 1: explicit reply target.
        if let Some(replied) = reply_to {
            if let Some(activity) = self.store.resolve_message(user, replied).await? {
                self.store.append_media(user, &activity, media).await?;
                self.store.link_message(user, message_id, &activity).await?;
                // Only tear down the wait when the reply hit the activity it
                // was armed for.
                self.timer.cancel_if(user, &activity);
                let session = self.session(user);
                if session.awaiting_photo.as_ref() == Some(&activity) {
                    session.close_photo_wait();
                }
                debug!(%user, %activity, "reply photo attached");
                return Ok(vec![OutboundAction::reply(user, messages::PHOTO_APPENDED)]);
            }
        }

        // Priority 2: an open photo wait.
        if let Some(activity) = self.session(user).awaiting_photo.clone() {
            self.store.append_media(user, &activity, media).await?;
            self.store.link_message(user, message_id, &activity).await?;
            self.timer.cancel_if(user, &activity);
            self.session(user).close_photo_wait();
            debug!(%user, %activity, "awaited photo attached");
            return Ok(vec![OutboundAction::reply(user, messages::PHOTO_APPENDED)]);
        }

        // Priority 3: a free-standing photo becomes its own activity.
        let activity = self.store.create_activity(user, None, false).await?;
        self.store.append_media(user, &activity, media).await?;
        self.store.link_message(user, message_id, &activity).await?;
        debug!(%user, %activity, "photo created new activity");
        Ok(vec![OutboundAction::reply(
            user,
            messages::registered_photo(&activity),
        )])
    }

    async fn handle_command(
        &mut self,
        user: UserId,
        command: Command,
    ) -> Result<Vec<OutboundAction>, RelatoError> {
        match command {
            Command::Start => Ok(vec![OutboundAction::menu(user, messages::GREETING)]),
            Command::Help => Ok(vec![OutboundAction::reply(user, messages::HELP)]),
            Command::List => self.render_listing(user).await,
        }
    }

    async fn render_listing(&mut self, user: UserId) -> Result<Vec<OutboundAction>, RelatoError> {
        let activities = self.store.list_activities(user).await?;
        if activities.is_empty() {
            return Ok(vec![OutboundAction::reply(user, messages::NO_ACTIVITIES)]);
        }
        let mut lines = vec![format!("📋 Últimos registros ({}):", activities.len())];
        for activity in activities.iter().take(LIST_LIMIT) {
            lines.push(summarize(activity));
        }
        Ok(vec![OutboundAction::reply(user, lines.join("\n"))])
    }

    fn session(&mut self, user: UserId) -> &mut UserSession {
        self.sessions.entry(user).or_default()
    }
}

/// One listing line: timestamp, first note (or a photo marker), counters.
fn summarize(activity: &Activity) -> String {
    let when = activity.created_at.format("%d/%m/%Y %H:%M");
    let title = activity
        .notes
        .first()
        .map(|n| n.text.as_str())
        .unwrap_or("(somente foto)");
    let pending = if activity.pending_photo { " ⏳" } else { "" };
    format!(
        "• {when} — {title} [{} nota(s), {} foto(s)]{pending}",
        activity.notes.len(),
        activity.media.len(),
    )
}
