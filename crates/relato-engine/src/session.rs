// SPDX-FileCopyrightText: 2026 Relato Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user transient session state.
//!
//! Sessions are not persisted: a process restart drops all held texts and
//! await modes, and the startup sweep clears the matching `pending_photo`
//! flags in the store.

use std::collections::HashMap;

use relato_core::ActivityId;

/// Where a user currently stands in the registration dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// No dialogue in progress.
    #[default]
    Idle,
    /// The user pressed "new activity"; the next text is the seed content.
    AwaitingSeed,
    /// A text is held and the two-way choice prompt is open.
    AwaitingChoice,
    /// An activity with `pending_photo` was created; the next photo attaches to it.
    AwaitingPhoto,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionPhase::Idle => "idle",
            SessionPhase::AwaitingSeed => "awaiting-seed",
            SessionPhase::AwaitingChoice => "awaiting-choice",
            SessionPhase::AwaitingPhoto => "awaiting-photo",
        };
        f.write_str(s)
    }
}

/// Transient state for one user, created on first event.
///
/// Held texts are keyed by the message id that carried them and are consumed
/// exactly once when a choice arrives. Exactly one photo wait may be open
/// per user at a time.
#[derive(Debug, Default)]
pub struct UserSession {
    pub phase: SessionPhase,
    held_texts: HashMap<i64, String>,
    pub awaiting_photo: Option<ActivityId>,
}

impl UserSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold a text body until the user answers the choice prompt.
    pub fn hold_text(&mut self, message_id: i64, text: String) {
        self.held_texts.insert(message_id, text);
        self.phase = SessionPhase::AwaitingChoice;
    }

    /// Consume a held text. Returns `None` when it was already consumed or
    /// the process restarted since the prompt was shown.
    pub fn take_held(&mut self, origin_message_id: i64) -> Option<String> {
        self.held_texts.remove(&origin_message_id)
    }

    /// Open the photo wait for `activity`, replacing any previous wait.
    pub fn open_photo_wait(&mut self, activity: ActivityId) {
        self.awaiting_photo = Some(activity);
        self.phase = SessionPhase::AwaitingPhoto;
    }

    /// Close the photo wait and return to idle.
    pub fn close_photo_wait(&mut self) {
        self.awaiting_photo = None;
        self.phase = SessionPhase::Idle;
    }
}
