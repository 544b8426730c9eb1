// SPDX-FileCopyrightText: 2026 Relato Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Relato engine.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Opaque chat identity of a user. Users have no independent lifecycle and
/// are implicitly created on first interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a message sent by a channel adapter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Unique, time-sortable activity identifier: UTC timestamp prefix plus a
/// short random suffix. Generated once at creation, immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivityId(pub String);

impl ActivityId {
    /// Generate a fresh identifier, e.g. `20260825T143502Z_9f3ab1`.
    pub fn generate() -> Self {
        let prefix = Utc::now().format("%Y%m%dT%H%M%SZ");
        let suffix: u32 = rand::thread_rng().gen_range(0..0x100_0000);
        ActivityId(format!("{prefix}_{suffix:06x}"))
    }
}

impl std::fmt::Display for ActivityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a note entered the activity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NoteKind {
    /// Free-standing text message.
    Note,
    /// Text that accompanied a photo in the same message.
    Caption,
}

/// An immutable text entry attached to an activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Originating chat message id; absent for server-synthesized notes.
    pub message_id: Option<i64>,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: NoteKind,
}

/// An immutable photo attachment with optional caption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    /// Storage reference of the persisted file, relative to the store's media root.
    pub filename: String,
    pub caption: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub message_id: Option<i64>,
}

/// One logged unit of work: ordered notes and media, append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub created_at: DateTime<Utc>,
    /// True only during the bounded window after creation with an explicit
    /// "I will send a photo" intent. Once false, never true again.
    pub pending_photo: bool,
    pub notes: Vec<Note>,
    pub media: Vec<Media>,
}

/// A media attachment to be persisted: raw bytes plus metadata.
///
/// The store decides where the bytes land; `filename` is the suggested name
/// from the transport (the store may prefix it for uniqueness).
#[derive(Debug, Clone)]
pub struct NewMedia {
    pub filename: String,
    pub data: Vec<u8>,
    pub caption: Option<String>,
    pub message_id: Option<i64>,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter behind a [`PluginAdapter`](crate::PluginAdapter).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Storage,
}

/// The user's answer to the two-way registration choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterChoice {
    /// Register the held text as a plain-text activity now.
    PlainText,
    /// Create the activity and wait for a photo within the bounded window.
    AwaitPhoto,
}

/// Control commands decoded at the transport boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    List,
}

/// An inbound chat event, decoded once at the transport boundary and matched
/// exhaustively in the correlation engine.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    Text {
        user: UserId,
        message_id: i64,
        text: String,
        reply_to: Option<i64>,
    },
    Photo {
        user: UserId,
        message_id: i64,
        filename: String,
        data: Vec<u8>,
        caption: Option<String>,
        reply_to: Option<i64>,
    },
    /// Result of the user pressing one of the two choice buttons.
    /// `message_id` is the bot's own prompt message (edited in place);
    /// `origin_message_id` keys the held text.
    Choice {
        user: UserId,
        message_id: i64,
        choice: RegisterChoice,
        origin_message_id: i64,
    },
    Command {
        user: UserId,
        message_id: i64,
        command: Command,
    },
}

impl InboundEvent {
    /// The user the event belongs to.
    pub fn user(&self) -> UserId {
        match self {
            InboundEvent::Text { user, .. }
            | InboundEvent::Photo { user, .. }
            | InboundEvent::Choice { user, .. }
            | InboundEvent::Command { user, .. } => *user,
        }
    }
}

/// How an outbound action should be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundKind {
    /// Plain text reply.
    Reply,
    /// Reply that also attaches the persistent quick-action keyboard.
    Menu,
    /// Present the two-way registration choice tied to an origin message.
    Choice { origin_message_id: i64 },
    /// Edit a previously sent prompt message in place.
    Edit { message_id: i64 },
    /// Standalone notification, not tied to any inbound message (timer expiry).
    Notice,
}

/// An outbound action for the channel adapter.
#[derive(Debug, Clone)]
pub struct OutboundAction {
    pub user: UserId,
    pub text: String,
    pub kind: OutboundKind,
}

impl OutboundAction {
    pub fn reply(user: UserId, text: impl Into<String>) -> Self {
        Self { user, text: text.into(), kind: OutboundKind::Reply }
    }

    pub fn menu(user: UserId, text: impl Into<String>) -> Self {
        Self { user, text: text.into(), kind: OutboundKind::Menu }
    }

    pub fn choice(user: UserId, text: impl Into<String>, origin_message_id: i64) -> Self {
        Self {
            user,
            text: text.into(),
            kind: OutboundKind::Choice { origin_message_id },
        }
    }

    pub fn edit(user: UserId, text: impl Into<String>, message_id: i64) -> Self {
        Self {
            user,
            text: text.into(),
            kind: OutboundKind::Edit { message_id },
        }
    }

    pub fn notice(user: UserId, text: impl Into<String>) -> Self {
        Self { user, text: text.into(), kind: OutboundKind::Notice }
    }
}
