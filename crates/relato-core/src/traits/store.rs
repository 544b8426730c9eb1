// SPDX-FileCopyrightText: 2026 Relato Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Activity store trait for persistence backends (SQLite, file tree).

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::RelatoError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Activity, ActivityId, Media, NewMedia, NoteKind, UserId};

/// Persistence contract over activities, their notes, media attachments, and
/// the message-activity index.
///
/// Every mutating operation durably persists before returning; a note/media
/// append and any accompanying flag change commit together or not at all.
/// Implementations may serialize per user but must be safe to call
/// concurrently for different users.
#[async_trait]
pub trait ActivityStore: PluginAdapter {
    /// Initializes the backend (migrations, directory layout, connections).
    async fn initialize(&self) -> Result<(), RelatoError>;

    /// Closes the backend, flushing pending writes.
    async fn close(&self) -> Result<(), RelatoError>;

    /// Allocates a new activity id and persists the activity record.
    ///
    /// When `initial_note` is given it is appended as a [`NoteKind::Note`]
    /// with no originating message id.
    async fn create_activity(
        &self,
        user: UserId,
        initial_note: Option<&str>,
        pending_photo: bool,
    ) -> Result<ActivityId, RelatoError>;

    /// Appends an immutable note.
    ///
    /// Fails with [`RelatoError::ActivityNotFound`] if the activity does not exist.
    async fn append_note(
        &self,
        user: UserId,
        activity: &ActivityId,
        text: &str,
        message_id: Option<i64>,
        kind: NoteKind,
    ) -> Result<(), RelatoError>;

    /// Persists the media bytes and appends the media record, unconditionally
    /// clearing `pending_photo` on the parent activity.
    ///
    /// If metadata persistence fails after the bytes were written, the
    /// orphaned file is removed before the error is returned.
    async fn append_media(
        &self,
        user: UserId,
        activity: &ActivityId,
        media: NewMedia,
    ) -> Result<Media, RelatoError>;

    /// Fails with [`RelatoError::ActivityNotFound`] if absent.
    async fn get_activity(
        &self,
        user: UserId,
        activity: &ActivityId,
    ) -> Result<Activity, RelatoError>;

    /// All activities for a user, ordered by `created_at` descending.
    async fn list_activities(&self, user: UserId) -> Result<Vec<Activity>, RelatoError>;

    /// Atomically clears `pending_photo`, returning whether it was set.
    ///
    /// This is the timer's re-check-before-act primitive: the expiry action
    /// applies only when this returns `true`, which makes the race between a
    /// late photo and a firing timer benign.
    async fn finalize_pending(
        &self,
        user: UserId,
        activity: &ActivityId,
    ) -> Result<bool, RelatoError>;

    /// Clears `pending_photo` on every activity of every user, returning the
    /// number cleared. Used by the startup sweep after a restart, which drops
    /// all armed timers.
    async fn clear_all_pending(&self) -> Result<u64, RelatoError>;

    /// Idempotent upsert of the `(user, message_id) -> activity` link.
    async fn link_message(
        &self,
        user: UserId,
        message_id: i64,
        activity: &ActivityId,
    ) -> Result<(), RelatoError>;

    /// Pure lookup of a message link; no side effect.
    async fn resolve_message(
        &self,
        user: UserId,
        message_id: i64,
    ) -> Result<Option<ActivityId>, RelatoError>;

    /// All users that own at least one activity, for the reporting surface.
    async fn list_users(&self) -> Result<Vec<UserId>, RelatoError>;

    /// Directory under which media files are stored, for read-only serving.
    fn media_root(&self) -> PathBuf;
}
