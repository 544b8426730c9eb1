// SPDX-FileCopyrightText: 2026 Relato Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Activity, note, and media CRUD operations.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::params;

use relato_core::{Activity, ActivityId, Media, Note, NoteKind, RelatoError, UserId};

use crate::database::Database;
use crate::queries::parse_ts;

/// Insert a new activity (and its initial note, if any) in one transaction.
pub async fn create_activity(
    db: &Database,
    user: UserId,
    id: ActivityId,
    created_at: DateTime<Utc>,
    initial_note: Option<String>,
    pending_photo: bool,
) -> Result<(), RelatoError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            super::users::ensure_user(&tx, user)?;
            tx.execute(
                "INSERT INTO activities (id, user_id, created_at, pending_photo)
                 VALUES (?1, ?2, ?3, ?4)",
                params![id.0, user.0, created_at.to_rfc3339(), pending_photo],
            )?;
            if let Some(text) = initial_note {
                tx.execute(
                    "INSERT INTO notes (activity_id, message_id, text, timestamp, kind)
                     VALUES (?1, NULL, ?2, ?3, 'note')",
                    params![id.0, text, created_at.to_rfc3339()],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Append a note to an existing activity. Returns `false` when the activity
/// does not exist for this user.
pub async fn append_note(
    db: &Database,
    user: UserId,
    activity: ActivityId,
    text: String,
    message_id: Option<i64>,
    kind: NoteKind,
    timestamp: DateTime<Utc>,
) -> Result<bool, RelatoError> {
    db.connection()
        .call(move |conn| {
            if !activity_exists(conn, user, &activity)? {
                return Ok(false);
            }
            conn.execute(
                "INSERT INTO notes (activity_id, message_id, text, timestamp, kind)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    activity.0,
                    message_id,
                    text,
                    timestamp.to_rfc3339(),
                    kind.to_string(),
                ],
            )?;
            Ok(true)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Append a media record and clear `pending_photo` in the same transaction.
/// Returns `false` when the activity does not exist for this user.
pub async fn insert_media(
    db: &Database,
    user: UserId,
    activity: ActivityId,
    media: Media,
) -> Result<bool, RelatoError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            if !activity_exists(&tx, user, &activity)? {
                return Ok(false);
            }
            tx.execute(
                "INSERT INTO media (activity_id, filename, caption, timestamp, message_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    activity.0,
                    media.filename,
                    media.caption,
                    media.timestamp.to_rfc3339(),
                    media.message_id,
                ],
            )?;
            tx.execute(
                "UPDATE activities SET pending_photo = 0 WHERE id = ?1 AND user_id = ?2",
                params![activity.0, user.0],
            )?;
            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch one activity with its notes and media, or `None` if absent.
pub async fn get_activity(
    db: &Database,
    user: UserId,
    activity: ActivityId,
) -> Result<Option<Activity>, RelatoError> {
    db.connection()
        .call(move |conn| Ok(read_activity(conn, user, &activity)?))
        .await
        .map_err(crate::database::map_tr_err)
}

/// All activities for a user, newest first, with notes and media loaded.
pub async fn list_activities(db: &Database, user: UserId) -> Result<Vec<Activity>, RelatoError> {
    db.connection()
        .call(move |conn| {
            let ids: Vec<String> = {
                let mut stmt = conn.prepare(
                    "SELECT id FROM activities WHERE user_id = ?1 ORDER BY created_at DESC, id DESC",
                )?;
                let rows = stmt.query_map(params![user.0], |row| row.get(0))?;
                rows.collect::<Result<_, _>>()?
            };
            let mut activities = Vec::with_capacity(ids.len());
            for id in ids {
                if let Some(activity) = read_activity(conn, user, &ActivityId(id))? {
                    activities.push(activity);
                }
            }
            Ok(activities)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Atomically clear `pending_photo`, returning whether it was set.
pub async fn finalize_pending(
    db: &Database,
    user: UserId,
    activity: ActivityId,
) -> Result<bool, RelatoError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE activities SET pending_photo = 0
                 WHERE id = ?1 AND user_id = ?2 AND pending_photo = 1",
                params![activity.0, user.0],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Clear `pending_photo` everywhere, returning the number of rows cleared.
pub async fn clear_all_pending(db: &Database) -> Result<u64, RelatoError> {
    db.connection()
        .call(|conn| {
            let changed =
                conn.execute("UPDATE activities SET pending_photo = 0 WHERE pending_photo = 1", [])?;
            Ok(changed as u64)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

fn activity_exists(
    conn: &rusqlite::Connection,
    user: UserId,
    activity: &ActivityId,
) -> Result<bool, rusqlite::Error> {
    let found = conn
        .query_row(
            "SELECT 1 FROM activities WHERE id = ?1 AND user_id = ?2",
            params![activity.0, user.0],
            |_| Ok(()),
        )
        .map(|_| true);
    match found {
        Ok(v) => Ok(v),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(false),
        Err(e) => Err(e),
    }
}

fn read_activity(
    conn: &rusqlite::Connection,
    user: UserId,
    activity: &ActivityId,
) -> Result<Option<Activity>, rusqlite::Error> {
    let header = conn.query_row(
        "SELECT id, created_at, pending_photo FROM activities WHERE id = ?1 AND user_id = ?2",
        params![activity.0, user.0],
        |row| {
            let id: String = row.get(0)?;
            let created_at: String = row.get(1)?;
            let pending_photo: bool = row.get(2)?;
            Ok((id, created_at, pending_photo))
        },
    );
    let (id, created_at, pending_photo) = match header {
        Ok(h) => h,
        Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
        Err(e) => return Err(e),
    };
    let created_at = parse_ts(1, created_at)?;

    let mut stmt = conn.prepare(
        "SELECT message_id, text, timestamp, kind FROM notes
         WHERE activity_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![id], |row| {
        let message_id: Option<i64> = row.get(0)?;
        let text: String = row.get(1)?;
        let timestamp: String = row.get(2)?;
        let kind: String = row.get(3)?;
        Ok((message_id, text, timestamp, kind))
    })?;
    let mut notes = Vec::new();
    for row in rows {
        let (message_id, text, timestamp, kind) = row?;
        notes.push(Note {
            message_id,
            text,
            timestamp: parse_ts(2, timestamp)?,
            kind: NoteKind::from_str(&kind).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    3,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?,
        });
    }

    let mut stmt = conn.prepare(
        "SELECT filename, caption, timestamp, message_id FROM media
         WHERE activity_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![id], |row| {
        let filename: String = row.get(0)?;
        let caption: Option<String> = row.get(1)?;
        let timestamp: String = row.get(2)?;
        let message_id: Option<i64> = row.get(3)?;
        Ok((filename, caption, timestamp, message_id))
    })?;
    let mut media = Vec::new();
    for row in rows {
        let (filename, caption, timestamp, message_id) = row?;
        media.push(Media {
            filename,
            caption,
            timestamp: parse_ts(2, timestamp)?,
            message_id,
        });
    }

    Ok(Some(Activity {
        id: ActivityId(id),
        created_at,
        pending_photo,
        notes,
        media,
    }))
}
