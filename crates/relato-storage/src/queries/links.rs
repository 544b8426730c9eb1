// SPDX-FileCopyrightText: 2026 Relato Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `(user, message_id) -> activity` correlation index.

use rusqlite::params;

use relato_core::{ActivityId, RelatoError, UserId};

use crate::database::Database;

/// Idempotent upsert of a message link.
pub async fn link_message(
    db: &Database,
    user: UserId,
    message_id: i64,
    activity: ActivityId,
) -> Result<(), RelatoError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO message_links (user_id, message_id, activity_id)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT (user_id, message_id) DO UPDATE SET activity_id = excluded.activity_id",
                params![user.0, message_id, activity.0],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Pure lookup of a message link.
pub async fn resolve_message(
    db: &Database,
    user: UserId,
    message_id: i64,
) -> Result<Option<ActivityId>, RelatoError> {
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT activity_id FROM message_links WHERE user_id = ?1 AND message_id = ?2",
                params![user.0, message_id],
                |row| row.get::<_, String>(0),
            );
            match result {
                Ok(id) => Ok(Some(ActivityId(id))),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}
