// SPDX-FileCopyrightText: 2026 Relato Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User rows. Users have no independent lifecycle; a row is upserted the
//! first time a user creates an activity.

use rusqlite::params;

use relato_core::{RelatoError, UserId};

use crate::database::Database;

/// Upsert a user row. Safe to call on every interaction.
pub(crate) fn ensure_user(conn: &rusqlite::Connection, user: UserId) -> Result<(), rusqlite::Error> {
    conn.execute("INSERT OR IGNORE INTO users (id) VALUES (?1)", params![user.0])?;
    Ok(())
}

/// All users that own at least one activity, ascending by id.
pub async fn list_users(db: &Database) -> Result<Vec<UserId>, RelatoError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT u.id FROM users u
                 JOIN activities a ON a.user_id = u.id
                 ORDER BY u.id",
            )?;
            let rows = stmt.query_map([], |row| Ok(UserId(row.get(0)?)))?;
            let mut users = Vec::new();
            for row in rows {
                users.push(row?);
            }
            Ok(users)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
