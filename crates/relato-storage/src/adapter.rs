// SPDX-FileCopyrightText: 2026 Relato Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the ActivityStore trait.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use relato_config::model::StorageConfig;
use relato_core::{
    Activity, ActivityId, ActivityStore, AdapterType, HealthStatus, Media, NewMedia, NoteKind,
    PluginAdapter, RelatoError, UserId,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed activity store.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. Media bytes live on the filesystem under
/// `data_dir/<user_id>/`; only their relative paths go into the database.
/// The database is lazily initialized on the first call to
/// [`ActivityStore::initialize`].
pub struct SqliteStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given configuration.
    ///
    /// The database connection is not opened until [`ActivityStore::initialize`]
    /// is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    fn db(&self) -> Result<&Database, RelatoError> {
        self.db.get().ok_or_else(|| RelatoError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, RelatoError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| {
                conn.query_row("SELECT 1", [], |_| Ok(()))?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RelatoError> {
        if let Some(db) = self.db.get() {
            db.close().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl ActivityStore for SqliteStore {
    async fn initialize(&self) -> Result<(), RelatoError> {
        let db = Database::open(&self.config.database_path).await?;
        self.db.set(db).map_err(|_| RelatoError::Storage {
            source: "storage already initialized".into(),
        })?;
        tokio::fs::create_dir_all(&self.config.data_dir)
            .await
            .map_err(RelatoError::storage)?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), RelatoError> {
        self.db()?.close().await
    }

    async fn create_activity(
        &self,
        user: UserId,
        initial_note: Option<&str>,
        pending_photo: bool,
    ) -> Result<ActivityId, RelatoError> {
        let id = ActivityId::generate();
        queries::activities::create_activity(
            self.db()?,
            user,
            id.clone(),
            Utc::now(),
            initial_note.map(str::to_owned),
            pending_photo,
        )
        .await?;
        debug!(%user, activity = %id, pending_photo, "activity created");
        Ok(id)
    }

    async fn append_note(
        &self,
        user: UserId,
        activity: &ActivityId,
        text: &str,
        message_id: Option<i64>,
        kind: NoteKind,
    ) -> Result<(), RelatoError> {
        let found = queries::activities::append_note(
            self.db()?,
            user,
            activity.clone(),
            text.to_owned(),
            message_id,
            kind,
            Utc::now(),
        )
        .await?;
        if !found {
            return Err(RelatoError::ActivityNotFound {
                id: activity.0.clone(),
            });
        }
        Ok(())
    }

    async fn append_media(
        &self,
        user: UserId,
        activity: &ActivityId,
        media: NewMedia,
    ) -> Result<Media, RelatoError> {
        let db = self.db()?;

        // Prefix with the activity id so transport filenames cannot collide
        // across activities of the same user.
        let relative = format!("{}/{}_{}", user.0, activity.0, media.filename);
        let path = self.media_root().join(&relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(RelatoError::storage)?;
        }
        tokio::fs::write(&path, &media.data)
            .await
            .map_err(RelatoError::storage)?;

        let record = Media {
            filename: relative,
            caption: media.caption,
            timestamp: Utc::now(),
            message_id: media.message_id,
        };
        let result =
            queries::activities::insert_media(db, user, activity.clone(), record.clone()).await;

        // Bytes are written before the metadata commits; remove the orphan
        // when the commit did not happen.
        let failed = !matches!(result, Ok(true));
        if failed {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %e, "failed to remove orphaned media file");
            }
        }
        match result {
            Ok(true) => Ok(record),
            Ok(false) => Err(RelatoError::ActivityNotFound {
                id: activity.0.clone(),
            }),
            Err(e) => Err(e),
        }
    }

    async fn get_activity(
        &self,
        user: UserId,
        activity: &ActivityId,
    ) -> Result<Activity, RelatoError> {
        queries::activities::get_activity(self.db()?, user, activity.clone())
            .await?
            .ok_or_else(|| RelatoError::ActivityNotFound {
                id: activity.0.clone(),
            })
    }

    async fn list_activities(&self, user: UserId) -> Result<Vec<Activity>, RelatoError> {
        queries::activities::list_activities(self.db()?, user).await
    }

    async fn finalize_pending(
        &self,
        user: UserId,
        activity: &ActivityId,
    ) -> Result<bool, RelatoError> {
        queries::activities::finalize_pending(self.db()?, user, activity.clone()).await
    }

    async fn clear_all_pending(&self) -> Result<u64, RelatoError> {
        queries::activities::clear_all_pending(self.db()?).await
    }

    async fn link_message(
        &self,
        user: UserId,
        message_id: i64,
        activity: &ActivityId,
    ) -> Result<(), RelatoError> {
        queries::links::link_message(self.db()?, user, message_id, activity.clone()).await
    }

    async fn resolve_message(
        &self,
        user: UserId,
        message_id: i64,
    ) -> Result<Option<ActivityId>, RelatoError> {
        queries::links::resolve_message(self.db()?, user, message_id).await
    }

    async fn list_users(&self) -> Result<Vec<UserId>, RelatoError> {
        queries::users::list_users(self.db()?).await
    }

    fn media_root(&self) -> PathBuf {
        PathBuf::from(&self.config.data_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relato_config::model::StorageBackend;
    use tempfile::tempdir;

    fn make_config(dir: &std::path::Path) -> StorageConfig {
        StorageConfig {
            backend: StorageBackend::Sqlite,
            database_path: dir.join("relato.db").to_string_lossy().into_owned(),
            data_dir: dir.join("registros").to_string_lossy().into_owned(),
        }
    }

    async fn setup_store() -> (SqliteStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let store = SqliteStore::new(make_config(dir.path()));
        store.initialize().await.unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn initialize_twice_fails() {
        let (store, _dir) = setup_store().await;
        assert!(store.initialize().await.is_err());
    }

    #[tokio::test]
    async fn health_check_fails_when_not_initialized() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::new(make_config(dir.path()));
        assert!(store.health_check().await.is_err());
    }

    #[tokio::test]
    async fn health_check_returns_healthy_when_initialized() {
        let (store, _dir) = setup_store().await;
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn full_activity_lifecycle_through_adapter() {
        let (store, _dir) = setup_store().await;
        let user = UserId(101);

        let id = store
            .create_activity(user, Some("trocar a válvula"), false)
            .await
            .unwrap();
        store
            .append_note(user, &id, "peça encomendada", Some(7), NoteKind::Note)
            .await
            .unwrap();
        store.link_message(user, 7, &id).await.unwrap();

        let activity = store.get_activity(user, &id).await.unwrap();
        assert_eq!(activity.notes.len(), 2);
        assert_eq!(store.resolve_message(user, 7).await.unwrap(), Some(id.clone()));
        assert_eq!(store.list_users().await.unwrap(), vec![user]);

        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn append_media_writes_bytes_and_clears_pending() {
        let (store, _dir) = setup_store().await;
        let user = UserId(5);
        let id = store.create_activity(user, None, true).await.unwrap();

        let media = store
            .append_media(
                user,
                &id,
                NewMedia {
                    filename: "photo.jpg".into(),
                    data: vec![0xff, 0xd8, 0xff],
                    caption: Some("instalado".into()),
                    message_id: Some(12),
                },
            )
            .await
            .unwrap();

        let on_disk = store.media_root().join(&media.filename);
        assert_eq!(tokio::fs::read(&on_disk).await.unwrap(), vec![0xff, 0xd8, 0xff]);

        let activity = store.get_activity(user, &id).await.unwrap();
        assert!(!activity.pending_photo);
        assert_eq!(activity.media.len(), 1);
        assert_eq!(activity.media[0].filename, media.filename);
    }

    #[tokio::test]
    async fn append_media_to_missing_activity_removes_orphan_file() {
        let (store, _dir) = setup_store().await;
        let user = UserId(5);
        let ghost = ActivityId("20260101T000000Z_deadbe".into());

        let err = store
            .append_media(
                user,
                &ghost,
                NewMedia {
                    filename: "photo.jpg".into(),
                    data: vec![1, 2, 3],
                    caption: None,
                    message_id: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RelatoError::ActivityNotFound { .. }));

        let orphan = store
            .media_root()
            .join(format!("{}/{}_photo.jpg", user.0, ghost.0));
        assert!(!orphan.exists());
    }

    #[tokio::test]
    async fn missing_activity_surfaces_not_found() {
        let (store, _dir) = setup_store().await;
        let ghost = ActivityId("20260101T000000Z_000000".into());
        let err = store.get_activity(UserId(1), &ghost).await.unwrap_err();
        assert!(matches!(err, RelatoError::ActivityNotFound { .. }));
        let err = store
            .append_note(UserId(1), &ghost, "x", None, NoteKind::Note)
            .await
            .unwrap_err();
        assert!(matches!(err, RelatoError::ActivityNotFound { .. }));
    }

    #[tokio::test]
    async fn startup_sweep_clears_pending_across_users() {
        let (store, _dir) = setup_store().await;
        store.create_activity(UserId(1), None, true).await.unwrap();
        store.create_activity(UserId(2), None, true).await.unwrap();
        store.create_activity(UserId(1), None, false).await.unwrap();

        assert_eq!(store.clear_all_pending().await.unwrap(), 2);
        for activity in store.list_activities(UserId(1)).await.unwrap() {
            assert!(!activity.pending_photo);
        }
    }
}
