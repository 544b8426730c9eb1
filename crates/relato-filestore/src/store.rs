// SPDX-FileCopyrightText: 2026 Relato Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! FileStore: ActivityStore over a plain directory tree.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use relato_config::model::StorageConfig;
use relato_core::{
    Activity, ActivityId, ActivityStore, AdapterType, HealthStatus, Media, NewMedia, Note,
    NoteKind, PluginAdapter, RelatoError, UserId,
};

/// File-tree-backed activity store.
///
/// All read-modify-write cycles on metadata and mapping files take the
/// store-wide lock; plain reads go lockless because completed files are only
/// ever replaced atomically, never mutated in place.
pub struct FileStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: PathBuf::from(&config.data_dir),
            write_lock: Mutex::new(()),
        }
    }

    fn user_dir(&self, user: UserId) -> PathBuf {
        self.root.join(user.0.to_string())
    }

    fn activities_dir(&self, user: UserId) -> PathBuf {
        self.user_dir(user).join("activities")
    }

    fn activity_dir(&self, user: UserId, activity: &ActivityId) -> PathBuf {
        self.activities_dir(user).join(&activity.0)
    }

    fn metadata_path(&self, user: UserId, activity: &ActivityId) -> PathBuf {
        self.activity_dir(user, activity).join("metadata.json")
    }

    fn mappings_path(&self, user: UserId) -> PathBuf {
        self.user_dir(user).join("mappings.json")
    }

    async fn read_metadata(
        &self,
        user: UserId,
        activity: &ActivityId,
    ) -> Result<Activity, RelatoError> {
        let path = self.metadata_path(user, activity);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RelatoError::ActivityNotFound {
                    id: activity.0.clone(),
                })
            }
            Err(e) => return Err(RelatoError::storage(e)),
        };
        serde_json::from_slice(&bytes).map_err(RelatoError::storage)
    }

    async fn write_metadata(
        &self,
        user: UserId,
        activity_record: &Activity,
    ) -> Result<(), RelatoError> {
        let path = self.metadata_path(user, &activity_record.id);
        write_json_atomic(&path, activity_record).await
    }

    async fn read_mappings(&self, user: UserId) -> Result<HashMap<String, String>, RelatoError> {
        let path = self.mappings_path(user);
        match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(RelatoError::storage),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(RelatoError::storage(e)),
        }
    }
}

/// Serialize `value` to `path` via a temp file in the same directory,
/// then rename over the destination.
async fn write_json_atomic<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), RelatoError> {
    let json = serde_json::to_vec_pretty(value).map_err(RelatoError::storage)?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(RelatoError::storage)?;
    }
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, &json)
        .await
        .map_err(RelatoError::storage)?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(RelatoError::storage)?;
    Ok(())
}

#[async_trait]
impl PluginAdapter for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, RelatoError> {
        match tokio::fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => Ok(HealthStatus::Healthy),
            Ok(_) => Ok(HealthStatus::Unhealthy(format!(
                "{} is not a directory",
                self.root.display()
            ))),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), RelatoError> {
        Ok(())
    }
}

#[async_trait]
impl ActivityStore for FileStore {
    async fn initialize(&self) -> Result<(), RelatoError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(RelatoError::storage)?;
        debug!(root = %self.root.display(), "file storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), RelatoError> {
        Ok(())
    }

    async fn create_activity(
        &self,
        user: UserId,
        initial_note: Option<&str>,
        pending_photo: bool,
    ) -> Result<ActivityId, RelatoError> {
        let _guard = self.write_lock.lock().await;
        let id = ActivityId::generate();
        let created_at = Utc::now();
        let notes = initial_note
            .map(|text| {
                vec![Note {
                    message_id: None,
                    text: text.to_owned(),
                    timestamp: created_at,
                    kind: NoteKind::Note,
                }]
            })
            .unwrap_or_default();
        let record = Activity {
            id: id.clone(),
            created_at,
            pending_photo,
            notes,
            media: Vec::new(),
        };
        self.write_metadata(user, &record).await?;
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
        let _guard = self.write_lock.lock().await;
        let mut record = self.read_metadata(user, activity).await?;
        record.notes.push(Note {
            message_id,
            text: text.to_owned(),
            timestamp: Utc::now(),
            kind,
        });
        self.write_metadata(user, &record).await
    }

    async fn append_media(
        &self,
        user: UserId,
        activity: &ActivityId,
        media: NewMedia,
    ) -> Result<Media, RelatoError> {
        let _guard = self.write_lock.lock().await;
        let mut record = self.read_metadata(user, activity).await?;

        let relative = format!("{}/activities/{}/{}", user.0, activity.0, media.filename);
        let path = self.root.join(&relative);
        tokio::fs::write(&path, &media.data)
            .await
            .map_err(RelatoError::storage)?;

        let entry = Media {
            filename: relative,
            caption: media.caption,
            timestamp: Utc::now(),
            message_id: media.message_id,
        };
        record.media.push(entry.clone());
        record.pending_photo = false;
        if let Err(e) = self.write_metadata(user, &record).await {
            if let Err(rm) = tokio::fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %rm, "failed to remove orphaned media file");
            }
            return Err(e);
        }
        Ok(entry)
    }

    async fn get_activity(
        &self,
        user: UserId,
        activity: &ActivityId,
    ) -> Result<Activity, RelatoError> {
        self.read_metadata(user, activity).await
    }

    async fn list_activities(&self, user: UserId) -> Result<Vec<Activity>, RelatoError> {
        let dir = self.activities_dir(user);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(RelatoError::storage(e)),
        };
        let mut activities = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(RelatoError::storage)? {
            if !entry.file_type().await.map_err(RelatoError::storage)?.is_dir() {
                continue;
            }
            let id = ActivityId(entry.file_name().to_string_lossy().into_owned());
            match self.read_metadata(user, &id).await {
                Ok(activity) => activities.push(activity),
                // A directory without metadata is a partially created
                // activity from a crash; skip it rather than fail the listing.
                Err(RelatoError::ActivityNotFound { .. }) => {
                    warn!(%user, activity = %id, "activity directory without metadata, skipping");
                }
                Err(e) => return Err(e),
            }
        }
        activities.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.0.cmp(&a.id.0)));
        Ok(activities)
    }

    async fn finalize_pending(
        &self,
        user: UserId,
        activity: &ActivityId,
    ) -> Result<bool, RelatoError> {
        let _guard = self.write_lock.lock().await;
        let mut record = self.read_metadata(user, activity).await?;
        if !record.pending_photo {
            return Ok(false);
        }
        record.pending_photo = false;
        self.write_metadata(user, &record).await?;
        Ok(true)
    }

    async fn clear_all_pending(&self) -> Result<u64, RelatoError> {
        let _guard = self.write_lock.lock().await;
        let mut cleared = 0u64;
        for user in scan_users(&self.root).await? {
            let dir = self.activities_dir(user);
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(RelatoError::storage(e)),
            };
            while let Some(entry) = entries.next_entry().await.map_err(RelatoError::storage)? {
                if !entry.file_type().await.map_err(RelatoError::storage)?.is_dir() {
                    continue;
                }
                let id = ActivityId(entry.file_name().to_string_lossy().into_owned());
                let mut record = match self.read_metadata(user, &id).await {
                    Ok(record) => record,
                    Err(RelatoError::ActivityNotFound { .. }) => continue,
                    Err(e) => return Err(e),
                };
                if record.pending_photo {
                    record.pending_photo = false;
                    self.write_metadata(user, &record).await?;
                    cleared += 1;
                }
            }
        }
        Ok(cleared)
    }

    async fn link_message(
        &self,
        user: UserId,
        message_id: i64,
        activity: &ActivityId,
    ) -> Result<(), RelatoError> {
        let _guard = self.write_lock.lock().await;
        let mut mappings = self.read_mappings(user).await?;
        mappings.insert(message_id.to_string(), activity.0.clone());
        write_json_atomic(&self.mappings_path(user), &mappings).await
    }

    async fn resolve_message(
        &self,
        user: UserId,
        message_id: i64,
    ) -> Result<Option<ActivityId>, RelatoError> {
        let mappings = self.read_mappings(user).await?;
        Ok(mappings
            .get(&message_id.to_string())
            .map(|id| ActivityId(id.clone())))
    }

    async fn list_users(&self) -> Result<Vec<UserId>, RelatoError> {
        let mut users = scan_users(&self.root).await?;
        users.sort_by_key(|u| u.0);
        Ok(users)
    }

    fn media_root(&self) -> PathBuf {
        self.root.clone()
    }
}

/// Directories under the root whose names parse as user ids.
async fn scan_users(root: &Path) -> Result<Vec<UserId>, RelatoError> {
    let mut entries = match tokio::fs::read_dir(root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(RelatoError::storage(e)),
    };
    let mut users = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(RelatoError::storage)? {
        if !entry.file_type().await.map_err(RelatoError::storage)?.is_dir() {
            continue;
        }
        if let Ok(id) = entry.file_name().to_string_lossy().parse::<i64>() {
            users.push(UserId(id));
        }
    }
    Ok(users)
}
