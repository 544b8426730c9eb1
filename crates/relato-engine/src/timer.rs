// SPDX-FileCopyrightText: 2026 Relato Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user single-slot pending-photo timer.
//!
//! Each user holds at most one armed timer. Arming a new one cancels the
//! previous slot. On expiry the timer re-checks the store before acting:
//! [`ActivityStore::finalize_pending`] atomically clears the flag and only
//! when that returns `true` does the expiry notification go out. A photo
//! racing the expiry therefore wins or loses cleanly, never both.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use relato_core::{ActivityId, ActivityStore, OutboundAction, RelatoError, UserId};

use crate::messages;

struct ArmedTimer {
    activity: ActivityId,
    token: CancellationToken,
}

/// Schedules and cancels pending-photo expiry actions.
pub struct PhotoTimer {
    store: Arc<dyn ActivityStore + Send + Sync>,
    notices: mpsc::Sender<OutboundAction>,
    slots: Arc<DashMap<i64, ArmedTimer>>,
    window: Duration,
}

impl PhotoTimer {
    pub fn new(
        store: Arc<dyn ActivityStore + Send + Sync>,
        notices: mpsc::Sender<OutboundAction>,
        window: Duration,
    ) -> Self {
        Self {
            store,
            notices,
            slots: Arc::new(DashMap::new()),
            window,
        }
    }

    /// Arm the one-shot timer for `activity`, replacing any prior armed
    /// timer for this user.
    pub fn arm(&self, user: UserId, activity: ActivityId) {
        let token = CancellationToken::new();
        let previous = self.slots.insert(
            user.0,
            ArmedTimer {
                activity: activity.clone(),
                token: token.clone(),
            },
        );
        if let Some(previous) = previous {
            previous.token.cancel();
        }

        let store = self.store.clone();
        let notices = self.notices.clone();
        let slots = self.slots.clone();
        let window = self.window;
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(window) => {
                    // A fired slot is spent; drop it so it cannot linger as
                    // a stale match for cancel_if.
                    slots.remove_if(&user.0, |_, slot| slot.activity == activity);
                    expire(store, notices, user, activity).await;
                }
                _ = token.cancelled() => {
                    debug!(%user, "photo timer cancelled");
                }
            }
        });
    }

    /// Cancel whatever timer is armed for this user. No-op if none.
    pub fn cancel(&self, user: UserId) {
        if let Some((_, slot)) = self.slots.remove(&user.0) {
            slot.token.cancel();
        }
    }

    /// Cancel the armed timer only when it is armed for exactly `activity`.
    ///
    /// A reply attaching a photo to an older activity must not tear down a
    /// wait that is open for a newer one.
    pub fn cancel_if(&self, user: UserId, activity: &ActivityId) {
        let matches = self
            .slots
            .get(&user.0)
            .is_some_and(|slot| slot.activity == *activity);
        if matches {
            self.cancel(user);
        }
    }
}

/// The expiry action: finalize if still pending, then notify.
///
/// A `false` from the store means a photo won the race; a missing activity
/// is treated the same way. Neither is an error. A failing notification
/// never rolls back the finalization.
async fn expire(
    store: Arc<dyn ActivityStore + Send + Sync>,
    notices: mpsc::Sender<OutboundAction>,
    user: UserId,
    activity: ActivityId,
) {
    match store.finalize_pending(user, &activity).await {
        Ok(true) => {
            debug!(%user, %activity, "photo wait expired, activity finalized");
            let notice = OutboundAction::notice(user, messages::PHOTO_WAIT_EXPIRED);
            if let Err(e) = notices.send(notice).await {
                warn!(%user, error = %e, "failed to queue expiry notification");
            }
        }
        Ok(false) => {
            debug!(%user, %activity, "photo wait expired after finalization, nothing to do");
        }
        Err(RelatoError::ActivityNotFound { .. }) => {
            debug!(%user, %activity, "expired timer references a missing activity");
        }
        Err(e) => {
            error!(%user, %activity, error = %e, "photo timer expiry failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relato_config::model::{StorageBackend, StorageConfig};
    use relato_storage::SqliteStore;

    async fn store_with_pending(
        dir: &tempfile::TempDir,
    ) -> (Arc<SqliteStore>, ActivityId) {
        let store = Arc::new(SqliteStore::new(StorageConfig {
            backend: StorageBackend::Sqlite,
            database_path: dir.path().join("t.db").to_string_lossy().into_owned(),
            data_dir: dir.path().join("registros").to_string_lossy().into_owned(),
        }));
        store.initialize().await.unwrap();
        let activity = store
            .create_activity(UserId(1), Some("pendente"), true)
            .await
            .unwrap();
        (store, activity)
    }

    #[tokio::test]
    async fn fired_timer_releases_its_slot() {
        let dir = tempfile::tempdir().unwrap();
        let (store, activity) = store_with_pending(&dir).await;

        let (tx, mut rx) = mpsc::channel(4);
        let timer = PhotoTimer::new(store, tx, Duration::from_millis(20));
        timer.arm(UserId(1), activity);

        let notice = rx.recv().await.unwrap();
        assert_eq!(notice.user, UserId(1));
        assert!(timer.slots.is_empty());
    }

    #[tokio::test]
    async fn cancel_if_ignores_a_slot_armed_for_another_activity() {
        let dir = tempfile::tempdir().unwrap();
        let (store, activity) = store_with_pending(&dir).await;

        let (tx, mut rx) = mpsc::channel(4);
        let timer = PhotoTimer::new(store, tx, Duration::from_millis(50));
        timer.arm(UserId(1), activity);

        timer.cancel_if(UserId(1), &ActivityId("other".into()));
        assert!(!timer.slots.is_empty());

        // The armed slot was untouched, so the expiry still fires.
        let notice = rx.recv().await.unwrap();
        assert_eq!(notice.user, UserId(1));
    }
}
