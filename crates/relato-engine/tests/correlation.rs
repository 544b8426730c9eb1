// SPDX-FileCopyrightText: 2026 Relato Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end correlation scenarios over a real SQLite store.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use relato_config::model::{StorageBackend, StorageConfig};
use relato_core::{
    ActivityId, ActivityStore, Command, InboundEvent, OutboundAction, OutboundKind,
    RegisterChoice, UserId,
};
use relato_engine::{CorrelationEngine, EngineLoop, PhotoTimer};
use relato_storage::SqliteStore;
use relato_test_utils::MockChannel;

struct Fixture {
    engine: CorrelationEngine,
    store: Arc<SqliteStore>,
    notices: mpsc::Receiver<OutboundAction>,
    _dir: tempfile::TempDir,
}

impl Fixture {
    async fn new(window: Duration) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SqliteStore::new(StorageConfig {
            backend: StorageBackend::Sqlite,
            database_path: dir.path().join("t.db").to_string_lossy().into_owned(),
            data_dir: dir.path().join("registros").to_string_lossy().into_owned(),
        }));
        store.initialize().await.unwrap();

        let (notice_tx, notice_rx) = mpsc::channel(8);
        let timer = Arc::new(PhotoTimer::new(store.clone(), notice_tx, window));
        let engine = CorrelationEngine::new(store.clone(), timer, window.as_secs());
        Self {
            engine,
            store,
            notices: notice_rx,
            _dir: dir,
        }
    }

    async fn text(&mut self, user: i64, message_id: i64, text: &str) -> Vec<OutboundAction> {
        self.engine
            .handle_event(InboundEvent::Text {
                user: UserId(user),
                message_id,
                text: text.to_string(),
                reply_to: None,
            })
            .await
            .unwrap()
    }

    async fn reply_text(
        &mut self,
        user: i64,
        message_id: i64,
        text: &str,
        reply_to: i64,
    ) -> Vec<OutboundAction> {
        self.engine
            .handle_event(InboundEvent::Text {
                user: UserId(user),
                message_id,
                text: text.to_string(),
                reply_to: Some(reply_to),
            })
            .await
            .unwrap()
    }

    async fn photo(
        &mut self,
        user: i64,
        message_id: i64,
        caption: Option<&str>,
        reply_to: Option<i64>,
    ) -> Vec<OutboundAction> {
        self.engine
            .handle_event(InboundEvent::Photo {
                user: UserId(user),
                message_id,
                filename: format!("photo_{message_id}.jpg"),
                data: vec![0xff, 0xd8],
                caption: caption.map(str::to_owned),
                reply_to,
            })
            .await
            .unwrap()
    }

    async fn choose(
        &mut self,
        user: i64,
        choice: RegisterChoice,
        origin_message_id: i64,
    ) -> Vec<OutboundAction> {
        self.engine
            .handle_event(InboundEvent::Choice {
                user: UserId(user),
                message_id: 1000,
                choice,
                origin_message_id,
            })
            .await
            .unwrap()
    }

    async fn only_activity(&self, user: i64) -> relato_core::Activity {
        let mut activities = self.store.list_activities(UserId(user)).await.unwrap();
        assert_eq!(activities.len(), 1, "expected exactly one activity");
        activities.remove(0)
    }
}

fn assert_choice_prompt(actions: &[OutboundAction], origin: i64) {
    assert_eq!(actions.len(), 1);
    assert_eq!(
        actions[0].kind,
        OutboundKind::Choice {
            origin_message_id: origin
        }
    );
}

#[tokio::test]
async fn plain_text_choice_creates_single_note_activity() {
    let mut fx = Fixture::new(Duration::from_secs(60)).await;

    let actions = fx.text(1, 10, "Fix leaking valve").await;
    assert_choice_prompt(&actions, 10);

    let actions = fx.choose(1, RegisterChoice::PlainText, 10).await;
    assert!(matches!(actions[0].kind, OutboundKind::Edit { message_id: 1000 }));

    let activity = fx.only_activity(1).await;
    assert!(!activity.pending_photo);
    assert_eq!(activity.notes.len(), 1);
    assert_eq!(activity.notes[0].text, "Fix leaking valve");
    assert!(activity.media.is_empty());

    // The originating message is linked for future replies.
    let linked = fx.store.resolve_message(UserId(1), 10).await.unwrap();
    assert_eq!(linked, Some(activity.id));
}

#[tokio::test]
async fn await_photo_then_photo_within_window() {
    let mut fx = Fixture::new(Duration::from_millis(200)).await;

    fx.text(1, 10, "Fix leaking valve").await;
    let actions = fx.choose(1, RegisterChoice::AwaitPhoto, 10).await;
    assert!(actions[0].text.contains("Aguardando"));

    let pending = fx.only_activity(1).await;
    assert!(pending.pending_photo);

    fx.photo(1, 11, Some("done"), None).await;

    let activity = fx.only_activity(1).await;
    assert!(!activity.pending_photo);
    assert_eq!(activity.notes.len(), 1);
    assert_eq!(activity.media.len(), 1);
    assert_eq!(activity.media[0].caption.as_deref(), Some("done"));

    // The timer was cancelled; no expiry notice arrives after the window.
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(fx.notices.try_recv().is_err());
}

#[tokio::test]
async fn await_photo_expiry_finalizes_and_notifies_once() {
    let mut fx = Fixture::new(Duration::from_millis(100)).await;

    fx.text(1, 10, "Fix leaking valve").await;
    fx.choose(1, RegisterChoice::AwaitPhoto, 10).await;

    let notice = tokio::time::timeout(Duration::from_secs(2), fx.notices.recv())
        .await
        .expect("expiry notice not delivered")
        .unwrap();
    assert_eq!(notice.kind, OutboundKind::Notice);
    assert_eq!(notice.user, UserId(1));

    let activity = fx.only_activity(1).await;
    assert!(!activity.pending_photo);
    assert!(activity.media.is_empty());

    // Exactly one notification.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(fx.notices.try_recv().is_err());
}

#[tokio::test]
async fn reply_photo_targets_older_activity_without_cancelling_newer_wait() {
    let mut fx = Fixture::new(Duration::from_millis(200)).await;

    // Activity A, registered as plain text.
    fx.text(1, 10, "older job").await;
    fx.choose(1, RegisterChoice::PlainText, 10).await;
    let a = fx.store.resolve_message(UserId(1), 10).await.unwrap().unwrap();

    // Activity B with an open photo wait.
    fx.text(1, 20, "newer job").await;
    fx.choose(1, RegisterChoice::AwaitPhoto, 20).await;
    let b = fx.store.resolve_message(UserId(1), 20).await.unwrap().unwrap();

    // A photo replying to A's message attaches to A and leaves B's wait open.
    fx.photo(1, 30, None, Some(10)).await;

    let a_loaded = fx.store.get_activity(UserId(1), &a).await.unwrap();
    assert_eq!(a_loaded.media.len(), 1);
    let b_loaded = fx.store.get_activity(UserId(1), &b).await.unwrap();
    assert!(b_loaded.pending_photo);

    // B's timer still fires and finalizes B.
    let notice = tokio::time::timeout(Duration::from_secs(2), fx.notices.recv())
        .await
        .expect("expiry notice not delivered")
        .unwrap();
    assert_eq!(notice.kind, OutboundKind::Notice);
    let b_loaded = fx.store.get_activity(UserId(1), &b).await.unwrap();
    assert!(!b_loaded.pending_photo);
    assert!(b_loaded.media.is_empty());
}

#[tokio::test]
async fn reply_text_appends_note_to_existing_activity() {
    let mut fx = Fixture::new(Duration::from_secs(60)).await;

    fx.photo(1, 10, Some("valve photo"), None).await;
    let x = fx.store.resolve_message(UserId(1), 10).await.unwrap().unwrap();

    fx.reply_text(1, 11, "also check the gasket", 10).await;

    let activity = fx.store.get_activity(UserId(1), &x).await.unwrap();
    assert_eq!(activity.notes.len(), 1);
    assert_eq!(activity.notes[0].text, "also check the gasket");
    assert_eq!(activity.media.len(), 1);
    // No new activity was created.
    assert_eq!(fx.store.list_activities(UserId(1)).await.unwrap().len(), 1);
    // The reply itself is now linked too.
    assert_eq!(
        fx.store.resolve_message(UserId(1), 11).await.unwrap(),
        Some(x)
    );
}

#[tokio::test]
async fn free_standing_photo_creates_activity_with_caption() {
    let mut fx = Fixture::new(Duration::from_secs(60)).await;

    let actions = fx.photo(1, 10, Some("instalado"), None).await;
    assert_eq!(actions[0].kind, OutboundKind::Reply);

    let activity = fx.only_activity(1).await;
    assert!(!activity.pending_photo);
    assert!(activity.notes.is_empty());
    assert_eq!(activity.media.len(), 1);
    assert_eq!(activity.media[0].caption.as_deref(), Some("instalado"));
}

#[tokio::test]
async fn second_choice_press_reports_held_text_missing() {
    let mut fx = Fixture::new(Duration::from_secs(60)).await;

    fx.text(1, 10, "Fix leaking valve").await;
    fx.choose(1, RegisterChoice::PlainText, 10).await;

    let err = fx
        .engine
        .handle_event(InboundEvent::Choice {
            user: UserId(1),
            message_id: 1000,
            choice: RegisterChoice::PlainText,
            origin_message_id: 10,
        })
        .await
        .unwrap_err();
    assert!(err.is_user_recoverable());
    // No empty activity was created by the stale press.
    assert_eq!(fx.store.list_activities(UserId(1)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn new_activity_phrase_prompts_for_seed_text() {
    let mut fx = Fixture::new(Duration::from_secs(60)).await;

    let actions = fx.text(1, 10, "🆕 Novo registro").await;
    assert_eq!(actions[0].kind, OutboundKind::Reply);
    assert!(actions[0].text.contains("Envie o texto"));

    // The next text is held as seed content and offered the choice.
    let actions = fx.text(1, 11, "Fix leaking valve").await;
    assert_choice_prompt(&actions, 11);
}

#[tokio::test]
async fn repeated_new_activity_phrase_reminds_instead_of_restarting() {
    let mut fx = Fixture::new(Duration::from_secs(60)).await;

    let first = fx.text(1, 10, "🆕 Novo registro").await;
    assert!(first[0].text.contains("Envie o texto"));

    let second = fx.text(1, 11, "🆕 Novo registro").await;
    assert!(second[0].text.contains("Ainda aguardando"));

    // The seed still lands in the normal choice flow afterwards.
    let actions = fx.text(1, 12, "Fix leaking valve").await;
    assert_choice_prompt(&actions, 12);
}

#[tokio::test]
async fn list_phrase_renders_newest_first_summary() {
    let mut fx = Fixture::new(Duration::from_secs(60)).await;

    let actions = fx.text(1, 10, "📋 Ver registros").await;
    assert!(actions[0].text.contains("Nenhum registro"));

    fx.photo(1, 11, Some("um"), None).await;
    let actions = fx.text(1, 12, "📋 Ver registros").await;
    assert!(actions[0].text.contains("Últimos registros"));
    assert!(actions[0].text.contains("1 foto(s)"));
}

#[tokio::test]
async fn commands_produce_canned_responses() {
    let mut fx = Fixture::new(Duration::from_secs(60)).await;

    let actions = fx
        .engine
        .handle_event(InboundEvent::Command {
            user: UserId(1),
            message_id: 1,
            command: Command::Start,
        })
        .await
        .unwrap();
    assert_eq!(actions[0].kind, OutboundKind::Menu);

    let actions = fx
        .engine
        .handle_event(InboundEvent::Command {
            user: UserId(1),
            message_id: 2,
            command: Command::Help,
        })
        .await
        .unwrap();
    assert_eq!(actions[0].kind, OutboundKind::Reply);
}

#[tokio::test]
async fn rearming_wait_for_same_user_replaces_previous_timer() {
    let mut fx = Fixture::new(Duration::from_millis(150)).await;

    fx.text(1, 10, "first").await;
    fx.choose(1, RegisterChoice::AwaitPhoto, 10).await;
    fx.text(1, 20, "second").await;
    fx.choose(1, RegisterChoice::AwaitPhoto, 20).await;

    // The first wait's timer was replaced; only the second fires, and the
    // first activity stays pending until the startup-style sweep or a photo.
    let notice = tokio::time::timeout(Duration::from_secs(2), fx.notices.recv())
        .await
        .expect("expiry notice not delivered")
        .unwrap();
    assert_eq!(notice.kind, OutboundKind::Notice);
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(fx.notices.try_recv().is_err());

    let second = fx.store.resolve_message(UserId(1), 20).await.unwrap().unwrap();
    let second = fx.store.get_activity(UserId(1), &second).await.unwrap();
    assert!(!second.pending_photo);
}

#[tokio::test]
async fn engine_loop_converts_stale_choice_into_recovery_reply() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteStore::new(StorageConfig {
        backend: StorageBackend::Sqlite,
        database_path: dir.path().join("t.db").to_string_lossy().into_owned(),
        data_dir: dir.path().join("registros").to_string_lossy().into_owned(),
    }));
    store.initialize().await.unwrap();

    let channel = Arc::new(MockChannel::new());
    // A choice with no held text: the loop must answer with a resend prompt.
    channel
        .inject_event(InboundEvent::Choice {
            user: UserId(1),
            message_id: 1000,
            choice: RegisterChoice::PlainText,
            origin_message_id: 99,
        })
        .await;

    struct SharedChannel(Arc<MockChannel>);

    #[async_trait::async_trait]
    impl relato_core::PluginAdapter for SharedChannel {
        fn name(&self) -> &str {
            self.0.name()
        }
        fn version(&self) -> semver::Version {
            self.0.version()
        }
        fn adapter_type(&self) -> relato_core::AdapterType {
            self.0.adapter_type()
        }
        async fn health_check(&self) -> Result<relato_core::HealthStatus, relato_core::RelatoError> {
            self.0.health_check().await
        }
        async fn shutdown(&self) -> Result<(), relato_core::RelatoError> {
            self.0.shutdown().await
        }
    }

    #[async_trait::async_trait]
    impl relato_core::ChannelAdapter for SharedChannel {
        fn capabilities(&self) -> relato_core::ChannelCapabilities {
            self.0.capabilities()
        }
        async fn connect(&mut self) -> Result<(), relato_core::RelatoError> {
            Ok(())
        }
        async fn send(
            &self,
            action: OutboundAction,
        ) -> Result<relato_core::MessageId, relato_core::RelatoError> {
            self.0.send(action).await
        }
        async fn receive(&self) -> Result<InboundEvent, relato_core::RelatoError> {
            self.0.receive().await
        }
    }

    let mut event_loop = EngineLoop::new(
        Box::new(SharedChannel(channel.clone())),
        store,
        Duration::from_secs(60),
    );
    let cancel = CancellationToken::new();
    let stopper = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        stopper.cancel();
    });
    event_loop.run(cancel).await.unwrap();

    let sent = channel.sent_actions().await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].text.contains("novamente"));
}
