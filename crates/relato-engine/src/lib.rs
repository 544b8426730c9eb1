// SPDX-FileCopyrightText: 2026 Relato Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Correlation engine and event loop for the Relato activity logger.
//!
//! The [`EngineLoop`] is the central coordinator that:
//! - Receives decoded events from a channel adapter
//! - Routes them through the [`CorrelationEngine`]
//! - Delivers the resulting outbound actions
//! - Forwards pending-photo expiry notices from the [`PhotoTimer`]
//! - Handles graceful shutdown

pub mod engine;
pub mod messages;
pub mod session;
pub mod shutdown;
pub mod timer;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use relato_core::{ActivityStore, ChannelAdapter, OutboundAction, RelatoError};

pub use engine::CorrelationEngine;
pub use session::{SessionPhase, UserSession};
pub use timer::PhotoTimer;

/// Depth of the timer-notice queue; expiries beyond this block the timer task
/// briefly instead of being dropped.
const NOTICE_QUEUE_DEPTH: usize = 64;

/// The main event loop coordinating channel, engine, timer, and store.
pub struct EngineLoop {
    channel: Box<dyn ChannelAdapter + Send + Sync>,
    store: Arc<dyn ActivityStore + Send + Sync>,
    engine: CorrelationEngine,
    notices: mpsc::Receiver<OutboundAction>,
}

impl EngineLoop {
    /// Wire up the engine, timer, and notice queue around the given adapters.
    pub fn new(
        channel: Box<dyn ChannelAdapter + Send + Sync>,
        store: Arc<dyn ActivityStore + Send + Sync>,
        photo_wait: Duration,
    ) -> Self {
        let (notice_tx, notice_rx) = mpsc::channel(NOTICE_QUEUE_DEPTH);
        let timer = Arc::new(PhotoTimer::new(store.clone(), notice_tx, photo_wait));
        let engine = CorrelationEngine::new(store.clone(), timer, photo_wait.as_secs());
        Self {
            channel,
            store,
            engine,
            notices: notice_rx,
        }
    }

    /// Runs the event loop until the cancellation token is triggered.
    ///
    /// Engine errors are converted into user-facing replies at this boundary;
    /// no raw internal error reaches the chat transport.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), RelatoError> {
        info!("engine loop running");

        loop {
            tokio::select! {
                event = self.channel.receive() => {
                    match event {
                        Ok(event) => self.dispatch(event).await,
                        Err(e) => {
                            error!(error = %e, "channel receive error");
                            if e.to_string().contains("closed") {
                                break;
                            }
                        }
                    }
                }
                notice = self.notices.recv() => {
                    if let Some(notice) = notice {
                        if let Err(e) = self.channel.send(notice).await {
                            warn!(error = %e, "failed to deliver expiry notice");
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping engine loop");
                    break;
                }
            }
        }

        self.store.close().await?;
        info!("engine loop stopped");
        Ok(())
    }

    async fn dispatch(&mut self, event: relato_core::InboundEvent) {
        let user = event.user();
        match self.engine.handle_event(event).await {
            Ok(actions) => {
                for action in actions {
                    if let Err(e) = self.channel.send(action).await {
                        warn!(%user, error = %e, "failed to deliver outbound action");
                    }
                }
            }
            Err(e) if e.is_user_recoverable() => {
                debug!(%user, error = %e, "user-recoverable failure");
                let text = match e {
                    RelatoError::HeldTextNotFound { .. } => messages::HELD_TEXT_MISSING,
                    _ => messages::ACTIVITY_MISSING,
                };
                if let Err(send_err) = self
                    .channel
                    .send(OutboundAction::reply(user, text))
                    .await
                {
                    warn!(%user, error = %send_err, "failed to deliver recovery reply");
                }
            }
            Err(e) => {
                error!(%user, error = %e, "failed to handle inbound event");
                if let Err(send_err) = self
                    .channel
                    .send(OutboundAction::reply(user, messages::GENERIC_FAILURE))
                    .await
                {
                    warn!(%user, error = %send_err, "failed to deliver failure reply");
                }
            }
        }
    }
}
