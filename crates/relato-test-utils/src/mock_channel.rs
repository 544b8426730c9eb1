// SPDX-FileCopyrightText: 2026 Relato Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for deterministic testing.
//!
//! `MockChannel` implements `ChannelAdapter` with injectable inbound events
//! and captured outbound actions for assertion in tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use relato_core::traits::adapter::PluginAdapter;
use relato_core::traits::channel::{ChannelAdapter, ChannelCapabilities};
use relato_core::types::{AdapterType, HealthStatus, InboundEvent, MessageId, OutboundAction};
use relato_core::RelatoError;

/// A mock messaging channel for testing.
///
/// Provides two queues:
/// - **inbound**: Events injected via `inject_event()` are returned by `receive()`
/// - **sent**: Actions passed to `send()` are captured and retrievable via `sent_actions()`
pub struct MockChannel {
    inbound: Arc<Mutex<VecDeque<InboundEvent>>>,
    sent: Arc<Mutex<Vec<OutboundAction>>>,
    notify: Arc<Notify>,
    next_id: AtomicI64,
}

impl MockChannel {
    /// Create a new mock channel with empty queues.
    pub fn new() -> Self {
        Self {
            inbound: Arc::new(Mutex::new(VecDeque::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            notify: Arc::new(Notify::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Inject an inbound event into the receive queue.
    ///
    /// The next call to `receive()` will return this event.
    pub async fn inject_event(&self, event: InboundEvent) {
        self.inbound.lock().await.push_back(event);
        self.notify.notify_one();
    }

    /// Get all actions that were sent through `send()`.
    pub async fn sent_actions(&self) -> Vec<OutboundAction> {
        self.sent.lock().await.clone()
    }

    /// Get the count of sent actions.
    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Clear all sent actions.
    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, RelatoError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RelatoError> {
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_edit: true,
            supports_choice: true,
            supports_photos: true,
            max_message_length: None,
        }
    }

    async fn connect(&mut self) -> Result<(), RelatoError> {
        Ok(())
    }

    async fn send(&self, action: OutboundAction) -> Result<MessageId, RelatoError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.sent.lock().await.push(action);
        Ok(MessageId(format!("mock-msg-{id}")))
    }

    async fn receive(&self) -> Result<InboundEvent, RelatoError> {
        loop {
            {
                let mut queue = self.inbound.lock().await;
                if let Some(event) = queue.pop_front() {
                    return Ok(event);
                }
            }
            self.notify.notified().await;
        }
    }
}
