// SPDX-FileCopyrightText: 2026 Relato Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for the chat transport (Telegram, mocks).

use async_trait::async_trait;

use crate::error::RelatoError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{InboundEvent, MessageId, OutboundAction};

/// Capabilities reported by a channel adapter.
#[derive(Debug, Clone)]
pub struct ChannelCapabilities {
    /// The channel can edit previously sent messages in place.
    pub supports_edit: bool,
    /// The channel can present an inline two-way choice affordance.
    pub supports_choice: bool,
    /// The channel can deliver photos with captions.
    pub supports_photos: bool,
    /// Maximum outbound message length, if the platform imposes one.
    pub max_message_length: Option<usize>,
}

/// Adapter for a bidirectional chat transport.
///
/// Channel adapters decode platform updates into tagged [`InboundEvent`]s at
/// the transport boundary and deliver [`OutboundAction`]s back to the user.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Returns the capabilities supported by this channel.
    fn capabilities(&self) -> ChannelCapabilities;

    /// Establishes a connection to the messaging platform.
    async fn connect(&mut self) -> Result<(), RelatoError>;

    /// Delivers an outbound action through the channel.
    async fn send(&self, action: OutboundAction) -> Result<MessageId, RelatoError>;

    /// Receives the next inbound event from the channel.
    async fn receive(&self) -> Result<InboundEvent, RelatoError>;
}
