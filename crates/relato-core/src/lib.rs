// SPDX-FileCopyrightText: 2026 Relato Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Relato activity logger.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the Relato workspace. The chat transport and
//! the persistence backends both plug in through traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::RelatoError;
pub use types::{
    Activity, ActivityId, AdapterType, Command, HealthStatus, InboundEvent, Media, MessageId,
    NewMedia, Note, NoteKind, OutboundAction, OutboundKind, RegisterChoice, UserId,
};

pub use traits::{ActivityStore, ChannelAdapter, ChannelCapabilities, PluginAdapter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relato_error_has_all_variants() {
        let _config = RelatoError::Config("test".into());
        let _activity = RelatoError::ActivityNotFound { id: "a".into() };
        let _held = RelatoError::HeldTextNotFound {
            origin_message_id: 1,
        };
        let _storage = RelatoError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _channel = RelatoError::Channel {
            message: "test".into(),
            source: None,
        };
        let _internal = RelatoError::Internal("test".into());
    }

    #[test]
    fn trait_objects_are_constructible() {
        // If any trait module is missing or has a compile error, this won't compile.
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_channel_adapter<T: ChannelAdapter>() {}
        fn _assert_activity_store<T: ActivityStore>() {}
    }
}
