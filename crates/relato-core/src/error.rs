// SPDX-FileCopyrightText: 2026 Relato Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Relato activity logger.

use thiserror::Error;

/// The primary error type used across adapter traits and core operations.
#[derive(Debug, Error)]
pub enum RelatoError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// The referenced activity does not exist.
    ///
    /// Always user-recoverable: the event-handling boundary converts it into
    /// a "please resend" style reply.
    #[error("activity not found: {id}")]
    ActivityNotFound { id: String },

    /// The held text for a pending choice has been consumed or expired.
    #[error("held text not found for message {origin_message_id}")]
    HeldTextNotFound { origin_message_id: i64 },

    /// Storage backend errors (database, filesystem, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Channel adapter errors (connection failure, message format, send failure).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RelatoError {
    /// Shorthand for wrapping an arbitrary error as a storage failure.
    pub fn storage<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        RelatoError::Storage {
            source: Box::new(source),
        }
    }

    /// True for errors caused by a stale user reference rather than a fault,
    /// i.e. the user can recover by resending.
    pub fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            RelatoError::ActivityNotFound { .. } | RelatoError::HeldTextNotFound { .. }
        )
    }
}
