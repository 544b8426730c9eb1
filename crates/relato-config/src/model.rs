// SPDX-FileCopyrightText: 2026 Relato Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Relato.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Relato configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RelatoConfig {
    /// Bot identity and behavior settings.
    #[serde(default)]
    pub bot: BotConfig,

    /// Telegram transport settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Read-only web dashboard settings.
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// Bot identity and behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Display name of the bot.
    #[serde(default = "default_bot_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// How long a newly registered text-only activity waits for a photo
    /// before being finalized without one.
    #[serde(default = "default_photo_wait_secs")]
    pub photo_wait_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            log_level: default_log_level(),
            photo_wait_secs: default_photo_wait_secs(),
        }
    }
}

fn default_bot_name() -> String {
    "relato".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_photo_wait_secs() -> u64 {
    60
}

/// Telegram transport configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. `None` disables the Telegram transport.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// List of allowed Telegram user IDs or usernames. An empty list
    /// rejects all messages (secure default).
    #[serde(default)]
    pub allowed_users: Vec<String>,
}

/// Which persistence backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// SQLite database (reference backend).
    Sqlite,
    /// Plain hierarchical file layout, one directory per user.
    File,
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Selected backend.
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,

    /// Path to the SQLite database file (sqlite backend).
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Root directory for per-user activity trees and media files.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            database_path: default_database_path(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_backend() -> StorageBackend {
    StorageBackend::Sqlite
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("relato").join("relato.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("relato.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_data_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("relato").join("registros"))
        .unwrap_or_else(|| std::path::PathBuf::from("registros"))
        .to_string_lossy()
        .into_owned()
}

/// Read-only web dashboard configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DashboardConfig {
    /// Enable the dashboard HTTP server.
    #[serde(default)]
    pub enabled: bool,

    /// Host address to bind.
    #[serde(default = "default_dashboard_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_dashboard_port")]
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_dashboard_host(),
            port: default_dashboard_port(),
        }
    }
}

fn default_dashboard_host() -> String {
    "127.0.0.1".to_string()
}

fn default_dashboard_port() -> u16 {
    8080
}
