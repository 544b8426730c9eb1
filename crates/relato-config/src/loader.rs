// SPDX-FileCopyrightText: 2026 Relato Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./relato.toml` > `~/.config/relato/relato.toml` > `/etc/relato/relato.toml`
//! with environment variable overrides via `RELATO_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::RelatoConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/relato/relato.toml` (system-wide)
/// 3. `~/.config/relato/relato.toml` (user XDG config)
/// 4. `./relato.toml` (local directory)
/// 5. `RELATO_*` environment variables
pub fn load_config() -> Result<RelatoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RelatoConfig::default()))
        .merge(Toml::file("/etc/relato/relato.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("relato/relato.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("relato.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<RelatoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RelatoConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<RelatoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RelatoConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `RELATO_TELEGRAM_BOT_TOKEN` must map to
/// `telegram.bot_token`, not `telegram.bot.token`.
fn env_provider() -> Env {
    Env::prefixed("RELATO_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: RELATO_TELEGRAM_BOT_TOKEN -> "telegram_bot_token".
        // Only the leading section name becomes a dot; "bot" inside
        // "telegram_bot_token" must stay an underscore.
        let key_str = key.as_str();
        for section in ["bot", "telegram", "storage", "dashboard"] {
            if let Some(rest) = key_str.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
                return format!("{section}.{rest}").into();
            }
        }
        key_str.to_string().into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StorageBackend;

    #[test]
    fn inline_toml_overrides_defaults() {
        let config = load_config_from_str(
            r#"
            [bot]
            photo_wait_secs = 5

            [storage]
            backend = "file"
            data_dir = "/tmp/registros"
            "#,
        )
        .unwrap();
        assert_eq!(config.bot.photo_wait_secs, 5);
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(config.storage.data_dir, "/tmp/registros");
        // Untouched sections keep their defaults.
        assert_eq!(config.dashboard.port, 8080);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = load_config_from_str(
            r#"
            [bot]
            nmae = "typo"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn empty_config_yields_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.bot.name, "relato");
    }
}
