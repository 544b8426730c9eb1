// SPDX-FileCopyrightText: 2026 Relato Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as valid bind addresses, non-empty paths, and a nonzero
//! photo wait window.

use crate::diagnostic::ConfigError;
use crate::model::{RelatoConfig, StorageBackend};

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &RelatoConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.bot.photo_wait_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "bot.photo_wait_secs must be greater than zero".to_string(),
        });
    }

    if config.storage.backend == StorageBackend::Sqlite
        && config.storage.database_path.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    // Media bytes always land under data_dir, regardless of backend.
    if config.storage.data_dir.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.data_dir must not be empty".to_string(),
        });
    }

    if config.dashboard.enabled {
        let host = config.dashboard.host.trim();
        if host.is_empty() {
            errors.push(ConfigError::Validation {
                message: "dashboard.host must not be empty".to_string(),
            });
        } else {
            let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
            let is_valid_hostname = host
                .chars()
                .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
            if !is_valid_ip && !is_valid_hostname {
                errors.push(ConfigError::Validation {
                    message: format!(
                        "dashboard.host `{host}` is not a valid IP address or hostname"
                    ),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
