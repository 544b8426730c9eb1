// SPDX-FileCopyrightText: 2026 Relato Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Miette diagnostics for configuration errors.
//!
//! Converts Figment deserialization errors into miette diagnostics so that
//! typos and type mismatches render with error codes and help text instead
//! of a bare parser message.

use miette::Diagnostic;
use thiserror::Error;

/// A configuration error with diagnostic information.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// The TOML could not be parsed or deserialized into the config model.
    #[error("failed to load configuration: {message}")]
    #[diagnostic(
        code(relato::config::parse),
        help("check relato.toml against the documented keys; unknown keys are rejected")
    )]
    Parse {
        /// Figment's description of the failure, including the offending key.
        message: String,
    },

    /// A semantic validation error for a config value.
    #[error("validation error: {message}")]
    #[diagnostic(code(relato::config::validation))]
    Validation {
        /// Description of the validation failure.
        message: String,
    },

    /// Catch-all for other configuration errors.
    #[error("configuration error: {0}")]
    #[diagnostic(code(relato::config::other))]
    Other(String),
}

/// Convert a Figment error (which may aggregate several failures) into
/// individual diagnostics.
pub fn figment_to_config_errors(err: figment::Error) -> Vec<ConfigError> {
    err.into_iter()
        .map(|e| ConfigError::Parse {
            message: e.to_string(),
        })
        .collect()
}

/// Render all collected errors to stderr via miette's fancy reporter.
pub fn render_errors(errors: &[ConfigError]) {
    for error in errors {
        let report = miette::Report::msg(format!("{error}"));
        eprintln!("{report:?}");
        if let Some(help) = error.help() {
            eprintln!("  help: {help}");
        }
    }
}
