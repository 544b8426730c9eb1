// SPDX-FileCopyrightText: 2026 Relato Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only web dashboard for Relato.
//!
//! Serves a self-contained HTML report of every user's activities, a JSON
//! variant of the same data, and the stored photo files. The dashboard
//! never writes: it shares the [`ActivityStore`] handle with the engine
//! and only calls its read operations.
//!
//! [`ActivityStore`]: relato_core::traits::ActivityStore

pub mod handlers;
pub mod server;

pub use handlers::{build_report, DashboardState, ReportResponse, UserReport};
pub use server::{build_router, start_server};
