// SPDX-FileCopyrightText: 2026 Relato Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the Relato plugin architecture.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod channel;
pub mod store;

pub use adapter::PluginAdapter;
pub use channel::{ChannelAdapter, ChannelCapabilities};
pub use store::ActivityStore;
