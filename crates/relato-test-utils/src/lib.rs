// SPDX-FileCopyrightText: 2026 Relato Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Relato integration tests.

pub mod mock_channel;

pub use mock_channel::MockChannel;
