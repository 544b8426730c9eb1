// SPDX-FileCopyrightText: 2026 Relato Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plain-file persistence backend for the Relato activity logger.
//!
//! Lays activities out as a browsable directory tree:
//!
//! ```text
//! <data_dir>/
//!   <user_id>/
//!     mappings.json                     message -> activity index
//!     activities/
//!       <activity_id>/
//!         metadata.json                 notes, media records, pending flag
//!         <media files>
//! ```
//!
//! Every metadata update rewrites the whole JSON document through a
//! write-temp-then-rename sequence, so a crash never leaves a half-written
//! file behind. A store-wide mutex serializes read-modify-write cycles.

pub mod store;

pub use store::FileStore;
