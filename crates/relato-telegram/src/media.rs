// SPDX-FileCopyrightText: 2026 Relato Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Photo download for Telegram messages.
//!
//! Downloads files from Telegram servers so the store can persist the raw
//! bytes alongside the activity metadata.

use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{FileMeta, PhotoSize};
use tracing::debug;

use relato_core::RelatoError;

/// Downloads a file from Telegram servers by its file metadata.
///
/// Uses the Bot API's `getFile` to resolve the file path, then downloads
/// the file content as bytes.
pub async fn download_file(bot: &Bot, file_meta: &FileMeta) -> Result<Vec<u8>, RelatoError> {
    let file = bot
        .get_file(file_meta.id.clone())
        .await
        .map_err(|e| RelatoError::Channel {
            message: format!("failed to get file info: {e}"),
            source: Some(Box::new(e)),
        })?;

    let mut buf = Vec::new();
    bot.download_file(&file.path, &mut buf)
        .await
        .map_err(|e| RelatoError::Channel {
            message: format!("failed to download file: {e}"),
            source: Some(Box::new(e)),
        })?;

    debug!(
        file_id = %file_meta.id,
        size = buf.len(),
        "downloaded file from Telegram"
    );
    Ok(buf)
}

/// Downloads the largest variant of a photo and names it by its unique id.
///
/// Telegram provides multiple sizes; the last one is the largest. Bot API
/// photos are always JPEG.
pub async fn download_photo(
    bot: &Bot,
    photos: &[PhotoSize],
) -> Result<(String, Vec<u8>), RelatoError> {
    let largest = photos.last().ok_or_else(|| RelatoError::Channel {
        message: "photo array is empty".into(),
        source: None,
    })?;

    let data = download_file(bot, &largest.file).await?;
    let filename = format!("{}.jpg", largest.file.unique_id);
    Ok((filename, data))
}
