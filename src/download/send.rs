//! Delivery adapter: hand a staged file to Telegram.
//!
//! The adapter only transfers; it never deletes. The dispatch core removes
//! the file after this reports the send attempt, whether it succeeded or
//! not.

use crate::telegram::Bot;
use std::path::Path;
use teloxide::prelude::*;
use teloxide::types::InputFile;
use teloxide::RequestError;
use thiserror::Error;

/// Send failures, split the way the caller cares about them: transient
/// transport problems vs. the API rejecting the request.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("network error while sending file: {0}")]
    Network(String),
    #[error("Telegram rejected the file: {0}")]
    Protocol(String),
}

impl DeliveryError {
    /// Human-readable reply for the chat.
    pub fn user_message(&self) -> String {
        match self {
            DeliveryError::Network(_) => {
                "❌ The video was downloaded but sending it failed.\n\nTry again in a minute.".to_string()
            }
            DeliveryError::Protocol(_) => {
                "❌ Telegram refused the video.\n\nIt may be too large for a bot upload.".to_string()
            }
        }
    }
}

impl From<RequestError> for DeliveryError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::Network(e) => DeliveryError::Network(e.to_string()),
            RequestError::Io(e) => DeliveryError::Network(e.to_string()),
            other => DeliveryError::Protocol(other.to_string()),
        }
    }
}

/// Upload one staged video file to a chat.
pub async fn send_video_file(bot: &Bot, chat_id: ChatId, path: &Path) -> Result<(), DeliveryError> {
    let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    log::info!("delivery: sending {} ({} bytes) to chat {}", path.display(), size, chat_id);

    bot.send_video(chat_id, InputFile::file(path.to_path_buf()))
        .await
        .map(|_| ())
        .map_err(DeliveryError::from)
}
