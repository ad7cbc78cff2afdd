//! Message handlers: the thin glue between Telegram updates and the
//! dispatch core.
//!
//! Each inbound message triggers at most one dispatch; independent chats run
//! concurrently. The handler owns the delivery-then-delete ordering: the
//! staged file is removed only after the send attempt has completed, whether
//! it succeeded or failed.

use crate::download::send::send_video_file;
use crate::download::{classify, DownloadDispatcher, Platform};
use crate::telegram::bot::{Bot, Command};
use std::sync::Arc;
use teloxide::prelude::*;

/// Handle `/start`.
pub async fn handle_command(bot: Bot, msg: Message, cmd: Command) -> ResponseResult<()> {
    match cmd {
        Command::Start => {
            bot.send_message(
                msg.chat.id,
                "Hi! Send me the URL of an Instagram, Twitter/X or TikTok video and I'll fetch it for you.",
            )
            .await?;
        }
    }
    Ok(())
}

/// Handle a plain text message: classify it, dispatch the download and relay
/// the result.
pub async fn handle_message(bot: Bot, msg: Message, dispatcher: Arc<DownloadDispatcher>) -> ResponseResult<()> {
    let Some(text) = msg.text().map(str::trim) else {
        return Ok(());
    };
    let chat_id = msg.chat.id;

    let platform = classify(text);
    if platform == Platform::Unknown {
        log::warn!("unhandled message from chat {}: {}", chat_id, text);
        bot.send_message(chat_id, "Send me an Instagram, Twitter/X or TikTok video link.")
            .await?;
        return Ok(());
    }

    log::info!("received {} URL from chat {}: {}", platform, chat_id, text);
    bot.send_message(chat_id, format!("⏳ Downloading from {}...", platform))
        .await?;

    match dispatcher.dispatch(text).await {
        Ok(path) => {
            let sent = send_video_file(&bot, chat_id, &path).await;
            // Delete only after the send attempt completed, success or not
            dispatcher.finish(&path);
            if let Err(e) = sent {
                log::error!("delivery to chat {} failed ({}): {}", chat_id, path.display(), e);
                bot.send_message(chat_id, e.user_message()).await?;
            }
        }
        Err(e) => {
            log::warn!("dispatch failed [{}] for {}: {}", e.subcategory(), text, e);
            bot.send_message(chat_id, e.user_message()).await?;
        }
    }

    Ok(())
}
