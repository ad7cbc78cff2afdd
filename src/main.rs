use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use teloxide::dispatching::{HandlerExt, UpdateFilterExt};
use teloxide::prelude::*;

use cliprelay::core::{config, init_logger};
use cliprelay::download::source::InstagramCredentials;
use cliprelay::download::{DownloadDispatcher, ScratchDir};
use cliprelay::telegram::{create_bot, handle_command, handle_message, setup_bot_commands, Command};

/// Main entry point for the Telegram bot
///
/// # Errors
/// Returns an error if initialization fails (logging, scratch directory,
/// bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env if present, before any config
    // statics are read
    let _ = dotenv();

    init_logger(&config::LOG_FILE_PATH)?;

    // Catch panics from handler tasks so a single bad request cannot take
    // the process down silently
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
    }));

    let scratch = ScratchDir::create(&config::DOWNLOAD_FOLDER)?;
    log::info!("Scratch directory: {}", scratch.path().display());

    let credentials = InstagramCredentials::from_env();
    if credentials.is_empty() {
        log::warn!("INSTAGRAM_USERNAME / INSTAGRAM_PASSWORD not set; Instagram downloads will fail");
    }

    let dispatcher = Arc::new(DownloadDispatcher::new(scratch, credentials));

    let bot = create_bot()?;
    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to register bot commands: {}", e);
    }

    log::info!("Starting cliprelay bot");

    let handler = Update::filter_message()
        .branch(dptree::entry().filter_command::<Command>().endpoint(handle_command))
        .branch(dptree::endpoint(handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![dispatcher])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
