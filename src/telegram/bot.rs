//! Bot initialization
//!
//! This module contains:
//! - Command enum definition
//! - Bot instance creation with a long-timeout HTTP client

use reqwest::ClientBuilder;
use teloxide::utils::command::BotCommands;

use crate::core::config;

/// The bot type used throughout the transport layer.
pub type Bot = teloxide::Bot;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "I can:")]
pub enum Command {
    #[command(description = "show the welcome message")]
    Start,
}

/// Creates a Bot instance from the configured token
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(anyhow::Error)` - Missing token or HTTP client build failure
pub fn create_bot() -> anyhow::Result<Bot> {
    let token = config::BOT_TOKEN.clone();
    if token.is_empty() {
        anyhow::bail!("BOT_TOKEN (or TELOXIDE_TOKEN) environment variable not set");
    }

    let client = ClientBuilder::new().timeout(config::network::timeout()).build()?;
    Ok(Bot::with_client(token, client))
}

/// Sets up bot commands in Telegram UI
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    use teloxide::prelude::*;
    use teloxide::types::BotCommand;

    bot.set_my_commands(vec![BotCommand::new("start", "show the welcome message")])
        .await?;

    Ok(())
}
