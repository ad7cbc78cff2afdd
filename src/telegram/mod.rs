//! Telegram bot integration

pub mod bot;
pub mod handlers;

pub use bot::{create_bot, setup_bot_commands, Bot, Command};
pub use handlers::{handle_command, handle_message};
