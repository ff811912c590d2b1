//! Telegram bot that turns media links into cobalt download buttons.

pub mod cobalt;
pub mod commands;
pub mod config;
pub mod download_button;
pub mod error;
pub mod handler;
pub mod markup;
pub mod operator_log;
pub mod response;
pub mod surface;
pub mod telegram;

pub use commands::{Command, CommandParser, Invocation};
pub use config::Config;
pub use handler::{CommandHandler, HandlerSettings, Outcome};
pub use surface::{ButtonView, ChatSurface, HelpCard, Origin, SentMessage};
pub use telegram::TelegramClient;
