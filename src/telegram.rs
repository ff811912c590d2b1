//! Telegram chat surface using teloxide.

use async_trait::async_trait;
use reqwest::Url;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, MessageId, ParseMode, ReplyParameters};
use tracing::{debug, warn};

use crate::commands::ROUTES;
use crate::markup::escape_html;
use crate::surface::{ButtonView, ChatSurface, HelpCard, Origin, SentMessage};

/// Text of the message that carries the download button.
const BUTTON_CAPTION: &str = "your file is ready.";

/// Telegram API client.
pub struct TelegramClient {
    bot: Bot,
}

impl TelegramClient {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// Publish the routing table as the bot's command menu.
    pub async fn register_commands(&self) -> Result<(), String> {
        let commands: Vec<teloxide::types::BotCommand> = ROUTES
            .iter()
            .map(|r| teloxide::types::BotCommand::new(r.name, r.description))
            .collect();

        self.bot.set_my_commands(commands).await.map_err(|e| {
            let msg = format!("Failed to register commands: {e}");
            warn!("{}", msg);
            msg
        })?;

        Ok(())
    }

    async fn reply_formatted(&self, to: &Origin, html: &str) -> Result<SentMessage, String> {
        self.bot
            .send_message(ChatId(to.chat_id), html)
            .reply_parameters(ReplyParameters::new(MessageId(to.message_id as i32)))
            .parse_mode(ParseMode::Html)
            .await
            .map(sent)
            .map_err(|e| {
                let msg = format!("Failed to send: {e}");
                warn!("{}", msg);
                msg
            })
    }
}

fn sent(msg: Message) -> SentMessage {
    SentMessage {
        chat_id: msg.chat.id.0,
        message_id: msg.id.0 as i64,
    }
}

/// Telegram can't grey out a URL button, so a disabled view keeps its
/// "expired" label and points at the landing page only.
fn keyboard(button: &ButtonView) -> Result<InlineKeyboardMarkup, String> {
    let url = Url::parse(&button.url).map_err(|e| format!("Invalid button url '{}': {e}", button.url))?;
    Ok(InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::url(
        button.label.clone(),
        url,
    )]]))
}

fn render_help(help: &HelpCard) -> String {
    let mut html = format!("<b>{}</b>\n{}", escape_html(&help.title), help.description);
    for (name, value) in &help.fields {
        html.push_str(&format!(
            "\n\n<b>{}</b>\n{}",
            escape_html(name),
            escape_html(value)
        ));
    }
    html
}

#[async_trait]
impl ChatSurface for TelegramClient {
    async fn reply_html(&self, to: &Origin, html: &str) -> Result<SentMessage, String> {
        self.reply_formatted(to, html).await
    }

    async fn reply_button(&self, to: &Origin, button: &ButtonView) -> Result<SentMessage, String> {
        let markup = keyboard(button)?;

        self.bot
            .send_message(ChatId(to.chat_id), BUTTON_CAPTION)
            .reply_parameters(ReplyParameters::new(MessageId(to.message_id as i32)))
            .reply_markup(markup)
            .await
            .map(sent)
            .map_err(|e| {
                let msg = format!("Failed to send button: {e}");
                warn!("{}", msg);
                msg
            })
    }

    async fn edit_button(&self, message: &SentMessage, button: &ButtonView) -> Result<(), String> {
        debug!(
            "Editing button on msg {} in chat {} -> {}",
            message.message_id, message.chat_id, button.label
        );
        let markup = keyboard(button)?;

        self.bot
            .edit_message_reply_markup(ChatId(message.chat_id), MessageId(message.message_id as i32))
            .reply_markup(markup)
            .await
            .map_err(|e| format!("Failed to edit button: {e}"))?;

        Ok(())
    }

    async fn reply_help(&self, to: &Origin, help: &HelpCard) -> Result<SentMessage, String> {
        self.reply_formatted(to, &render_help(help)).await
    }
}
