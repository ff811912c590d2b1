//! Runs routed commands: cobalt relay, reply, button expiry, error reporting.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cobalt::{self, ConversionRequest};
use crate::commands::{Command, Invocation};
use crate::download_button::{ButtonState, DownloadButton};
use crate::error::CommandError;
use crate::markup::{escape_html, markdown_to_html};
use crate::response::{ConversionResult, interpret};
use crate::surface::{ChatSurface, HelpCard, Origin};

/// Handler settings that come from config.
#[derive(Debug, Clone)]
pub struct HandlerSettings {
    pub button_timeout: Duration,
    /// Public cobalt site; expired buttons point here.
    pub site_url: String,
    pub operator_contact: String,
    pub help: HelpCard,
}

/// What a successful invocation ended with.
#[derive(Debug)]
pub enum Outcome {
    /// Button sent; the task resolves once it has expired.
    Delivered { expiry: JoinHandle<ButtonState> },
    /// Cobalt refused the link and the user was told why.
    Rejected { status_code: u16 },
    Help,
}

pub struct CommandHandler<S: ?Sized> {
    surface: Arc<S>,
    cobalt: cobalt::Client,
    settings: HandlerSettings,
}

impl<S> CommandHandler<S>
where
    S: ChatSurface + ?Sized + 'static,
{
    pub fn new(surface: Arc<S>, cobalt: cobalt::Client, settings: HandlerSettings) -> Self {
        Self {
            surface,
            cobalt,
            settings,
        }
    }

    /// Run one invocation.
    ///
    /// Download failures are reported in the chat and then returned, so the
    /// caller still sees (and logs) the original error.
    pub async fn handle(&self, invocation: &Invocation) -> Result<Outcome, CommandError> {
        info!(
            "{} from {} in chat {}: {:?}",
            invocation.command.name(),
            invocation.origin.author,
            invocation.origin.chat_id,
            invocation.args
        );

        let audio_only = match invocation.command {
            Command::Help => return self.help(&invocation.origin).await,
            Command::Audio => true,
            Command::Video => false,
        };

        match self.download(invocation, audio_only).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.report(&invocation.origin, &e).await;
                Err(e)
            }
        }
    }

    async fn help(&self, origin: &Origin) -> Result<Outcome, CommandError> {
        self.surface
            .reply_help(origin, &self.settings.help)
            .await
            .map_err(CommandError::Reply)?;
        Ok(Outcome::Help)
    }

    async fn download(&self, invocation: &Invocation, audio_only: bool) -> Result<Outcome, CommandError> {
        let origin = &invocation.origin;
        let target = invocation
            .args
            .first()
            .ok_or(CommandError::MissingArgument("url"))?;
        validate_target(target)?;

        let raw = self
            .cobalt
            .send(&ConversionRequest::new(target.as_str(), audio_only))
            .await?;

        match interpret(&raw)? {
            ConversionResult::Success { download_url } => {
                let button = DownloadButton::new(
                    download_url,
                    self.settings.button_timeout,
                    self.settings.site_url.as_str(),
                );
                let sent = self
                    .surface
                    .reply_button(origin, &button.view())
                    .await
                    .map_err(CommandError::Reply)?;
                info!("{} downloaded {}", origin.author, button.link());

                let surface = self.surface.clone();
                let expiry =
                    tokio::spawn(async move { button.expire(surface.as_ref(), &sent).await.state() });
                Ok(Outcome::Delivered { expiry })
            }
            ConversionResult::Failure {
                message,
                status_code,
            } => {
                info!("cobalt refused {target} ({status_code}): {message}");
                let text = ConversionResult::failure_text(&message, status_code);
                self.surface
                    .reply_html(origin, &markdown_to_html(&text))
                    .await
                    .map_err(CommandError::Reply)?;
                Ok(Outcome::Rejected { status_code })
            }
        }
    }

    async fn report(&self, origin: &Origin, error: &CommandError) {
        let text = format!(
            "there was an error with your command: <code>{}</code>",
            escape_html(&error.user_message(&self.settings.operator_contact))
        );
        if let Err(e) = self.surface.reply_html(origin, &text).await {
            warn!("Failed to report error to chat {}: {e}", origin.chat_id);
        }
    }
}

fn validate_target(target: &str) -> Result<(), CommandError> {
    match Url::parse(target) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(CommandError::BadArgument(format!("\"{target}\" is not a valid link."))),
    }
}
