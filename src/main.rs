use std::path::PathBuf;
use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{error, info, warn};
use tracing_subscriber::prelude::*;

use cobaltgram::commands::help_card;
use cobaltgram::config::TOKEN_VAR;
use cobaltgram::operator_log::OperatorLogLayer;
use cobaltgram::{cobalt, CommandHandler, CommandParser, Config, HandlerSettings, Origin, TelegramClient};

struct BotState {
    parser: CommandParser,
    handler: CommandHandler<TelegramClient>,
}

impl BotState {
    async fn new(config: &Config, bot: &Bot) -> Self {
        let bot_username = match bot.get_me().await {
            Ok(me) => {
                info!("Bot user ID: {}, username: @{}", me.id, me.username());
                Some(me.username().to_string())
            }
            Err(e) => {
                warn!("Failed to get bot info, mentions disabled: {e}");
                None
            }
        };

        let telegram = Arc::new(TelegramClient::new(bot.clone()));
        telegram.register_commands().await.ok();

        let parser = CommandParser::new(config.command_prefixes.clone(), bot_username.clone());
        let settings = HandlerSettings {
            button_timeout: config.button_timeout,
            site_url: config.site_url.clone(),
            operator_contact: config.operator_contact.clone(),
            help: help_card(bot_username.as_deref(), &config.site_url, parser.display_prefix()),
        };
        let handler = CommandHandler::new(telegram, cobalt::Client::new(config.api_url.clone()), settings);

        Self { parser, handler }
    }
}

#[tokio::main]
async fn main() {
    // A missing .env is fine; TOKEN may come from the real environment.
    dotenvy::dotenv().ok();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = match Config::load(config_path.as_deref(), std::env::var(TOKEN_VAR).ok()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };

    let bot = Bot::new(&config.telegram_bot_token);

    // Setup logging
    let log_dir = config.data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).ok();
    let log_file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("cobaltgram.log"))
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open log file in {}: {e}", log_dir.display());
            std::process::exit(1);
        }
    };
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(config.log_chat_id.map(|chat_id| OperatorLogLayer::new(bot.clone(), chat_id)))
        .init();

    info!("🚀 Starting cobaltgram...");
    match &config_path {
        Some(path) => info!("Loaded config from {}", path.display()),
        None => info!("No config file given, using defaults"),
    }
    info!("Cobalt endpoint: {}", config.api_url);

    let state = Arc::new(BotState::new(&config, &bot).await);

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn handle_message(msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let author = msg
        .from
        .as_ref()
        .map(|u| u.username.clone().unwrap_or_else(|| u.first_name.clone()))
        .unwrap_or_else(|| "unknown".to_string());
    let origin = Origin {
        chat_id: msg.chat.id.0,
        message_id: msg.id.0 as i64,
        author,
    };

    let Some(invocation) = state.parser.parse(text, origin) else {
        return Ok(());
    };

    // The user has already been told; this is the operator's copy.
    if let Err(e) = state.handler.handle(&invocation).await {
        error!(
            "{} from {} in chat {} failed: {e}",
            invocation.command.name(),
            invocation.origin.author,
            invocation.origin.chat_id
        );
    }

    Ok(())
}
