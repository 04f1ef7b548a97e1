use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use dotenvy::dotenv;
use teloxide::prelude::*;
use tokio::time::sleep;

use wordkeeper::cli::{check_store, show_dictionary, Cli, Commands};
use wordkeeper::core::{config, init_logger, log_startup_configuration};
use wordkeeper::learning::{LearningEngine, Schedule};
use wordkeeper::llm::{LanguageModel, Unconfigured, YandexGpt};
use wordkeeper::storage::DictionaryStore;
use wordkeeper::telegram::{
    create_bot, schema, setup_bot_commands, Bot, CommandRouter, HandlerDeps, TelegramNotifier,
};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, store, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Set up global panic handler to log panics from spawned tasks
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
        if let Some(msg) = panic_info.payload().downcast_ref::<&str>() {
            log::error!("Panic message: {}", msg);
        }
    }));

    // .env has to be loaded before any config value is read
    let _ = dotenv();

    match cli.command {
        Some(Commands::Show { user, path }) => {
            println!("{}", show_dictionary(&store_path(path), user)?);
            Ok(())
        }
        Some(Commands::CheckStore { path }) => {
            println!("{}", check_store(&store_path(path))?);
            Ok(())
        }
        Some(Commands::Run) | None => {
            init_logger(&config::LOG_FILE_PATH)?;
            run_bot().await
        }
    }
}

fn store_path(path: Option<PathBuf>) -> PathBuf {
    path.unwrap_or_else(|| PathBuf::from(config::DICTIONARY_PATH.as_str()))
}

/// Runs the bot with long polling until Ctrl+C
async fn run_bot() -> Result<()> {
    let bot_init_start = std::time::Instant::now();
    log::info!("Starting bot...");
    log_startup_configuration();

    let store = Arc::new(
        DictionaryStore::open(config::DICTIONARY_PATH.as_str())
            .map_err(|e| anyhow::anyhow!("Failed to open dictionary store: {}", e))?,
    );
    let schedule = Schedule::from_env()?;

    let bot = create_bot()?;
    let bot_info = wait_for_bot_api(&bot).await?;
    let bot_username = bot_info.username.clone();
    let bot_id = bot_info.id;
    log::info!("Bot username: {:?}, Bot ID: {}", bot_username, bot_id);

    setup_bot_commands(&bot).await?;

    let model: Arc<dyn LanguageModel> = match YandexGpt::from_env()? {
        Some(client) => Arc::new(client),
        None => {
            log::warn!("YANDEX_OAUTH_TOKEN or YANDEX_FOLDER_ID not set, free-form questions will be declined");
            Arc::new(Unconfigured)
        }
    };

    let notifier = Arc::new(TelegramNotifier::new(bot.clone()));
    let engine = Arc::new(LearningEngine::new(Arc::clone(&store), notifier, schedule));
    let router = Arc::new(
        CommandRouter::new(Arc::clone(&store), Arc::clone(&engine), model)
            .with_bot_username(bot_username.clone().unwrap_or_default()),
    );

    let handler = schema(HandlerDeps::new(router, bot_username, bot_id));

    log::info!(
        "Bot initialization complete in {:.2}s",
        bot_init_start.elapsed().as_secs_f64()
    );

    let mut retry_count = 0;
    let max_retries = config::retry::MAX_DISPATCHER_RETRIES;

    // Run the dispatcher with retry logic
    loop {
        let bot_clone = bot.clone();
        let handler_clone = handler.clone();

        // A separate task isolates dispatcher panics; they surface through the JoinHandle
        let handle = tokio::spawn(async move {
            use teloxide::update_listeners::Polling;

            // Create polling listener that drops pending updates on start
            let listener = Polling::builder(bot_clone.clone()).drop_pending_updates().build();

            Dispatcher::builder(bot_clone, handler_clone)
                .dependencies(DependencyMap::new())
                .enable_ctrlc_handler()
                .build()
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("An error from the update listener"),
                )
                .await
        });

        match handle.await {
            Ok(()) => {
                log::info!("Dispatcher shutdown gracefully");
                break;
            }
            Err(join_err) if join_err.is_panic() => {
                log::error!("Dispatcher panicked: {}", join_err);
                if retry_count >= max_retries {
                    log::error!("Max retries reached after panic. Exiting...");
                    break;
                }
                retry_count += 1;
                log::info!(
                    "Retrying dispatcher connection after panic (attempt {}/{})...",
                    retry_count,
                    max_retries
                );
                exponential_backoff(retry_count).await;
            }
            Err(join_err) => {
                log::warn!("Dispatcher task was cancelled: {}", join_err);
                break;
            }
        }

        sleep(config::retry::dispatcher_delay()).await;
    }

    engine.shutdown().await;
    Ok(())
}

/// Calls `getMe` until the Bot API answers
///
/// Network errors are retried, anything else (bad token) fails right away.
async fn wait_for_bot_api(bot: &Bot) -> Result<teloxide::types::Me> {
    let mut attempt = 0;
    loop {
        match bot.get_me().await {
            Ok(info) => return Ok(info),
            Err(e) => {
                let is_retryable = matches!(e, teloxide::RequestError::Network(_) | teloxide::RequestError::Io(_))
                    || e.to_string().contains("restart");

                attempt += 1;
                if attempt >= config::retry::STARTUP_MAX_RETRIES || !is_retryable {
                    return Err(anyhow::anyhow!(
                        "Failed to connect to Bot API after {} attempt(s): {}",
                        attempt,
                        e
                    ));
                }

                log::warn!(
                    "Bot API not ready (attempt {}/{}): {}. Retrying in 5 seconds...",
                    attempt,
                    config::retry::STARTUP_MAX_RETRIES,
                    e
                );
                sleep(Duration::from_secs(5)).await;
            }
        }
    }
}

async fn exponential_backoff(retry_count: u32) {
    let delay = Duration::from_secs(config::retry::EXPONENTIAL_BACKOFF_BASE.pow(retry_count));
    sleep(delay).await;
}
