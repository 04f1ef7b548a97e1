//! Logging initialization and configuration checking
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - Startup diagnostics for the dictionary store, schedule and language model

use anyhow::Result;
use simplelog::*;
use std::fs::File;
use std::path::Path;

use crate::core::config;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let log_file = File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs what the bot is about to run with
///
/// Never logs secret values, only whether they are present.
pub fn log_startup_configuration() {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("Configuration Check");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let dict_path = config::DICTIONARY_PATH.as_str();
    if Path::new(dict_path).exists() {
        log::info!("DICTIONARY_PATH: {}", dict_path);
    } else {
        log::warn!("DICTIONARY_PATH: {} (not found, starting with an empty dictionary)", dict_path);
    }

    match config::learning::SCHEDULE_OVERRIDE.as_deref() {
        Some(raw) => log::info!("LEARNING_SCHEDULE_SECS: {}", raw),
        None => log::info!(
            "LEARNING_SCHEDULE_SECS: not set, using default {:?}",
            config::learning::DEFAULT_SCHEDULE_SECS
        ),
    }

    let has_oauth = config::llm::OAUTH_TOKEN.is_some();
    let has_folder = config::llm::FOLDER_ID.is_some();
    if has_oauth && has_folder {
        log::info!("Language model: configured ({})", config::llm::API_URL.as_str());
    } else {
        if !has_oauth {
            log::warn!("YANDEX_OAUTH_TOKEN: not set");
        }
        if !has_folder {
            log::warn!("YANDEX_FOLDER_ID: not set");
        }
        log::warn!("Free-form questions will be answered with an apology until both are set");
    }
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}
