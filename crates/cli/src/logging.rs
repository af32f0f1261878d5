use esm_core::config::{AppConfig, LogFormat};
use tracing::Level;

use crate::commands::{load_config, GlobalArgs};

/// Logs go to stderr; stdout carries only command payloads.
pub fn init_logging(config: &AppConfig) {
    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

pub fn init_from(global: &GlobalArgs) {
    match load_config(global) {
        Ok(config) => init_logging(&config),
        // the command itself reports the configuration failure
        Err(_) => init_logging(&AppConfig::default()),
    }
}
