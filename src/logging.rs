//! Logging configuration for EventRAG

use crate::Result;
use std::path::Path;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

/// Initialize logging system with file output
pub fn init_logging() -> Result<()> {
    init_logging_with_config(None)
}

/// Initialize logging with configuration
pub fn init_logging_with_config(config: Option<&crate::config::AppConfig>) -> Result<()> {
    let env_filter = if let Some(config) = config {
        let level = config.log_level();
        EnvFilter::new(&format!("{},eventrag={}", level, level))
    } else {
        // Fallback to environment variable or default
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,eventrag=debug"))
    };

    let level = config.map_or("info", |c| c.log_level());
    init_with_filter(env_filter, level)
}

/// Initialize logging with custom log level
pub fn init_logging_with_level(level: &str) -> Result<()> {
    let env_filter = EnvFilter::new(&format!("{},eventrag={}", level, level));
    init_with_filter(env_filter, level)
}

fn init_with_filter(env_filter: EnvFilter, level: &str) -> Result<()> {
    // Create logs directory if it doesn't exist
    let logs_dir = Path::new("logs");
    if !logs_dir.exists() {
        std::fs::create_dir_all(logs_dir)?;
    }

    let file_appender = tracing_appender::rolling::daily("logs", "eventrag.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(non_blocking)
        .with_ansi(false); // No colors in file

    Registry::default()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    tracing::info!(
        "Logging initialized with level: {} - console and file output enabled",
        level
    );
    tracing::info!("Log files will be saved to: logs/eventrag.log.YYYY-MM-DD");

    // Keep the appender guard alive for the lifetime of the process
    std::mem::forget(_guard);

    Ok(())
}

/// Initialize simple logging for testing
pub fn init_simple_logging() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_max_level(tracing::Level::INFO)
        .init();

    tracing::info!("Simple logging initialized");
    Ok(())
}
