//! Capture-Watch: per-tab detection of page-side audio, video and screen capture.

mod app;
mod app_command;
mod badge_indicator;
mod config;
mod demo;
mod error;
mod query_consumer;
mod server;
mod sessions;
#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    badge_indicator::BadgeIndicator,
    demo::DemoSession,
    error::{AppError, Result as AppResult},
    query_consumer::{ConsumerView, QueryConsumer},
    sessions::TabSessions,
};

use crate::config::Config;

use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "capture_watch=debug,capture_watch_core=debug";
const LOG_FILE_NAME: &str = "capture-watch.log";

/// Console logging plus a daily JSON log file in the data directory.
///
/// The returned guard flushes the file writer when dropped.
fn init_tracing() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let (file_layer, guard) = match Config::log_dir() {
        Some(log_dir) => {
            let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().json().with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    guard
}

/// Application entry point.
fn main() {
    let _log_guard = init_tracing();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config: {:?}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {:?}", e);
        std::process::exit(1);
    }

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {:?}", e);
            std::process::exit(1);
        }
    };

    rt.block_on(async {
        let app = App::new(config);
        if let Err(e) = app.run().await {
            error!(error = ?e, "App error");
        }
    });

    info!("Exiting");
}
