use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

const LOG_FILE_PREFIX: &str = "alphatalk.log";

/// Keeps the non-blocking file writer alive for the process lifetime.
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

/// Stdout logging always; a daily-rolling file mirror when the config
/// carries a log directory.
pub fn init_tracing(config: &Config) -> Option<FileLogGuard> {
    let env_filter =
        EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true));

    let Some(log_dir) = config.log_dir.as_deref() else {
        registry.init();
        return None;
    };

    if let Err(err) = std::fs::create_dir_all(log_dir) {
        eprintln!("failed to create log directory {log_dir}: {err}");
        registry.init();
        return None;
    }

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
    registry
        .with(
            fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    Some(FileLogGuard { _guard: guard })
}
