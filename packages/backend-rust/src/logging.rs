use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{env_bool, ConfigError};

#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    /// `EnvFilter` directive, e.g. `info` or `lexicon_backend=debug`
    pub level: String,
    pub file_logs: bool,
    pub dir: PathBuf,
}

impl LogConfig {
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            level: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            file_logs: env_bool(lookup, "ENABLE_FILE_LOGS", false)?,
            dir: lookup("LOG_DIR")
                .filter(|dir| !dir.trim().is_empty())
                .map_or_else(|| PathBuf::from("./logs"), PathBuf::from),
        })
    }
}

pub struct FileLogGuard {
    _guard: WorkerGuard,
}

pub fn init_tracing(config: &LogConfig) -> Option<FileLogGuard> {
    let env_filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(true);

    if config.file_logs {
        match std::fs::create_dir_all(&config.dir) {
            Ok(()) => {
                let file_appender = RollingFileAppender::new(Rotation::DAILY, &config.dir, "lexicon.log");
                let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
                let file_layer = fmt::layer()
                    .with_writer(file_writer)
                    .with_ansi(false)
                    .with_target(true);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(stdout_layer)
                    .with(file_layer)
                    .init();

                return Some(FileLogGuard { _guard: guard });
            }
            Err(err) => eprintln!("failed to create log directory {}: {err}", config.dir.display()),
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .init();

    None
}
