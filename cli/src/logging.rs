//! Tracing setup for the docchat binary
//!
//! Logs go to <data dir>/docchat/logs/docchat.log unless verbose stderr
//! output is requested or the file cannot be opened.

use config::PathManager;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_FILTER: &str = "warn,docchat=info,cli=info";

fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Install the global subscriber. Keep the returned guard alive for the
/// lifetime of the program so buffered file output is flushed.
pub fn init_logging(verbose: bool, filter: Option<&str>) -> Option<WorkerGuard> {
    if verbose {
        init_stderr_logging("debug");
        return None;
    }

    let filter = filter.unwrap_or(DEFAULT_FILTER);
    let Some(path) = PathManager::log_file_path() else {
        init_stderr_logging(filter);
        return None;
    };

    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            eprintln!("[docchat] Failed to create log directory {:?}: {}", parent, e);
        }
    }

    match std::fs::OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let subscriber = tracing_subscriber::registry().with(env_filter(filter)).with(
                fmt::layer()
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            );
            match tracing::subscriber::set_global_default(subscriber) {
                Ok(()) => {
                    tracing::info!("Logging initialized, writing to {:?}", path);
                    Some(guard)
                }
                Err(e) => {
                    eprintln!("[docchat] Failed to set tracing subscriber: {}", e);
                    None
                }
            }
        }
        Err(e) => {
            eprintln!("[docchat] Failed to open log file {:?}: {}", path, e);
            init_stderr_logging(filter);
            None
        }
    }
}

fn init_stderr_logging(filter: &str) {
    let subscriber = tracing_subscriber::registry().with(env_filter(filter)).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true),
    );
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("[docchat] Failed to set tracing subscriber: {}", e);
    }
}
