//! Tracing setup for the binary.
//!
//! Lines go to stderr and, when a log file is configured, to that file through a
//! non-blocking writer. `RUST_LOG` overrides the configured level.

use std::path::Path;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter from `RUST_LOG`, falling back to `level`.
fn filter(level: &str) -> EnvFilter {
    filter_from(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref(), level)
}

/// First valid of `env`, `level`, then `info`.
fn filter_from(env: Option<&str>, level: &str) -> EnvFilter {
    env.filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .or_else(|| EnvFilter::try_new(level).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Installs the global subscriber.
///
/// The returned guard flushes the file writer on drop; keep it alive for the whole run.
///
/// # Errors
/// Fails if the log directory cannot be created or a subscriber is already installed.
pub fn init(level: &str, log_file: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;
            let name = path
                .file_name()
                .context("log file path has no file name")?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter(level))
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .context("initializing tracing")?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn configured_level_applies_without_env() {
        let f = filter_from(None, "debug");
        assert_eq!(f.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn env_wins_over_configured_level() {
        let f = filter_from(Some("warn,gitglow=trace"), "info");
        assert_eq!(f.max_level_hint(), Some(LevelFilter::TRACE));

        let blank = filter_from(Some("  "), "error");
        assert_eq!(blank.max_level_hint(), Some(LevelFilter::ERROR));
    }

    #[test]
    fn bad_level_falls_back() {
        let f = filter_from(Some("gitglow=loud"), "also=bogus");
        assert_eq!(f.max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn second_init_fails_without_panicking() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("gitglow.log");
        let first = init("info", Some(&path));
        let second = init("info", None);
        // Only one subscriber can be global per process.
        assert!(first.is_err() || second.is_err());
        if first.is_ok() {
            assert!(path.parent().unwrap().is_dir());
        }
    }
}
