//! Logging configuration for icebreaker

use std::path::Path;

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::{
    self,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Registry;

use crate::config::AppConfig;
use crate::Result;

const LOG_FILE_PREFIX: &str = "icebreaker.log";

/// Initialize console and file logging from the `[logging]` section
///
/// `RUST_LOG` wins over the configured level when it is set.
pub fn init_logging(config: &AppConfig) -> Result<()> {
    let level = config.logging.level.as_str();
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{level},icebreaker={level}")));

    let backtrace = enable_backtrace(config.logging.backtrace);
    install(env_filter, &config.logging.log_dir, level)?;
    if backtrace {
        tracing::debug!("RUST_BACKTRACE enabled by logging.backtrace");
    }
    Ok(())
}

/// Turn on std backtraces for panics unless `RUST_BACKTRACE` is already set
fn enable_backtrace(enabled: bool) -> bool {
    if !enabled || std::env::var_os("RUST_BACKTRACE").is_some() {
        return false;
    }
    std::env::set_var("RUST_BACKTRACE", "1");
    true
}

fn install(env_filter: EnvFilter, log_dir: &str, level: &str) -> Result<()> {
    let logs_dir = Path::new(log_dir);
    if !logs_dir.exists() {
        std::fs::create_dir_all(logs_dir)?;
    }

    let file_appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Console output stays on stderr so CLI answers on stdout remain clean
    let console_layer = fmt::layer()
        .with_target(true)
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
        .with_ansi(false);

    Registry::default()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    tracing::info!("Logging initialized with level: {level} - console and file output enabled");
    tracing::info!("Log files will be saved to: {log_dir}/{LOG_FILE_PREFIX}.YYYY-MM-DD");

    // The worker must outlive main; dropping the guard would stop file output
    std::mem::forget(guard);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backtrace_left_alone_when_disabled() {
        assert!(!enable_backtrace(false));
    }

    #[test]
    fn test_backtrace_enabled_from_config() {
        enable_backtrace(true);
        assert!(std::env::var_os("RUST_BACKTRACE").is_some());
        // a second call never overrides an existing value
        assert!(!enable_backtrace(true));
    }
}
