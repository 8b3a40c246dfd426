// src/utils/logging.rs

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

/// Installs the global subscriber: stdout plus a daily rolling file under `logs/`.
///
/// The returned guard flushes the file writer on drop, keep it alive in `main`.
pub fn init_tracing(rust_log: &str) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    guard
}

/// Logs the effective settings once at startup.
pub fn log_startup(config: &Config) {
    tracing::info!(
        "LLM model: {} at {}",
        config.openai_model,
        config.openai_base_url
    );
    tracing::info!(
        "Batch size {}, {} retries, {:?} backoff, {:?} per-call timeout, {} count policy",
        config.batch_size,
        config.max_retries,
        config.retry_backoff,
        config.llm_timeout,
        config.count_policy
    );
    match config.rate_limit_replenish_secs {
        Some(secs) => tracing::info!(
            "Rate limiting enabled: one request per {}s per IP, burst {}",
            secs,
            config.rate_limit_burst
        ),
        None => tracing::info!("Rate limiting disabled"),
    }
    if config.openai_api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; quiz generation requests will fail with 500");
    }
}
