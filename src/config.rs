// src/config.rs

use std::{env, fmt, str::FromStr, time::Duration};

use dotenvy::dotenv;

use crate::services::generator::{CountPolicy, GeneratorConfig};

/// Upper bound on `numQuestions` accepted from a client.
pub const MAX_QUESTIONS: u32 = 50;
/// Upper bound on the topic length, in characters.
pub const MAX_TOPIC_LENGTH: u64 = 200;
/// Every generated question carries exactly this many options.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// Upper bound on extra attempts per batch, whatever `QUIZ_MAX_RETRIES` says.
pub const MAX_RETRY_BUDGET: u32 = 5;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo-1106";

#[derive(Clone)]
pub struct Config {
    /// Upstream credential. `None` is not fatal at startup; requests fail with 500 instead.
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub temperature: f32,

    pub llm_timeout: Duration,
    pub batch_size: u32,
    pub max_retries: u32,
    pub retry_backoff: Duration,
    pub count_policy: CountPolicy,

    pub bind_addr: String,
    pub cors_origins: Vec<String>,
    /// Seconds to replenish one request permit per client IP. Rate limiting is off when unset.
    pub rate_limit_replenish_secs: Option<u64>,
    pub rate_limit_burst: u32,

    pub rust_log: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: DEFAULT_BASE_URL.to_string(),
            openai_model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            llm_timeout: Duration::from_millis(8000),
            batch_size: 5,
            max_retries: 2,
            retry_backoff: Duration::from_millis(500),
            count_policy: CountPolicy::Strict,
            bind_addr: "0.0.0.0:3000".to_string(),
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            rate_limit_replenish_secs: None,
            rate_limit_burst: 5,
            rust_log: "info".to_string(),
        }
    }
}

// Hand-written so the API key never ends up in a log line.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("openai_base_url", &self.openai_base_url)
            .field("openai_model", &self.openai_model)
            .field("temperature", &self.temperature)
            .field("llm_timeout", &self.llm_timeout)
            .field("batch_size", &self.batch_size)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff", &self.retry_backoff)
            .field("count_policy", &self.count_policy)
            .field("bind_addr", &self.bind_addr)
            .field("cors_origins", &self.cors_origins)
            .field("rate_limit_replenish_secs", &self.rate_limit_replenish_secs)
            .field("rate_limit_burst", &self.rate_limit_burst)
            .field("rust_log", &self.rust_log)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let defaults = Self::default();

        let openai_api_key = env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        let openai_base_url = env::var("OPENAI_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.openai_base_url);

        let openai_model = env::var("OPENAI_MODEL").unwrap_or(defaults.openai_model);

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|raw| parse_origins(&raw))
            .unwrap_or(defaults.cors_origins);

        let rate_limit_replenish_secs = env::var("RATE_LIMIT_REPLENISH_SECS")
            .ok()
            .and_then(|raw| parse_or_warn("RATE_LIMIT_REPLENISH_SECS", &raw))
            .filter(|secs: &u64| *secs > 0);

        // A zero batch size would never make progress.
        let batch_size = env_or("QUIZ_BATCH_SIZE", defaults.batch_size).max(1);

        Self {
            openai_api_key,
            openai_base_url,
            openai_model,
            temperature: env_or("OPENAI_TEMPERATURE", defaults.temperature),
            llm_timeout: Duration::from_millis(env_or("LLM_TIMEOUT_MS", 8000)),
            batch_size,
            max_retries: cap_retries(env_or("QUIZ_MAX_RETRIES", defaults.max_retries)),
            retry_backoff: Duration::from_millis(env_or("QUIZ_RETRY_BACKOFF_MS", 500)),
            count_policy: env_or("QUIZ_COUNT_POLICY", defaults.count_policy),
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            cors_origins,
            rate_limit_replenish_secs,
            rate_limit_burst: env_or("RATE_LIMIT_BURST", defaults.rate_limit_burst),
            rust_log: env::var("RUST_LOG").unwrap_or(defaults.rust_log),
        }
    }

    /// Orchestrator settings derived from this configuration.
    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            batch_size: self.batch_size,
            max_retries: self.max_retries,
            retry_backoff: self.retry_backoff,
            call_timeout: self.llm_timeout,
            count_policy: self.count_policy,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => parse_or_warn(key, &raw).unwrap_or(default),
        Err(_) => default,
    }
}

fn parse_or_warn<T: FromStr>(key: &str, raw: &str) -> Option<T> {
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid value for {}: {:?}", key, raw);
            None
        }
    }
}

fn cap_retries(requested: u32) -> u32 {
    if requested > MAX_RETRY_BUDGET {
        tracing::warn!(
            "QUIZ_MAX_RETRIES={} exceeds the limit, using {}",
            requested,
            MAX_RETRY_BUDGET
        );
    }
    requested.min(MAX_RETRY_BUDGET)
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
