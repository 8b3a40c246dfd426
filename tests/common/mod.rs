// tests/common/mod.rs

#![allow(dead_code)]

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode},
};
use quiz_backend::{
    clients::llm::{ChatCompletion, LlmError},
    config::Config,
    routes,
    services::generator::{CountPolicy, GeneratorConfig, QuizGenerator},
    state::AppState,
};
use regex::Regex;
use serde_json::{Value, json};
use tower::ServiceExt;

type Reply = dyn Fn(usize, &str) -> Result<String, LlmError> + Send + Sync;

/// In-process stand-in for the chat-completion API.
/// `reply` receives the 0-based call index and the user prompt.
pub struct ScriptedLlm {
    reply: Box<Reply>,
    delay: Option<Duration>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new(
        reply: impl Fn(usize, &str) -> Result<String, LlmError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            reply: Box::new(reply),
            delay: None,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            reply: Box::new(|_: usize, prompt: &str| {
                Ok(quiz_json("Slow", requested_count(prompt)))
            }),
            delay: Some(delay),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatCompletion for ScriptedLlm {
    async fn complete(&self, _system: &str, user: &str) -> Result<String, LlmError> {
        let index = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(user.to_string());
            prompts.len() - 1
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.reply)(index, user)
    }
}

/// Number of questions a prompt asks for.
pub fn requested_count(prompt: &str) -> usize {
    let re = Regex::new(r"Generate (\d+) multiple choice").unwrap();
    re.captures(prompt)
        .and_then(|caps| caps[1].parse().ok())
        .expect("prompt states a question count")
}

/// A well-formed completion with `n` questions titled `"{prefix} {i}"`.
pub fn quiz_json(prefix: &str, n: usize) -> String {
    let questions: Vec<Value> = (1..=n)
        .map(|i| {
            json!({
                "question": format!("{} {}", prefix, i),
                "options": ["Red", "Green", "Blue", "Yellow"],
                "correctAnswer": "Blue",
            })
        })
        .collect();
    json!({ "questions": questions }).to_string()
}

pub fn test_generator_config() -> GeneratorConfig {
    GeneratorConfig {
        batch_size: 5,
        max_retries: 2,
        retry_backoff: Duration::ZERO,
        call_timeout: Duration::from_secs(5),
        count_policy: CountPolicy::Strict,
    }
}

pub fn app_with(client: Arc<dyn ChatCompletion>, generator_config: GeneratorConfig) -> Router {
    let config = Config {
        openai_api_key: Some("sk-test".to_string()),
        rust_log: "error".to_string(),
        ..Config::default()
    };
    app_with_config(client, generator_config, config)
}

/// Same as `app_with`, with the per-IP limiter on: `burst` requests, then one per minute.
pub fn rate_limited_app(client: Arc<dyn ChatCompletion>, burst: u32) -> Router {
    let config = Config {
        openai_api_key: Some("sk-test".to_string()),
        rate_limit_replenish_secs: Some(60),
        rate_limit_burst: burst,
        rust_log: "error".to_string(),
        ..Config::default()
    };
    app_with_config(client, test_generator_config(), config)
}

fn app_with_config(
    client: Arc<dyn ChatCompletion>,
    generator_config: GeneratorConfig,
    config: Config,
) -> Router {
    let generator = QuizGenerator::new(client, generator_config);
    let state = AppState {
        config,
        generator: Some(Arc::new(generator)),
    };
    routes::create_router(state)
}

pub fn unconfigured_app() -> Router {
    let state = AppState {
        config: Config::default(),
        generator: None,
    };
    routes::create_router(state)
}

/// Sends a raw body to `POST /api/generate-quiz` and returns status and JSON body.
pub async fn post_raw(app: Router, body: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/generate-quiz")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .expect("router never fails");

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

pub async fn post_quiz(app: Router, body: Value) -> (StatusCode, Value) {
    post_raw(app, &body.to_string()).await
}

/// Posts a quiz request as if it arrived over TCP from `peer`, which the limiter keys on.
pub async fn post_quiz_from(app: Router, peer: SocketAddr, body: Value) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method("POST")
        .uri("/api/generate-quiz")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    request.extensions_mut().insert(ConnectInfo(peer));

    let response = app.oneshot(request).await.expect("router never fails");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}
