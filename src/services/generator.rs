// src/services/generator.rs

//! Quiz generation orchestrator.
//!
//! A request is split into fixed-size batches that are generated one after
//! another. Each batch gets its own retry budget; a batch that runs out of
//! attempts fails the whole request and no partial quiz is returned.

use std::{fmt, str::FromStr, sync::Arc, time::Duration};

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
    clients::llm::{ChatCompletion, LlmError},
    models::quiz::{QuizQuestion, QuizRequest},
    services::{
        prompt::{build_batch_prompt, system_prompt},
        validation::{ValidationError, validate_response},
    },
};

/// What to do when a batch returns a different number of questions than asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountPolicy {
    /// The count must match exactly; anything else fails the attempt.
    Strict,
    /// Extra questions are dropped and a short, non-empty batch is accepted.
    Truncate,
}

impl fmt::Display for CountPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountPolicy::Strict => f.write_str("strict"),
            CountPolicy::Truncate => f.write_str("truncate"),
        }
    }
}

impl FromStr for CountPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(CountPolicy::Strict),
            "truncate" => Ok(CountPolicy::Truncate),
            other => Err(format!("unknown count policy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Maximum number of questions requested per model call.
    pub batch_size: u32,
    /// Extra attempts per batch after the first one.
    pub max_retries: u32,
    /// Fixed delay between two attempts of the same batch.
    pub retry_backoff: Duration,
    /// Budget for a single model call.
    pub call_timeout: Duration,
    pub count_policy: CountPolicy,
}

/// One slice of a request, generated by a single model call. `number` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch {
    pub number: usize,
    pub size: u32,
}

/// Splits `count` questions into batches of at most `batch_size`, remainder last.
pub fn plan_batches(count: u32, batch_size: u32) -> Vec<Batch> {
    let batch_size = batch_size.max(1);
    let mut batches = Vec::new();
    let mut remaining = count;

    while remaining > 0 {
        let size = remaining.min(batch_size);
        batches.push(Batch {
            number: batches.len() + 1,
            size,
        });
        remaining -= size;
    }

    batches
}

/// Why a single attempt of a batch failed. Every variant is retryable.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Model returned no questions")]
    NoQuestions,
    #[error("Expected {expected} questions but received {actual}")]
    CountMismatch { expected: u32, actual: usize },
}

impl BatchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, BatchError::Llm(LlmError::Timeout(_)))
    }
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Request timed out while generating batch {batch}")]
    Timeout { batch: usize },
    #[error("Failed to generate batch {batch} after {attempts} attempts: {source}")]
    BatchFailed {
        batch: usize,
        attempts: u32,
        #[source]
        source: BatchError,
    },
}

pub struct QuizGenerator {
    client: Arc<dyn ChatCompletion>,
    config: GeneratorConfig,
}

impl QuizGenerator {
    pub fn new(client: Arc<dyn ChatCompletion>, config: GeneratorConfig) -> Self {
        Self { client, config }
    }

    /// Generates every question of `request`, batch by batch, in order.
    pub async fn generate(
        &self,
        request: &QuizRequest,
    ) -> Result<Vec<QuizQuestion>, GenerationError> {
        let batches = plan_batches(request.question_count, self.config.batch_size);
        info!(
            "Generating {} questions about {:?} ({}) in {} batch(es)",
            request.question_count,
            request.topic,
            request.difficulty,
            batches.len()
        );

        let mut questions = Vec::with_capacity(request.question_count as usize);
        for batch in &batches {
            let generated = self.generate_batch(request, batch, batches.len()).await?;
            questions.extend(generated);
        }

        Ok(questions)
    }

    async fn generate_batch(
        &self,
        request: &QuizRequest,
        batch: &Batch,
        total_batches: usize,
    ) -> Result<Vec<QuizQuestion>, GenerationError> {
        let prompt = build_batch_prompt(request, batch, total_batches);
        let attempts = self.config.max_retries.saturating_add(1);

        let mut attempt = 1;
        loop {
            debug!(
                "Batch {}/{}: requesting {} questions (attempt {}/{})",
                batch.number, total_batches, batch.size, attempt, attempts
            );

            let err = match self.attempt(&prompt, batch.size).await {
                Ok(questions) => return Ok(questions),
                Err(err) => err,
            };

            if attempt >= attempts {
                error!(
                    "Batch {} failed after {} attempts: {}",
                    batch.number, attempts, err
                );
                return Err(if err.is_timeout() {
                    GenerationError::Timeout {
                        batch: batch.number,
                    }
                } else {
                    GenerationError::BatchFailed {
                        batch: batch.number,
                        attempts,
                        source: err,
                    }
                });
            }

            warn!(
                "Batch {} attempt {}/{} failed: {}. Retrying in {:?}...",
                batch.number, attempt, attempts, err, self.config.retry_backoff
            );
            tokio::time::sleep(self.config.retry_backoff).await;
            attempt += 1;
        }
    }

    async fn attempt(&self, prompt: &str, expected: u32) -> Result<Vec<QuizQuestion>, BatchError> {
        let call = self.client.complete(system_prompt(), prompt);
        let raw = tokio::time::timeout(self.config.call_timeout, call)
            .await
            .map_err(|_| LlmError::Timeout(self.config.call_timeout.as_millis()))??;

        let questions = validate_response(&raw)?;
        self.apply_count_policy(questions, expected)
    }

    fn apply_count_policy(
        &self,
        mut questions: Vec<QuizQuestion>,
        expected: u32,
    ) -> Result<Vec<QuizQuestion>, BatchError> {
        if questions.is_empty() {
            return Err(BatchError::NoQuestions);
        }

        let expected_len = expected as usize;
        match self.config.count_policy {
            CountPolicy::Strict if questions.len() != expected_len => {
                Err(BatchError::CountMismatch {
                    expected,
                    actual: questions.len(),
                })
            }
            CountPolicy::Truncate if questions.len() > expected_len => {
                debug!(
                    "Dropping {} extra questions",
                    questions.len() - expected_len
                );
                questions.truncate(expected_len);
                Ok(questions)
            }
            _ => Ok(questions),
        }
    }
}
