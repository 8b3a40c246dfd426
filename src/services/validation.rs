// src/services/validation.rs

//! Structural checks on raw model output.
//!
//! The model is not trusted: its text is parsed and every question is
//! checked in order, stopping at the first violation.

use std::{collections::HashSet, fmt, sync::LazyLock};

use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::{config::OPTIONS_PER_QUESTION, models::quiz::QuizQuestion};

/// Matches a payload wrapped in a single Markdown code fence.
static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^```[A-Za-z]*\s*\n?(.*?)\n?\s*```$").expect("code fence pattern is valid")
});

/// The rule a question broke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionRule {
    NotAnObject,
    MissingQuestionText,
    OptionsNotArray,
    MissingCorrectAnswer,
    NonStringOption,
    WrongOptionCount(usize),
    DuplicateOption(String),
    AnswerNotInOptions,
}

impl fmt::Display for QuestionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionRule::NotAnObject => write!(f, "is not an object"),
            QuestionRule::MissingQuestionText => write!(f, "is missing question text"),
            QuestionRule::OptionsNotArray => write!(f, "options is not an array"),
            QuestionRule::MissingCorrectAnswer => write!(f, "is missing correctAnswer"),
            QuestionRule::NonStringOption => write!(f, "has an option that is not a string"),
            QuestionRule::WrongOptionCount(n) => write!(
                f,
                "does not have exactly {} options (got {})",
                OPTIONS_PER_QUESTION, n
            ),
            QuestionRule::DuplicateOption(opt) => write!(f, "has duplicate option '{}'", opt),
            QuestionRule::AnswerNotInOptions => write!(f, "correct answer is not in options"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Malformed response: {0}")]
    Malformed(String),
    #[error("Invalid response format: missing questions array")]
    MissingQuestions,
    /// `index` is 1-based.
    #[error("Question {index} {rule}")]
    InvalidQuestion { index: usize, rule: QuestionRule },
}

/// Parses and validates one model completion.
///
/// Returns the questions in source order, or the first violation found.
pub fn validate_response(raw: &str) -> Result<Vec<QuizQuestion>, ValidationError> {
    let payload = strip_code_fence(raw);
    let parsed: Value =
        serde_json::from_str(payload).map_err(|e| ValidationError::Malformed(e.to_string()))?;

    let items = parsed
        .get("questions")
        .and_then(Value::as_array)
        .ok_or(ValidationError::MissingQuestions)?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            validate_question(item)
                .map_err(|rule| ValidationError::InvalidQuestion { index: i + 1, rule })
        })
        .collect()
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    CODE_FENCE
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(trimmed)
}

fn non_empty_str<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn validate_question(item: &Value) -> Result<QuizQuestion, QuestionRule> {
    let obj = item.as_object().ok_or(QuestionRule::NotAnObject)?;

    let question = non_empty_str(obj, "question").ok_or(QuestionRule::MissingQuestionText)?;
    let raw_options = obj
        .get("options")
        .and_then(Value::as_array)
        .ok_or(QuestionRule::OptionsNotArray)?;
    let correct_answer =
        non_empty_str(obj, "correctAnswer").ok_or(QuestionRule::MissingCorrectAnswer)?;

    let options = raw_options
        .iter()
        .map(|opt| opt.as_str().map(str::to_string))
        .collect::<Option<Vec<String>>>()
        .ok_or(QuestionRule::NonStringOption)?;

    if options.len() != OPTIONS_PER_QUESTION {
        return Err(QuestionRule::WrongOptionCount(options.len()));
    }

    let mut seen = HashSet::new();
    if let Some(dup) = options.iter().find(|opt| !seen.insert(opt.as_str())) {
        return Err(QuestionRule::DuplicateOption(dup.clone()));
    }

    if !options.iter().any(|opt| opt == correct_answer) {
        return Err(QuestionRule::AnswerNotInOptions);
    }

    Ok(QuizQuestion {
        question: question.to_string(),
        options,
        correct_answer: correct_answer.to_string(),
    })
}
