// src/models/quiz.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    config::{MAX_QUESTIONS, MAX_TOPIC_LENGTH},
    error::AppError,
};

pub const MISSING_FIELDS: &str = "Missing required fields";

/// Difficulty level requested by the client. Only influences the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!(
                "Invalid difficulty '{}'. Expected one of: easy, medium, hard",
                other
            )),
        }
    }
}

/// `numQuestions` as sent by the browser: either a JSON number or a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum QuestionCount {
    Number(serde_json::Number),
    Text(String),
}

impl QuestionCount {
    /// Treats `0` and `""` as absent, like the browser client does.
    fn is_blank(&self) -> bool {
        match self {
            QuestionCount::Number(n) => n.as_f64() == Some(0.0),
            QuestionCount::Text(s) => s.trim().is_empty(),
        }
    }

    fn to_count(&self) -> Result<u32, AppError> {
        let parsed = match self {
            QuestionCount::Number(n) => n.as_u64().or_else(|| whole_number(n.as_f64()?)),
            QuestionCount::Text(s) => s.trim().parse::<u64>().ok(),
        };

        parsed
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| {
                AppError::BadRequest(format!(
                    "numQuestions must be a whole number between 1 and {}",
                    MAX_QUESTIONS
                ))
            })
    }
}

/// `5.0` counts as 5; `2.5` and negatives do not.
fn whole_number(value: f64) -> Option<u64> {
    (value.fract() == 0.0 && value >= 0.0 && value <= u32::MAX as f64).then_some(value as u64)
}

/// DTO for `POST /api/generate-quiz`.
///
/// Every field is optional at the serde level so that a missing field
/// produces the "Missing required fields" error instead of a decoder message.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateQuizRequest {
    pub topic: Option<String>,
    #[serde(rename = "numQuestions")]
    pub num_questions: Option<QuestionCount>,
    pub difficulty: Option<String>,
}

impl GenerateQuizRequest {
    /// Turns the loosely-typed wire payload into a checked `QuizRequest`.
    pub fn into_quiz_request(self) -> Result<QuizRequest, AppError> {
        let missing = || AppError::BadRequest(MISSING_FIELDS.to_string());

        let topic = self
            .topic
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(missing)?;
        let count = self
            .num_questions
            .filter(|c| !c.is_blank())
            .ok_or_else(missing)?;
        let difficulty = self
            .difficulty
            .filter(|d| !d.trim().is_empty())
            .ok_or_else(missing)?;

        let request = QuizRequest {
            topic,
            question_count: count.to_count()?,
            difficulty: difficulty.parse().map_err(AppError::BadRequest)?,
        };

        if let Err(validation_errors) = request.validate() {
            return Err(AppError::BadRequest(validation_errors.to_string()));
        }

        Ok(request)
    }
}

/// A checked quiz request. Lives for a single request/response cycle.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct QuizRequest {
    #[validate(length(
        min = 1,
        max = MAX_TOPIC_LENGTH,
        message = "Topic must be between 1 and 200 characters."
    ))]
    pub topic: String,
    #[validate(range(
        min = 1,
        max = MAX_QUESTIONS,
        message = "numQuestions must be between 1 and 50."
    ))]
    pub question_count: u32,
    pub difficulty: Difficulty,
}

/// One multiple-choice question as produced by the model and returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    /// Exactly four distinct options.
    pub options: Vec<String>,
    /// Verbatim copy of one of `options`.
    #[serde(rename = "correctAnswer")]
    pub correct_answer: String,
}

/// Success body of `POST /api/generate-quiz`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizResponse {
    pub questions: Vec<QuizQuestion>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: serde_json::Value) -> GenerateQuizRequest {
        serde_json::from_value(value).unwrap()
    }

    fn bad_request_message(result: Result<QuizRequest, AppError>) -> String {
        match result {
            Err(AppError::BadRequest(msg)) => msg,
            other => panic!("expected BadRequest, got {:?}", other),
        }
    }

    #[test]
    fn test_accepts_numeric_string_count() {
        let req = decode(json!({"topic": " Rust ", "numQuestions": "7", "difficulty": "Hard"}))
            .into_quiz_request()
            .unwrap();
        assert_eq!(req.topic, "Rust");
        assert_eq!(req.question_count, 7);
        assert_eq!(req.difficulty, Difficulty::Hard);
    }

    #[test]
    fn test_accepts_whole_float_count() {
        let req = decode(json!({"topic": "Rust", "numQuestions": 5.0, "difficulty": "easy"}))
            .into_quiz_request()
            .unwrap();
        assert_eq!(req.question_count, 5);
    }

    #[test]
    fn test_missing_topic_is_missing_fields() {
        let msg = bad_request_message(
            decode(json!({"numQuestions": 5, "difficulty": "easy"})).into_quiz_request(),
        );
        assert_eq!(msg, MISSING_FIELDS);
    }

    #[test]
    fn test_zero_and_blank_count_are_missing_fields() {
        for count in [json!(0), json!(0.0), json!(""), json!(null)] {
            let msg = bad_request_message(
                decode(json!({"topic": "t", "numQuestions": count, "difficulty": "easy"}))
                    .into_quiz_request(),
            );
            assert_eq!(msg, MISSING_FIELDS);
        }
    }

    #[test]
    fn test_rejects_non_numeric_and_fractional_counts() {
        for count in [json!("five"), json!(2.5), json!(-3)] {
            let msg = bad_request_message(
                decode(json!({"topic": "t", "numQuestions": count, "difficulty": "easy"}))
                    .into_quiz_request(),
            );
            assert!(msg.contains("numQuestions"), "unexpected message: {}", msg);
        }
    }

    #[test]
    fn test_rejects_count_over_maximum() {
        let msg = bad_request_message(
            decode(json!({"topic": "t", "numQuestions": 51, "difficulty": "easy"}))
                .into_quiz_request(),
        );
        assert!(msg.contains("between 1 and 50"));
    }

    #[test]
    fn test_rejects_unknown_difficulty() {
        let msg = bad_request_message(
            decode(json!({"topic": "t", "numQuestions": 3, "difficulty": "insane"}))
                .into_quiz_request(),
        );
        assert!(msg.contains("Invalid difficulty"));
    }

    #[test]
    fn test_rejects_overlong_topic() {
        let topic = "x".repeat(201);
        let result = decode(json!({"topic": topic, "numQuestions": 3, "difficulty": "easy"}))
            .into_quiz_request();
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_question_uses_camel_case_answer_field() {
        let q = QuizQuestion {
            question: "Q".into(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: "a".into(),
        };
        let value = serde_json::to_value(&q).unwrap();
        assert_eq!(value["correctAnswer"], "a");
    }
}
