// src/services/prompt.rs

use crate::{
    config::OPTIONS_PER_QUESTION,
    models::quiz::{Difficulty, QuizRequest},
    services::generator::Batch,
};

pub const SYSTEM_PROMPT: &str = "You are a quiz generator that creates clear, accurate questions. \
Always respond with valid JSON containing a questions array.";

pub fn system_prompt() -> &'static str {
    SYSTEM_PROMPT
}

/// Builds the user prompt asking for `count` questions about `topic`.
pub fn build_prompt(topic: &str, difficulty: Difficulty, count: u32) -> String {
    format!(
        r#"Generate {count} multiple choice questions about "{topic}" at {difficulty} difficulty level.

Each question must follow this format:
{{
  "question": "Clear, concise question text",
  "options": ["Option 1", "Option 2", "Option 3", "Option 4"],
  "correctAnswer": "The exact text of the correct option"
}}

Requirements:
- Questions should be appropriate for {difficulty} difficulty
- Each question must have exactly {options} options
- The correctAnswer must exactly match one of the options
- No duplicate questions or options
- Keep questions and answers concise

Return a JSON object with this structure:
{{
  "questions": [
    // Array of exactly {count} question objects as specified above
  ]
}}"#,
        options = OPTIONS_PER_QUESTION,
    )
}

/// Prompt for one batch of a larger request.
pub fn build_batch_prompt(request: &QuizRequest, batch: &Batch, total_batches: usize) -> String {
    let mut prompt = build_prompt(&request.topic, request.difficulty, batch.size);

    if total_batches > 1 {
        prompt.push_str(&format!(
            "\n\nThis is batch {} of {} for the same quiz. \
Cover different aspects of the topic than the other batches and do not repeat questions.",
            batch.number, total_batches
        ));
    }

    prompt
}
