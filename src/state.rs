// src/state.rs

use std::sync::Arc;

use crate::{config::Config, services::generator::QuizGenerator};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// `None` when no upstream API key is configured.
    pub generator: Option<Arc<QuizGenerator>>,
}
