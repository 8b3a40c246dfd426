// src/services/mod.rs

pub mod generator;
pub mod prompt;
pub mod validation;
