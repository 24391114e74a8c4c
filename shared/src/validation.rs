use std::collections::HashSet;
use serde::{Serialize, Deserialize};

pub const MIN_CHOICES: usize = 2;
pub const MAX_CHOICES: usize = 10;
pub const MIN_QUESTION_LENGTH: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn question(message: impl Into<String>) -> Self {
        Self {
            field: "question".into(),
            message: message.into(),
        }
    }

    fn choices(message: impl Into<String>) -> Self {
        Self {
            field: "choices".into(),
            message: message.into(),
        }
    }
}

pub fn validate_question(question: &str) -> Option<ValidationError> {
    let trimmed = question.trim();
    if trimmed.is_empty() {
        return Some(ValidationError::question("Poll question cannot be empty"));
    }
    if trimmed.chars().count() < MIN_QUESTION_LENGTH {
        return Some(ValidationError::question(format!(
            "Poll question must be at least {MIN_QUESTION_LENGTH} characters long"
        )));
    }
    None
}

pub fn validate_choices<S: AsRef<str>>(choices: &[S]) -> Option<ValidationError> {
    if choices.len() < MIN_CHOICES {
        return Some(ValidationError::choices(format!(
            "At least {MIN_CHOICES} choices are required"
        )));
    }
    if choices.len() > MAX_CHOICES {
        return Some(ValidationError::choices(format!(
            "Maximum {MAX_CHOICES} choices allowed"
        )));
    }
    if choices.iter().any(|c| c.as_ref().trim().is_empty()) {
        return Some(ValidationError::choices("All choices must have text"));
    }

    // uniqueness is judged on trimmed, case-folded text
    let unique = choices
        .iter()
        .map(|c| c.as_ref().trim().to_lowercase())
        .collect::<HashSet<_>>();
    if unique.len() != choices.len() {
        return Some(ValidationError::choices("Duplicate choices are not allowed"));
    }

    None
}

pub fn validate_poll<S: AsRef<str>>(question: &str, choices: &[S]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if let Some(error) = validate_question(question) {
        errors.push(error);
    }
    if let Some(error) = validate_choices(choices) {
        errors.push(error);
    }
    errors
}
