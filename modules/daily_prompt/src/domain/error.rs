use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::repo::StoreError;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("User not found: {id}")]
    UserNotFound { id: Uuid },

    #[error("No active question for {date}")]
    NoActiveQuestion { date: NaiveDate },

    #[error("Question not found: {id}")]
    QuestionNotFound { id: Uuid },

    #[error("Answer not found: {id}")]
    AnswerNotFound { id: Uuid },

    #[error("Suggestion not found: {id}")]
    SuggestionNotFound { id: Uuid },

    #[error("Question {question_id} already answered")]
    DuplicateAnswer { question_id: Uuid },

    #[error("Cannot vote on your own suggestion {suggestion_id}")]
    SelfVote { suggestion_id: Uuid },

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Write failed: {message}")]
    Write { message: String },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn user_not_found(id: Uuid) -> Self {
        Self::UserNotFound { id }
    }

    pub fn no_active_question(date: NaiveDate) -> Self {
        Self::NoActiveQuestion { date }
    }

    pub fn answer_not_found(id: Uuid) -> Self {
        Self::AnswerNotFound { id }
    }

    pub fn suggestion_not_found(id: Uuid) -> Self {
        Self::SuggestionNotFound { id }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn write(message: impl Into<String>) -> Self {
        Self::Write {
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}

/// Generic mapping; call sites handle the variants they can name better.
impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { entity, id } => {
                Self::database(format!("{entity} {id} vanished mid-operation"))
            }
            StoreError::DuplicateAnswer { question_id, .. } => {
                Self::DuplicateAnswer { question_id }
            }
            StoreError::Conflict(what) => Self::validation("conflict", format!("{what} already exists")),
            StoreError::RateLimitExceeded { kind, used } => Self::validation(
                kind.as_str(),
                format!("daily limit reached ({used} used)"),
            ),
            StoreError::Write(message) => Self::Write { message },
            StoreError::Read(message) => Self::Database { message },
        }
    }
}
