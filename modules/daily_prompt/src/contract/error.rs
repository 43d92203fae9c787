use thiserror::Error;
use uuid::Uuid;

/// Errors that are safe to expose to other modules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DailyPromptError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Question {question_id} already answered")]
    DuplicateAnswer { question_id: Uuid },

    #[error("Cannot vote on your own suggestion")]
    SelfVote,

    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Transient; the caller may retry the action.
    #[error("Write failed")]
    WriteFailed,

    #[error("Internal error")]
    Internal,
}

impl DailyPromptError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl From<crate::domain::error::DomainError> for DailyPromptError {
    fn from(domain_error: crate::domain::error::DomainError) -> Self {
        use crate::domain::error::DomainError::*;
        match domain_error {
            NotAuthenticated => Self::NotAuthenticated,
            UserNotFound { id } => Self::not_found("user", id),
            NoActiveQuestion { date } => Self::not_found("question", date),
            QuestionNotFound { id } => Self::not_found("question", id),
            AnswerNotFound { id } => Self::not_found("answer", id),
            SuggestionNotFound { id } => Self::not_found("suggestion", id),
            DuplicateAnswer { question_id } => Self::DuplicateAnswer { question_id },
            SelfVote { .. } => Self::SelfVote,
            Validation { field, message } => Self::validation(format!("{field}: {message}")),
            Write { .. } => Self::WriteFailed,
            Database { .. } => Self::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::DomainError;

    #[test]
    fn internal_details_are_not_exposed() {
        let e: DailyPromptError = DomainError::database("disk I/O error at page 7").into();
        assert_eq!(e, DailyPromptError::Internal);
        assert_eq!(e.to_string(), "Internal error");

        let e: DailyPromptError = DomainError::write("pool timed out").into();
        assert_eq!(e, DailyPromptError::WriteFailed);
    }

    #[test]
    fn validation_keeps_field_name() {
        let e: DailyPromptError = DomainError::validation("text", "must not be empty").into();
        assert_eq!(e.to_string(), "Validation error: text: must not be empty");
    }
}
