use api_ingress::problem::{Problem, ProblemResponse};
use axum::http::StatusCode;

use crate::domain::error::DomainError;

/// Helper to create a ProblemResponse with less boilerplate
pub fn from_parts(
    status: StatusCode,
    code: &str,
    title: &str,
    detail: impl Into<String>,
    instance: &str,
) -> ProblemResponse {
    let problem = Problem::new(status, title, detail)
        .with_type(format!("https://errors.daily-prompt.dev/{}", code))
        .with_code(code)
        .with_instance(instance);
    ProblemResponse(problem)
}

/// Map domain error to RFC9457 ProblemResponse
pub fn map_domain_error(e: &DomainError, instance: &str) -> ProblemResponse {
    match e {
        DomainError::NotAuthenticated => from_parts(
            StatusCode::UNAUTHORIZED,
            "NOT_AUTHENTICATED",
            "Not authenticated",
            "A signed-in user is required (x-user-id header)",
            instance,
        ),
        DomainError::UserNotFound { .. }
        | DomainError::QuestionNotFound { .. }
        | DomainError::AnswerNotFound { .. }
        | DomainError::SuggestionNotFound { .. } => from_parts(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Not found",
            e.to_string(),
            instance,
        ),
        DomainError::NoActiveQuestion { .. } => from_parts(
            StatusCode::NOT_FOUND,
            "NO_ACTIVE_QUESTION",
            "No active question",
            e.to_string(),
            instance,
        ),
        DomainError::DuplicateAnswer { .. } => from_parts(
            StatusCode::CONFLICT,
            "DUPLICATE_ANSWER",
            "Already answered",
            e.to_string(),
            instance,
        ),
        DomainError::SelfVote { .. } => from_parts(
            StatusCode::FORBIDDEN,
            "SELF_VOTE",
            "Cannot vote on own suggestion",
            e.to_string(),
            instance,
        ),
        DomainError::Validation { field, message } => {
            let ProblemResponse(p) = from_parts(
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                "Validation error",
                e.to_string(),
                instance,
            );
            ProblemResponse(p.with_field_error(field, message.clone()))
        }
        DomainError::Write { .. } => {
            tracing::warn!(error = %e, "Write failed; client may retry");
            from_parts(
                StatusCode::SERVICE_UNAVAILABLE,
                "WRITE_FAILED",
                "Write failed",
                "The change could not be saved, please retry",
                instance,
            )
        }
        DomainError::Database { .. } => {
            // Log the internal error details but don't expose them to the client
            tracing::error!(error = ?e, "Database error occurred");
            from_parts(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Internal server error",
                "An internal error occurred",
                instance,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn statuses_follow_error_kind() {
        let cases = [
            (DomainError::NotAuthenticated, 401),
            (DomainError::user_not_found(Uuid::nil()), 404),
            (
                DomainError::DuplicateAnswer {
                    question_id: Uuid::nil(),
                },
                409,
            ),
            (DomainError::validation("text", "must not be empty"), 400),
            (
                DomainError::SelfVote {
                    suggestion_id: Uuid::nil(),
                },
                403,
            ),
            (DomainError::write("disk full"), 503),
            (DomainError::database("boom"), 500),
        ];
        for (err, status) in cases {
            let ProblemResponse(p) = map_domain_error(&err, "/v1/x");
            assert_eq!(p.status, status, "{err}");
            assert_eq!(p.instance, "/v1/x");
        }
    }

    #[test]
    fn internal_details_are_hidden() {
        let ProblemResponse(p) = map_domain_error(&DomainError::database("secret dsn"), "/");
        assert!(!p.detail.contains("secret"));
        assert_eq!(p.code, "INTERNAL");
    }

    #[test]
    fn validation_points_at_field() {
        let ProblemResponse(p) =
            map_domain_error(&DomainError::validation("text", "too long"), "/v1/answers");
        let errors = p.errors;
        assert_eq!(errors[0].pointer, "/text");
        assert_eq!(errors[0].detail, "too long");
    }
}
