use std::sync::Arc;

use api_ingress::problem::{Problem, ValidationError};
use axum::{
    routing::{get, post},
    Extension, Router,
};
use utoipa::OpenApi;

use crate::api::rest::{dto, handlers};
use crate::domain::service::Service;

/// OpenAPI document for every daily prompt route.
#[derive(OpenApi)]
#[openapi(
    info(title = "Daily Prompt API", description = "Daily question, rewards and leaderboard"),
    paths(
        handlers::sign_in,
        handlers::get_user,
        handlers::list_rewards,
        handlers::daily_usage,
        handlers::today_question,
        handlers::schedule_question,
        handlers::list_answers,
        handlers::submit_answer,
        handlers::like_answer,
        handlers::list_suggestions,
        handlers::submit_suggestion,
        handlers::vote_suggestion,
        handlers::select_suggestion,
        handlers::leaderboard,
    ),
    components(schemas(
        Problem,
        ValidationError,
        dto::UserDto,
        dto::SignInReq,
        dto::TokenRewardDto,
        dto::DailyUsageDto,
        dto::QuestionDto,
        dto::ScheduleQuestionReq,
        dto::AnswerDto,
        dto::SubmitAnswerReq,
        dto::AnswerSubmissionDto,
        dto::AnswerSortParam,
        dto::OutcomeStatus,
        dto::LikeResultDto,
        dto::SuggestionDto,
        dto::SubmitSuggestionReq,
        dto::SuggestionSubmissionDto,
        dto::VoteDirectionParam,
        dto::VoteReq,
        dto::VoteResultDto,
        dto::SelectSuggestionReq,
        dto::SelectionDto,
        dto::LeaderboardEntryDto,
        dto::LeaderboardSortParam,
    )),
    tags(
        (name = "users", description = "Sign-in, profiles and reward history"),
        (name = "questions", description = "Daily questions"),
        (name = "answers", description = "Answers and likes"),
        (name = "suggestions", description = "Community question suggestions"),
        (name = "leaderboard", description = "Token rankings"),
    )
)]
pub struct DailyPromptApiDoc;

pub fn register_routes(router: Router, service: Arc<Service>) -> Router {
    router
        .route("/v1/users/sign-in", post(handlers::sign_in))
        .route("/v1/users/{id}", get(handlers::get_user))
        .route("/v1/users/{id}/rewards", get(handlers::list_rewards))
        .route("/v1/users/{id}/usage", get(handlers::daily_usage))
        .route("/v1/questions/today", get(handlers::today_question))
        .route("/v1/questions", post(handlers::schedule_question))
        .route("/v1/questions/{id}/answers", get(handlers::list_answers))
        .route("/v1/answers", post(handlers::submit_answer))
        .route("/v1/answers/{id}/like", post(handlers::like_answer))
        .route(
            "/v1/suggestions",
            get(handlers::list_suggestions).post(handlers::submit_suggestion),
        )
        .route("/v1/suggestions/{id}/votes", post(handlers::vote_suggestion))
        .route("/v1/suggestions/{id}/select", post(handlers::select_suggestion))
        .route("/v1/leaderboard", get(handlers::leaderboard))
        .layer(Extension(service))
}
