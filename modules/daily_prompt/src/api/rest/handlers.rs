use std::sync::Arc;

use api_ingress::problem::{Problem, ProblemResponse};
use axum::{
    extract::{Path, Query},
    http::{HeaderMap, StatusCode, Uri},
    response::Json,
    Extension,
};
use tracing::{error, info};
use uuid::Uuid;

use crate::api::rest::auth::{viewer_id, AuthenticatedUser};
use crate::api::rest::dto::{
    AnswerDto, AnswerSubmissionDto, DailyUsageDto, LeaderboardEntryDto, LeaderboardQuery,
    LikeResultDto, ListAnswersQuery, QuestionDto, ScheduleQuestionReq, SelectSuggestionReq,
    SelectionDto, SignInReq, SubmitAnswerReq, SubmitSuggestionReq, SuggestionDto,
    SuggestionSubmissionDto, TokenRewardDto, UserDto, VoteReq, VoteResultDto,
};
use crate::api::rest::error::{from_parts, map_domain_error};
use crate::domain::service::Service;

/// Sign in, creating the user on first visit
#[utoipa::path(
    post,
    path = "/v1/users/sign-in",
    tag = "users",
    request_body = SignInReq,
    responses(
        (status = 200, description = "Signed-in user", body = UserDto),
        (status = 400, description = "Bad Request", body = Problem),
    )
)]
pub async fn sign_in(
    Extension(svc): Extension<Arc<Service>>,
    uri: Uri,
    Json(req): Json<SignInReq>,
) -> Result<Json<UserDto>, ProblemResponse> {
    info!("Signing in user: {}", req.username);

    match svc.sign_in(req.into()).await {
        Ok(user) => Ok(Json(UserDto::from(user))),
        Err(e) => {
            error!("Failed to sign in: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

#[utoipa::path(
    get,
    path = "/v1/users/{id}",
    tag = "users",
    params(("id" = Uuid, Path, description = "User UUID")),
    responses(
        (status = 200, description = "User found", body = UserDto),
        (status = 404, description = "Not Found", body = Problem),
    )
)]
pub async fn get_user(
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<Uuid>,
    uri: Uri,
) -> Result<Json<UserDto>, ProblemResponse> {
    match svc.get_user(id).await {
        Ok(user) => Ok(Json(UserDto::from(user))),
        Err(e) => {
            error!("Failed to get user {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Reward history, newest first
#[utoipa::path(
    get,
    path = "/v1/users/{id}/rewards",
    tag = "users",
    params(("id" = Uuid, Path, description = "User UUID")),
    responses((status = 200, description = "Reward history", body = [TokenRewardDto]))
)]
pub async fn list_rewards(
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<Uuid>,
    uri: Uri,
) -> Result<Json<Vec<TokenRewardDto>>, ProblemResponse> {
    svc.list_rewards(id)
        .await
        .map(|rewards| Json(rewards.into_iter().map(TokenRewardDto::from).collect()))
        .map_err(|e| map_domain_error(&e, uri.path()))
}

/// Today's vote and upvote quota usage
#[utoipa::path(
    get,
    path = "/v1/users/{id}/usage",
    tag = "users",
    params(("id" = Uuid, Path, description = "User UUID")),
    responses((status = 200, description = "Quota usage", body = DailyUsageDto))
)]
pub async fn daily_usage(
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<Uuid>,
    uri: Uri,
) -> Result<Json<DailyUsageDto>, ProblemResponse> {
    svc.daily_usage(id)
        .await
        .map(|usage| Json(usage.into()))
        .map_err(|e| map_domain_error(&e, uri.path()))
}

#[utoipa::path(
    get,
    path = "/v1/questions/today",
    tag = "questions",
    responses(
        (status = 200, description = "Today's question", body = QuestionDto),
        (status = 404, description = "No question scheduled for today", body = Problem),
    )
)]
pub async fn today_question(
    Extension(svc): Extension<Arc<Service>>,
    uri: Uri,
) -> Result<Json<QuestionDto>, ProblemResponse> {
    match svc.today_question().await {
        Ok(Some(q)) => Ok(Json(q.into())),
        Ok(None) => Err(from_parts(
            StatusCode::NOT_FOUND,
            "NO_ACTIVE_QUESTION",
            "No active question",
            "No question is scheduled for today",
            uri.path(),
        )),
        Err(e) => Err(map_domain_error(&e, uri.path())),
    }
}

/// Schedule a prompt for a date
#[utoipa::path(
    post,
    path = "/v1/questions",
    tag = "questions",
    request_body = ScheduleQuestionReq,
    responses(
        (status = 201, description = "Scheduled question", body = QuestionDto),
        (status = 400, description = "Bad Request", body = Problem),
        (status = 401, description = "Unauthorized", body = Problem),
    )
)]
pub async fn schedule_question(
    Extension(svc): Extension<Arc<Service>>,
    _user: AuthenticatedUser,
    uri: Uri,
    Json(req): Json<ScheduleQuestionReq>,
) -> Result<(StatusCode, Json<QuestionDto>), ProblemResponse> {
    info!("Scheduling question for {}", req.date);

    match svc.schedule_question(req.into()).await {
        Ok(q) => Ok((StatusCode::CREATED, Json(q.into()))),
        Err(e) => {
            error!("Failed to schedule question: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

#[utoipa::path(
    get,
    path = "/v1/questions/{id}/answers",
    tag = "answers",
    params(("id" = Uuid, Path, description = "Question UUID"), ListAnswersQuery),
    responses(
        (status = 200, description = "Answers to the question", body = [AnswerDto]),
        (status = 404, description = "Not Found", body = Problem),
    )
)]
pub async fn list_answers(
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<Uuid>,
    Query(query): Query<ListAnswersQuery>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Json<Vec<AnswerDto>>, ProblemResponse> {
    let sort = query.sort.map(Into::into).unwrap_or_default();
    svc.list_answers(id, sort, viewer_id(&headers))
        .await
        .map(|answers| Json(answers.into_iter().map(AnswerDto::from).collect()))
        .map_err(|e| map_domain_error(&e, uri.path()))
}

/// Answer today's question
#[utoipa::path(
    post,
    path = "/v1/answers",
    tag = "answers",
    request_body = SubmitAnswerReq,
    responses(
        (status = 201, description = "Answer stored with rewards", body = AnswerSubmissionDto),
        (status = 400, description = "Bad Request", body = Problem),
        (status = 401, description = "Unauthorized", body = Problem),
        (status = 404, description = "No active question", body = Problem),
        (status = 409, description = "Already answered", body = Problem),
        (status = 503, description = "Write failed, retry", body = Problem),
    )
)]
pub async fn submit_answer(
    Extension(svc): Extension<Arc<Service>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    uri: Uri,
    Json(req): Json<SubmitAnswerReq>,
) -> Result<(StatusCode, Json<AnswerSubmissionDto>), ProblemResponse> {
    match svc.submit_answer(user_id, &req.text).await {
        Ok(submission) => Ok((StatusCode::CREATED, Json(submission.into()))),
        Err(e) => {
            error!("Failed to submit answer for {}: {}", user_id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Like another user's answer
#[utoipa::path(
    post,
    path = "/v1/answers/{id}/like",
    tag = "answers",
    params(("id" = Uuid, Path, description = "Answer UUID")),
    responses(
        (status = 200, description = "Like outcome", body = LikeResultDto),
        (status = 400, description = "Own answer", body = Problem),
        (status = 401, description = "Unauthorized", body = Problem),
        (status = 404, description = "Not Found", body = Problem),
    )
)]
pub async fn like_answer(
    Extension(svc): Extension<Arc<Service>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(id): Path<Uuid>,
    uri: Uri,
) -> Result<Json<LikeResultDto>, ProblemResponse> {
    svc.like_answer(user_id, id)
        .await
        .map(|outcome| Json(outcome.into()))
        .map_err(|e| map_domain_error(&e, uri.path()))
}

/// Open suggestions, highest score first
#[utoipa::path(
    get,
    path = "/v1/suggestions",
    tag = "suggestions",
    responses((status = 200, description = "Open suggestions", body = [SuggestionDto]))
)]
pub async fn list_suggestions(
    Extension(svc): Extension<Arc<Service>>,
    uri: Uri,
) -> Result<Json<Vec<SuggestionDto>>, ProblemResponse> {
    svc.list_suggestions()
        .await
        .map(|list| Json(list.into_iter().map(SuggestionDto::from).collect()))
        .map_err(|e| map_domain_error(&e, uri.path()))
}

#[utoipa::path(
    post,
    path = "/v1/suggestions",
    tag = "suggestions",
    request_body = SubmitSuggestionReq,
    responses(
        (status = 201, description = "Suggestion stored", body = SuggestionSubmissionDto),
        (status = 400, description = "Bad Request", body = Problem),
        (status = 401, description = "Unauthorized", body = Problem),
    )
)]
pub async fn submit_suggestion(
    Extension(svc): Extension<Arc<Service>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    uri: Uri,
    Json(req): Json<SubmitSuggestionReq>,
) -> Result<(StatusCode, Json<SuggestionSubmissionDto>), ProblemResponse> {
    match svc.submit_suggestion(user_id, req.into()).await {
        Ok(submission) => Ok((StatusCode::CREATED, Json(submission.into()))),
        Err(e) => {
            error!("Failed to submit suggestion for {}: {}", user_id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

#[utoipa::path(
    post,
    path = "/v1/suggestions/{id}/votes",
    tag = "suggestions",
    params(("id" = Uuid, Path, description = "Suggestion UUID")),
    request_body = VoteReq,
    responses(
        (status = 200, description = "Vote outcome", body = VoteResultDto),
        (status = 401, description = "Unauthorized", body = Problem),
        (status = 403, description = "Own suggestion", body = Problem),
        (status = 404, description = "Not Found", body = Problem),
    )
)]
pub async fn vote_suggestion(
    Extension(svc): Extension<Arc<Service>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(id): Path<Uuid>,
    uri: Uri,
    Json(req): Json<VoteReq>,
) -> Result<Json<VoteResultDto>, ProblemResponse> {
    svc.vote_suggestion(user_id, id, req.direction.into())
        .await
        .map(|outcome| Json(outcome.into()))
        .map_err(|e| map_domain_error(&e, uri.path()))
}

/// Promote a suggestion to the question for a date
#[utoipa::path(
    post,
    path = "/v1/suggestions/{id}/select",
    tag = "suggestions",
    params(("id" = Uuid, Path, description = "Suggestion UUID")),
    request_body = SelectSuggestionReq,
    responses(
        (status = 200, description = "Suggestion selected", body = SelectionDto),
        (status = 400, description = "Already selected or date taken", body = Problem),
        (status = 401, description = "Unauthorized", body = Problem),
        (status = 404, description = "Not Found", body = Problem),
    )
)]
pub async fn select_suggestion(
    Extension(svc): Extension<Arc<Service>>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    uri: Uri,
    Json(req): Json<SelectSuggestionReq>,
) -> Result<Json<SelectionDto>, ProblemResponse> {
    info!("Selecting suggestion {} for {}", id, req.date);

    match svc.select_suggestion(id, req.date).await {
        Ok(selection) => Ok(Json(selection.into())),
        Err(e) => {
            error!("Failed to select suggestion {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

#[utoipa::path(
    get,
    path = "/v1/leaderboard",
    tag = "leaderboard",
    params(LeaderboardQuery),
    responses((status = 200, description = "Ranked users", body = [LeaderboardEntryDto]))
)]
pub async fn leaderboard(
    Extension(svc): Extension<Arc<Service>>,
    Query(query): Query<LeaderboardQuery>,
    uri: Uri,
) -> Result<Json<Vec<LeaderboardEntryDto>>, ProblemResponse> {
    let sort = query.sort.map(Into::into).unwrap_or_default();
    svc.leaderboard(sort)
        .await
        .map(|entries| Json(entries.into_iter().map(LeaderboardEntryDto::from).collect()))
        .map_err(|e| map_domain_error(&e, uri.path()))
}
