use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;

use crate::contract::{
    client::DailyPromptApi,
    error::DailyPromptError,
    model::{
        Answer, AnswerSort, AnswerSubmission, DailyUsage, LeaderboardEntry, LeaderboardSort,
        LikeOutcome, NewQuestion, NewSuggestion, Question, Selection, SignIn, SuggestedQuestion,
        SuggestionSubmission, TokenReward, User, VoteDirection, VoteOutcome,
    },
};
use crate::domain::service::Service;

/// Local implementation of the DailyPromptApi trait that delegates to the domain service
pub struct DailyPromptLocalClient {
    service: Arc<Service>,
}

impl DailyPromptLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl DailyPromptApi for DailyPromptLocalClient {
    async fn sign_in(&self, req: SignIn) -> Result<User, DailyPromptError> {
        self.service.sign_in(req).await.map_err(Into::into)
    }

    async fn get_user(&self, id: Uuid) -> Result<User, DailyPromptError> {
        self.service.get_user(id).await.map_err(Into::into)
    }

    async fn list_rewards(&self, user_id: Uuid) -> Result<Vec<TokenReward>, DailyPromptError> {
        self.service.list_rewards(user_id).await.map_err(Into::into)
    }

    async fn daily_usage(&self, user_id: Uuid) -> Result<DailyUsage, DailyPromptError> {
        self.service.daily_usage(user_id).await.map_err(Into::into)
    }

    async fn today_question(&self) -> Result<Option<Question>, DailyPromptError> {
        self.service.today_question().await.map_err(Into::into)
    }

    async fn schedule_question(&self, q: NewQuestion) -> Result<Question, DailyPromptError> {
        self.service.schedule_question(q).await.map_err(Into::into)
    }

    async fn submit_answer(
        &self,
        user_id: Uuid,
        text: &str,
    ) -> Result<AnswerSubmission, DailyPromptError> {
        self.service
            .submit_answer(user_id, text)
            .await
            .map_err(Into::into)
    }

    async fn list_answers(
        &self,
        question_id: Uuid,
        sort: AnswerSort,
        viewer: Option<Uuid>,
    ) -> Result<Vec<Answer>, DailyPromptError> {
        self.service
            .list_answers(question_id, sort, viewer)
            .await
            .map_err(Into::into)
    }

    async fn like_answer(
        &self,
        user_id: Uuid,
        answer_id: Uuid,
    ) -> Result<LikeOutcome, DailyPromptError> {
        self.service
            .like_answer(user_id, answer_id)
            .await
            .map_err(Into::into)
    }

    async fn submit_suggestion(
        &self,
        user_id: Uuid,
        new: NewSuggestion,
    ) -> Result<SuggestionSubmission, DailyPromptError> {
        self.service
            .submit_suggestion(user_id, new)
            .await
            .map_err(Into::into)
    }

    async fn list_suggestions(&self) -> Result<Vec<SuggestedQuestion>, DailyPromptError> {
        self.service.list_suggestions().await.map_err(Into::into)
    }

    async fn vote_suggestion(
        &self,
        user_id: Uuid,
        suggestion_id: Uuid,
        direction: VoteDirection,
    ) -> Result<VoteOutcome, DailyPromptError> {
        self.service
            .vote_suggestion(user_id, suggestion_id, direction)
            .await
            .map_err(Into::into)
    }

    async fn select_suggestion(
        &self,
        suggestion_id: Uuid,
        date: NaiveDate,
    ) -> Result<Selection, DailyPromptError> {
        self.service
            .select_suggestion(suggestion_id, date)
            .await
            .map_err(Into::into)
    }

    async fn leaderboard(
        &self,
        sort: LeaderboardSort,
    ) -> Result<Vec<LeaderboardEntry>, DailyPromptError> {
        self.service.leaderboard(sort).await.map_err(Into::into)
    }
}
