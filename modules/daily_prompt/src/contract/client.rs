use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::contract::{
    error::DailyPromptError,
    model::{
        Answer, AnswerSort, AnswerSubmission, DailyUsage, LeaderboardEntry, LeaderboardSort,
        LikeOutcome, NewQuestion, NewSuggestion, Question, Selection, SignIn, SuggestedQuestion,
        SuggestionSubmission, TokenReward, User, VoteDirection, VoteOutcome,
    },
};

/// Public API trait for the daily_prompt module that other modules can use
#[async_trait]
pub trait DailyPromptApi: Send + Sync {
    /// Upsert the user behind a sign-in
    async fn sign_in(&self, req: SignIn) -> Result<User, DailyPromptError>;

    async fn get_user(&self, id: Uuid) -> Result<User, DailyPromptError>;

    /// Newest ledger entries first
    async fn list_rewards(&self, user_id: Uuid) -> Result<Vec<TokenReward>, DailyPromptError>;

    async fn daily_usage(&self, user_id: Uuid) -> Result<DailyUsage, DailyPromptError>;

    /// The active question for the current UTC date, if any
    async fn today_question(&self) -> Result<Option<Question>, DailyPromptError>;

    async fn schedule_question(&self, q: NewQuestion) -> Result<Question, DailyPromptError>;

    async fn submit_answer(
        &self,
        user_id: Uuid,
        text: &str,
    ) -> Result<AnswerSubmission, DailyPromptError>;

    async fn list_answers(
        &self,
        question_id: Uuid,
        sort: AnswerSort,
        viewer: Option<Uuid>,
    ) -> Result<Vec<Answer>, DailyPromptError>;

    async fn like_answer(
        &self,
        user_id: Uuid,
        answer_id: Uuid,
    ) -> Result<LikeOutcome, DailyPromptError>;

    async fn submit_suggestion(
        &self,
        user_id: Uuid,
        new: NewSuggestion,
    ) -> Result<SuggestionSubmission, DailyPromptError>;

    async fn list_suggestions(&self) -> Result<Vec<SuggestedQuestion>, DailyPromptError>;

    async fn vote_suggestion(
        &self,
        user_id: Uuid,
        suggestion_id: Uuid,
        direction: VoteDirection,
    ) -> Result<VoteOutcome, DailyPromptError>;

    async fn select_suggestion(
        &self,
        suggestion_id: Uuid,
        date: NaiveDate,
    ) -> Result<Selection, DailyPromptError>;

    async fn leaderboard(
        &self,
        sort: LeaderboardSort,
    ) -> Result<Vec<LeaderboardEntry>, DailyPromptError>;
}
