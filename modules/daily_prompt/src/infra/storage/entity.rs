use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub avatar: String,
    pub platform_fid: Option<i64>,
    pub wallet_address: Option<String>,
    pub tokens: i64,
    pub streak: i64,
    pub has_answered_today: bool,
    pub last_answer_date: Option<NaiveDate>,
    pub total_upvotes_received: i64,
    pub total_upvotes_given: i64,
    pub early_bird_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct QuestionRow {
    pub id: Uuid,
    pub text: String,
    pub date: NaiveDate,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Answer joined with its author.
#[derive(Debug, Clone, FromRow)]
pub struct AnswerRow {
    pub id: Uuid,
    pub question_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub avatar: String,
    pub text: String,
    pub likes: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct RewardRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub amount: i64,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

/// Suggestion joined with its author's username.
#[derive(Debug, Clone, FromRow)]
pub struct SuggestionRow {
    pub id: Uuid,
    pub text: String,
    pub category: Option<String>,
    pub submitted_by: Uuid,
    pub submitted_by_username: String,
    pub submitted_at: DateTime<Utc>,
    pub votes: i64,
    pub is_selected: bool,
    pub selected_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, FromRow)]
pub struct VoteRow {
    pub suggestion_id: Uuid,
    pub user_id: Uuid,
    pub direction: String,
}

#[derive(Debug, Clone, Copy, FromRow)]
pub struct QuotaRow {
    pub used: i64,
    pub day: NaiveDate,
}
