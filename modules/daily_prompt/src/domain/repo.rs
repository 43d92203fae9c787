use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::contract::model::{Answer, Question, SuggestedQuestion, TokenReward, User, VoteDirection};
use crate::domain::quota::{DailyQuota, QuotaKind};

/// Failures reported by store adapters.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("user {user_id} already answered question {question_id}")]
    DuplicateAnswer { question_id: Uuid, user_id: Uuid },

    #[error("daily {} limit reached ({used} used)", .kind.as_str())]
    RateLimitExceeded { kind: QuotaKind, used: u32 },

    #[error("{0} already exists")]
    Conflict(String),

    #[error("store write failed: {0}")]
    Write(String),

    #[error("store read failed: {0}")]
    Read(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Outcome of a like attempt that passed the store's checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeRecord {
    /// `popular` is set when this like credited the popular-answer bonus.
    Applied {
        likes: u32,
        used_today: u32,
        popular: bool,
    },
    AlreadyLiked,
}

/// Rewards credited together with a like.
#[derive(Debug, Clone)]
pub struct LikeGrants {
    /// Always credited to the liker.
    pub given: TokenReward,
    /// Credited to the author when the like count reaches `popular_at`.
    pub popular: TokenReward,
    pub popular_at: u32,
}

/// Outcome of a vote attempt that passed the store's checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteRecord {
    Applied { votes: i64, used_today: u32 },
    Unchanged,
}

#[async_trait]
pub trait UsersRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_by_platform_fid(&self, fid: i64) -> Result<Option<User>, StoreError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn insert(&self, u: User) -> Result<(), StoreError>;
    /// Persist profile and counters by `u.id`. The token balance is not written.
    async fn update(&self, u: User) -> Result<(), StoreError>;
    /// By balance descending, ties in sign-up order.
    async fn list_top(&self, limit: u32) -> Result<Vec<User>, StoreError>;
}

/// Append-only record of every balance change.
///
/// Every write that appends an entry also adds its amount to the user's
/// balance in the same transaction, so `tokens` always equals the ledger sum.
#[async_trait]
pub trait RewardLedger: Send + Sync {
    /// Append `reward` and add it to the balance; returns the new balance.
    async fn credit(&self, reward: TokenReward) -> Result<i64, StoreError>;
    /// Newest first.
    async fn list_for_user(
        &self,
        user_id: Uuid,
        since: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<TokenReward>, StoreError>;
    async fn list_since(&self, since: DateTime<Utc>) -> Result<Vec<TokenReward>, StoreError>;
}

#[async_trait]
pub trait QuestionsRepository: Send + Sync {
    /// The active question for `date`.
    async fn find_by_date(&self, date: NaiveDate) -> Result<Option<Question>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Question>, StoreError>;
    /// `Conflict` when `q.date` already has a question.
    async fn insert(&self, q: Question) -> Result<(), StoreError>;
}

#[async_trait]
pub trait AnswersRepository: Send + Sync {
    /// Store `a`, persist the author's counters from `author` and credit
    /// `rewards`, all or nothing. Returns the author's new balance.
    ///
    /// `DuplicateAnswer` when the user already answered the question.
    async fn submit(
        &self,
        a: Answer,
        author: User,
        rewards: Vec<TokenReward>,
    ) -> Result<i64, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Answer>, StoreError>;
    async fn count_for_question(&self, question_id: Uuid) -> Result<u32, StoreError>;
    /// In creation order, with author username/avatar filled in.
    async fn list_for_question(&self, question_id: Uuid) -> Result<Vec<Answer>, StoreError>;
    async fn list_with_min_likes(&self, min_likes: u32) -> Result<Vec<Answer>, StoreError>;
    /// Record a like by `user_id`, at most once per answer and `limit` per day.
    ///
    /// An applied like bumps the liker's given and the author's received
    /// counters and credits `grants` in the same write.
    /// `RateLimitExceeded` when the liker's quota for `today` is used up.
    async fn record_like(
        &self,
        answer_id: Uuid,
        user_id: Uuid,
        today: NaiveDate,
        limit: u32,
        grants: LikeGrants,
    ) -> Result<LikeRecord, StoreError>;
}

#[async_trait]
pub trait SuggestionsRepository: Send + Sync {
    /// Store `s` and credit `reward` to its author; returns the new balance.
    async fn submit(&self, s: SuggestedQuestion, reward: TokenReward) -> Result<i64, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<SuggestedQuestion>, StoreError>;
    /// Not yet selected, in submission order.
    async fn list_open(&self) -> Result<Vec<SuggestedQuestion>, StoreError>;
    /// Record or switch a vote, bounded by `limit` votes per day.
    ///
    /// The quota is checked before the existing vote, so a capped user gets
    /// `RateLimitExceeded` even for a repeat. A repeat is `Unchanged` and
    /// consumes nothing; an applied vote credits `reward`.
    async fn record_vote(
        &self,
        suggestion_id: Uuid,
        user_id: Uuid,
        direction: VoteDirection,
        today: NaiveDate,
        limit: u32,
        reward: TokenReward,
    ) -> Result<VoteRecord, StoreError>;
    /// Schedule `question`, mark the suggestion selected for its date and
    /// credit `reward` to the author, all or nothing.
    ///
    /// `Conflict` when the date already has a question.
    async fn select(
        &self,
        id: Uuid,
        question: Question,
        reward: TokenReward,
    ) -> Result<SuggestedQuestion, StoreError>;
}

#[async_trait]
pub trait QuotaRepository: Send + Sync {
    async fn get(&self, user_id: Uuid, kind: QuotaKind) -> Result<Option<DailyQuota>, StoreError>;
}

/// Every port the service needs, usually backed by one adapter.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UsersRepository>,
    pub ledger: Arc<dyn RewardLedger>,
    pub questions: Arc<dyn QuestionsRepository>,
    pub answers: Arc<dyn AnswersRepository>,
    pub suggestions: Arc<dyn SuggestionsRepository>,
    pub quotas: Arc<dyn QuotaRepository>,
}

impl Stores {
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: UsersRepository
            + RewardLedger
            + QuestionsRepository
            + AnswersRepository
            + SuggestionsRepository
            + QuotaRepository
            + 'static,
    {
        Self {
            users: backend.clone(),
            ledger: backend.clone(),
            questions: backend.clone(),
            answers: backend.clone(),
            suggestions: backend.clone(),
            quotas: backend,
        }
    }
}
