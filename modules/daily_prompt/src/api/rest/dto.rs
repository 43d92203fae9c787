use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::contract::model::{
    Answer, AnswerSort, AnswerSubmission, DailyUsage, LeaderboardEntry, LeaderboardSort,
    LikeOutcome, NewQuestion, NewSuggestion, Question, Selection, SignIn, SuggestedQuestion,
    SuggestionSubmission, TokenReward, User, VoteDirection, VoteOutcome,
};

/// REST DTO for user representation
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Uuid,
    pub username: String,
    pub avatar: String,
    pub platform_fid: Option<i64>,
    pub wallet_address: Option<String>,
    pub tokens: i64,
    pub streak: u32,
    pub has_answered_today: bool,
    pub last_answer_date: Option<NaiveDate>,
    pub total_upvotes_received: u32,
    pub total_upvotes_given: u32,
    pub early_bird_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignInReq {
    pub username: String,
    pub avatar: Option<String>,
    pub platform_fid: Option<i64>,
    pub wallet_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenRewardDto {
    pub id: Uuid,
    pub user_id: Uuid,
    /// One of `answer`, `early_bird`, `upvotes_received`, `streak_bonus`,
    /// `community_bonus`, `upvote_given`, `question_submit`,
    /// `question_selected`, `vote_question`.
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: i64,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyUsageDto {
    pub votes_used: u32,
    pub votes_limit: u32,
    pub upvotes_used: u32,
    pub upvotes_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDto {
    pub id: Uuid,
    pub text: String,
    pub date: NaiveDate,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Schedule a prompt for a calendar date.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleQuestionReq {
    pub text: String,
    pub date: NaiveDate,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnswerDto {
    pub id: Uuid,
    pub question_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub avatar: String,
    pub text: String,
    pub likes: u32,
    pub created_at: DateTime<Utc>,
    pub is_own_answer: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerReq {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSubmissionDto {
    pub answer: AnswerDto,
    pub rewards: Vec<TokenRewardDto>,
    pub user: UserDto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AnswerSortParam {
    Popular,
    Recent,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListAnswersQuery {
    /// `popular` (default) or `recent`.
    pub sort: Option<AnswerSortParam>,
}

/// Result tag for like and vote attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Liked,
    AlreadyLiked,
    Recorded,
    Unchanged,
    RateLimited,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikeResultDto {
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<AnswerDto>,
    pub rewards: Vec<TokenRewardDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likes_used_today: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionDto {
    pub id: Uuid,
    pub text: String,
    pub category: Option<String>,
    pub submitted_by: Uuid,
    pub submitted_by_username: String,
    pub submitted_at: DateTime<Utc>,
    pub votes: i64,
    pub upvoted_by: Vec<Uuid>,
    pub downvoted_by: Vec<Uuid>,
    pub is_selected: bool,
    pub selected_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitSuggestionReq {
    pub text: String,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionSubmissionDto {
    pub suggestion: SuggestionDto,
    pub reward: TokenRewardDto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirectionParam {
    Up,
    Down,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteReq {
    pub direction: VoteDirectionParam,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteResultDto {
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<SuggestionDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward: Option<TokenRewardDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub votes_used_today: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectSuggestionReq {
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectionDto {
    pub suggestion: SuggestionDto,
    pub question: QuestionDto,
    pub reward: TokenRewardDto,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntryDto {
    pub user: UserDto,
    pub rank: u32,
    pub total_tokens: i64,
    pub weekly_tokens: i64,
    pub popular_answers: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardSortParam {
    Total,
    Weekly,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaderboardQuery {
    /// `total` (default) or `weekly`.
    pub sort: Option<LeaderboardSortParam>,
}

// Conversion implementations between REST DTOs and contract models

impl From<User> for UserDto {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            avatar: u.avatar,
            platform_fid: u.platform_fid,
            wallet_address: u.wallet_address,
            tokens: u.tokens,
            streak: u.streak,
            has_answered_today: u.has_answered_today,
            last_answer_date: u.last_answer_date,
            total_upvotes_received: u.total_upvotes_received,
            total_upvotes_given: u.total_upvotes_given,
            early_bird_count: u.early_bird_count,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

impl From<SignInReq> for SignIn {
    fn from(req: SignInReq) -> Self {
        Self {
            username: req.username,
            avatar: req.avatar,
            platform_fid: req.platform_fid,
            wallet_address: req.wallet_address,
        }
    }
}

impl From<TokenReward> for TokenRewardDto {
    fn from(r: TokenReward) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            kind: r.kind.as_str().to_string(),
            amount: r.amount,
            description: r.description,
            timestamp: r.timestamp,
        }
    }
}

impl From<DailyUsage> for DailyUsageDto {
    fn from(u: DailyUsage) -> Self {
        Self {
            votes_used: u.votes_used,
            votes_limit: u.votes_limit,
            upvotes_used: u.upvotes_used,
            upvotes_limit: u.upvotes_limit,
        }
    }
}

impl From<Question> for QuestionDto {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            text: q.text,
            date: q.date,
            category: q.category,
            created_at: q.created_at,
        }
    }
}

impl From<ScheduleQuestionReq> for NewQuestion {
    fn from(req: ScheduleQuestionReq) -> Self {
        Self {
            text: req.text,
            date: req.date,
            category: req.category,
        }
    }
}

impl From<Answer> for AnswerDto {
    fn from(a: Answer) -> Self {
        Self {
            id: a.id,
            question_id: a.question_id,
            user_id: a.user_id,
            username: a.username,
            avatar: a.avatar,
            text: a.text,
            likes: a.likes,
            created_at: a.created_at,
            is_own_answer: a.is_own_answer,
        }
    }
}

impl From<AnswerSubmission> for AnswerSubmissionDto {
    fn from(s: AnswerSubmission) -> Self {
        Self {
            answer: s.answer.into(),
            rewards: s.rewards.into_iter().map(TokenRewardDto::from).collect(),
            user: s.user.into(),
        }
    }
}

impl From<AnswerSortParam> for AnswerSort {
    fn from(p: AnswerSortParam) -> Self {
        match p {
            AnswerSortParam::Popular => AnswerSort::Popular,
            AnswerSortParam::Recent => AnswerSort::Recent,
        }
    }
}

impl From<LikeOutcome> for LikeResultDto {
    fn from(o: LikeOutcome) -> Self {
        match o {
            LikeOutcome::Liked {
                answer,
                rewards,
                likes_used_today,
            } => Self {
                status: OutcomeStatus::Liked,
                answer: Some(answer.into()),
                rewards: rewards.into_iter().map(TokenRewardDto::from).collect(),
                likes_used_today: Some(likes_used_today),
            },
            LikeOutcome::AlreadyLiked { answer } => Self {
                status: OutcomeStatus::AlreadyLiked,
                answer: Some(answer.into()),
                rewards: Vec::new(),
                likes_used_today: None,
            },
            LikeOutcome::RateLimited { likes_used_today } => Self {
                status: OutcomeStatus::RateLimited,
                answer: None,
                rewards: Vec::new(),
                likes_used_today: Some(likes_used_today),
            },
        }
    }
}

impl From<SuggestedQuestion> for SuggestionDto {
    fn from(s: SuggestedQuestion) -> Self {
        Self {
            id: s.id,
            text: s.text,
            category: s.category,
            submitted_by: s.submitted_by,
            submitted_by_username: s.submitted_by_username,
            submitted_at: s.submitted_at,
            votes: s.votes,
            upvoted_by: s.upvoted_by,
            downvoted_by: s.downvoted_by,
            is_selected: s.is_selected,
            selected_date: s.selected_date,
        }
    }
}

impl From<SubmitSuggestionReq> for NewSuggestion {
    fn from(req: SubmitSuggestionReq) -> Self {
        Self {
            text: req.text,
            category: req.category,
        }
    }
}

impl From<SuggestionSubmission> for SuggestionSubmissionDto {
    fn from(s: SuggestionSubmission) -> Self {
        Self {
            suggestion: s.suggestion.into(),
            reward: s.reward.into(),
        }
    }
}

impl From<VoteDirectionParam> for VoteDirection {
    fn from(p: VoteDirectionParam) -> Self {
        match p {
            VoteDirectionParam::Up => VoteDirection::Up,
            VoteDirectionParam::Down => VoteDirection::Down,
        }
    }
}

impl From<VoteOutcome> for VoteResultDto {
    fn from(o: VoteOutcome) -> Self {
        match o {
            VoteOutcome::Recorded {
                suggestion,
                reward,
                votes_used_today,
            } => Self {
                status: OutcomeStatus::Recorded,
                suggestion: Some(suggestion.into()),
                reward: Some(reward.into()),
                votes_used_today: Some(votes_used_today),
            },
            VoteOutcome::Unchanged { suggestion } => Self {
                status: OutcomeStatus::Unchanged,
                suggestion: Some(suggestion.into()),
                reward: None,
                votes_used_today: None,
            },
            VoteOutcome::RateLimited { votes_used_today } => Self {
                status: OutcomeStatus::RateLimited,
                suggestion: None,
                reward: None,
                votes_used_today: Some(votes_used_today),
            },
        }
    }
}

impl From<Selection> for SelectionDto {
    fn from(s: Selection) -> Self {
        Self {
            suggestion: s.suggestion.into(),
            question: s.question.into(),
            reward: s.reward.into(),
        }
    }
}

impl From<LeaderboardEntry> for LeaderboardEntryDto {
    fn from(e: LeaderboardEntry) -> Self {
        Self {
            user: e.user.into(),
            rank: e.rank,
            total_tokens: e.total_tokens,
            weekly_tokens: e.weekly_tokens,
            popular_answers: e.popular_answers,
        }
    }
}

impl From<LeaderboardSortParam> for LeaderboardSort {
    fn from(p: LeaderboardSortParam) -> Self {
        match p {
            LeaderboardSortParam::Total => LeaderboardSort::Total,
            LeaderboardSortParam::Weekly => LeaderboardSort::Weekly,
        }
    }
}
