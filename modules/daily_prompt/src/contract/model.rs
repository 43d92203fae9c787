use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// Avatar assigned when sign-in does not provide one.
pub const DEFAULT_AVATAR: &str = "👤";

/// Pure user model (no serde/utoipa here; REST DTOs live in the api layer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub avatar: String,
    pub platform_fid: Option<i64>,
    pub wallet_address: Option<String>,
    /// Token balance. Only moves through ledger grants.
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

impl User {
    /// Fresh account with zeroed counters.
    pub fn new(id: Uuid, username: String, avatar: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            username,
            avatar,
            platform_fid: None,
            wallet_address: None,
            tokens: 0,
            streak: 0,
            has_answered_today: false,
            last_answer_date: None,
            total_upvotes_received: 0,
            total_upvotes_given: 0,
            early_bird_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the user has answered on `today`, regardless of a stale stored flag.
    pub fn answered_on(&self, today: NaiveDate) -> bool {
        self.has_answered_today && self.last_answer_date == Some(today)
    }
}

/// Sign-in payload; upserts the user.
#[derive(Debug, Clone, Default)]
pub struct SignIn {
    pub username: String,
    pub avatar: Option<String>,
    pub platform_fid: Option<i64>,
    pub wallet_address: Option<String>,
}

/// A daily prompt; exactly one per date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: Uuid,
    pub text: String,
    pub date: NaiveDate,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub text: String,
    pub date: NaiveDate,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub id: Uuid,
    pub question_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub avatar: String,
    pub text: String,
    pub likes: u32,
    pub created_at: DateTime<Utc>,
    /// Relative to the viewer; never persisted.
    pub is_own_answer: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnswerSort {
    #[default]
    Popular,
    Recent,
}

/// Why a balance changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RewardKind {
    Answer,
    EarlyBird,
    UpvotesReceived,
    StreakBonus,
    CommunityBonus,
    UpvoteGiven,
    QuestionSubmit,
    QuestionSelected,
    VoteQuestion,
}

impl RewardKind {
    pub const ALL: [RewardKind; 9] = [
        RewardKind::Answer,
        RewardKind::EarlyBird,
        RewardKind::UpvotesReceived,
        RewardKind::StreakBonus,
        RewardKind::CommunityBonus,
        RewardKind::UpvoteGiven,
        RewardKind::QuestionSubmit,
        RewardKind::QuestionSelected,
        RewardKind::VoteQuestion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RewardKind::Answer => "answer",
            RewardKind::EarlyBird => "early_bird",
            RewardKind::UpvotesReceived => "upvotes_received",
            RewardKind::StreakBonus => "streak_bonus",
            RewardKind::CommunityBonus => "community_bonus",
            RewardKind::UpvoteGiven => "upvote_given",
            RewardKind::QuestionSubmit => "question_submit",
            RewardKind::QuestionSelected => "question_selected",
            RewardKind::VoteQuestion => "vote_question",
        }
    }
}

impl fmt::Display for RewardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRewardKind(pub String);

impl fmt::Display for UnknownRewardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown reward kind '{}'", self.0)
    }
}

impl std::error::Error for UnknownRewardKind {}

impl FromStr for RewardKind {
    type Err = UnknownRewardKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RewardKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownRewardKind(s.to_string()))
    }
}

/// A reward about to be granted; becomes a `TokenReward` once appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardGrant {
    pub kind: RewardKind,
    pub amount: i64,
    pub description: String,
}

/// Immutable ledger entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenReward {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: RewardKind,
    pub amount: i64,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestedQuestion {
    pub id: Uuid,
    pub text: String,
    pub category: Option<String>,
    pub submitted_by: Uuid,
    pub submitted_by_username: String,
    pub submitted_at: DateTime<Utc>,
    /// Net score; may go negative.
    pub votes: i64,
    pub upvoted_by: Vec<Uuid>,
    pub downvoted_by: Vec<Uuid>,
    pub is_selected: bool,
    pub selected_date: Option<NaiveDate>,
}

impl SuggestedQuestion {
    pub fn vote_of(&self, user_id: Uuid) -> Option<VoteDirection> {
        if self.upvoted_by.contains(&user_id) {
            Some(VoteDirection::Up)
        } else if self.downvoted_by.contains(&user_id) {
            Some(VoteDirection::Down)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewSuggestion {
    pub text: String,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteDirection::Up => "up",
            VoteDirection::Down => "down",
        }
    }

    /// Score contribution of a single vote in this direction.
    pub fn weight(&self) -> i64 {
        match self {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
        }
    }
}

impl FromStr for VoteDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(VoteDirection::Up),
            "down" => Ok(VoteDirection::Down),
            other => Err(format!("unknown vote direction '{other}'")),
        }
    }
}

/// Derived per-user leaderboard row; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub user: User,
    pub rank: u32,
    pub total_tokens: i64,
    pub weekly_tokens: i64,
    pub popular_answers: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeaderboardSort {
    #[default]
    Total,
    Weekly,
}

/// Result of a successful answer submission.
#[derive(Debug, Clone)]
pub struct AnswerSubmission {
    pub answer: Answer,
    pub rewards: Vec<TokenReward>,
    pub user: User,
}

#[derive(Debug, Clone)]
pub enum LikeOutcome {
    Liked {
        answer: Answer,
        rewards: Vec<TokenReward>,
        likes_used_today: u32,
    },
    AlreadyLiked {
        answer: Answer,
    },
    /// Daily upvote cap reached; nothing changed.
    RateLimited {
        likes_used_today: u32,
    },
}

#[derive(Debug, Clone)]
pub enum VoteOutcome {
    Recorded {
        suggestion: SuggestedQuestion,
        reward: TokenReward,
        votes_used_today: u32,
    },
    /// Same direction as the existing vote; nothing changed.
    Unchanged {
        suggestion: SuggestedQuestion,
    },
    /// Daily vote cap reached; nothing changed.
    RateLimited {
        votes_used_today: u32,
    },
}

/// Suggestion accepted for review plus its submission reward.
#[derive(Debug, Clone)]
pub struct SuggestionSubmission {
    pub suggestion: SuggestedQuestion,
    pub reward: TokenReward,
}

/// A suggestion promoted to the daily question for a date.
#[derive(Debug, Clone)]
pub struct Selection {
    pub suggestion: SuggestedQuestion,
    pub question: Question,
    pub reward: TokenReward,
}

/// How much of each daily quota a user has consumed today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyUsage {
    pub votes_used: u32,
    pub votes_limit: u32,
    pub upvotes_used: u32,
    pub upvotes_limit: u32,
}
