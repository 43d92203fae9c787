use crate::contract::model::{
    Answer, Question, SuggestedQuestion, TokenReward, UnknownRewardKind, User, VoteDirection,
};
use crate::domain::quota::DailyQuota;
use crate::domain::repo::StoreError;
use crate::infra::storage::entity::{
    AnswerRow, QuestionRow, QuotaRow, RewardRow, SuggestionRow, UserRow, VoteRow,
};

/// Counters are stored as INTEGER; anything outside `u32` is a corrupt row.
pub(crate) fn count(column: &str, v: i64) -> Result<u32, StoreError> {
    u32::try_from(v).map_err(|_| StoreError::Read(format!("{column} out of range: {v}")))
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            username: r.username,
            avatar: r.avatar,
            platform_fid: r.platform_fid,
            wallet_address: r.wallet_address,
            tokens: r.tokens,
            streak: count("users.streak", r.streak)?,
            has_answered_today: r.has_answered_today,
            last_answer_date: r.last_answer_date,
            total_upvotes_received: count(
                "users.total_upvotes_received",
                r.total_upvotes_received,
            )?,
            total_upvotes_given: count("users.total_upvotes_given", r.total_upvotes_given)?,
            early_bird_count: count("users.early_bird_count", r.early_bird_count)?,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

impl From<QuestionRow> for Question {
    fn from(r: QuestionRow) -> Self {
        Self {
            id: r.id,
            text: r.text,
            date: r.date,
            category: r.category,
            created_at: r.created_at,
        }
    }
}

impl TryFrom<AnswerRow> for Answer {
    type Error = StoreError;

    fn try_from(r: AnswerRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            question_id: r.question_id,
            user_id: r.user_id,
            username: r.username,
            avatar: r.avatar,
            text: r.text,
            likes: count("answers.likes", r.likes)?,
            created_at: r.created_at,
            is_own_answer: false,
        })
    }
}

impl TryFrom<RewardRow> for TokenReward {
    type Error = StoreError;

    fn try_from(r: RewardRow) -> Result<Self, Self::Error> {
        let kind = r
            .kind
            .parse()
            .map_err(|e: UnknownRewardKind| StoreError::Read(e.to_string()))?;
        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            kind,
            amount: r.amount,
            description: r.description,
            timestamp: r.timestamp,
        })
    }
}

impl TryFrom<QuotaRow> for DailyQuota {
    type Error = StoreError;

    fn try_from(r: QuotaRow) -> Result<Self, Self::Error> {
        Ok(Self {
            used: count("daily_quotas.used", r.used)?,
            day: r.day,
        })
    }
}

/// Attach voter sets to a suggestion row. `votes` may hold other suggestions' rows.
pub fn suggestion_with_votes(
    r: SuggestionRow,
    votes: &[VoteRow],
) -> Result<SuggestedQuestion, StoreError> {
    let mut upvoted_by = Vec::new();
    let mut downvoted_by = Vec::new();
    for v in votes.iter().filter(|v| v.suggestion_id == r.id) {
        match v.direction.parse::<VoteDirection>().map_err(StoreError::Read)? {
            VoteDirection::Up => upvoted_by.push(v.user_id),
            VoteDirection::Down => downvoted_by.push(v.user_id),
        }
    }
    Ok(SuggestedQuestion {
        id: r.id,
        text: r.text,
        category: r.category,
        submitted_by: r.submitted_by,
        submitted_by_username: r.submitted_by_username,
        submitted_at: r.submitted_at,
        votes: r.votes,
        upvoted_by,
        downvoted_by,
        is_selected: r.is_selected,
        selected_date: r.selected_date,
    })
}
