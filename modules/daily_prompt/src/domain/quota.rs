use chrono::NaiveDate;

/// Suggestion votes per user per calendar day.
pub const DAILY_VOTE_LIMIT: u32 = 10;
/// Answer upvotes per user per calendar day.
pub const DAILY_UPVOTE_LIMIT: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuotaKind {
    SuggestionVote,
    AnswerUpvote,
}

impl QuotaKind {
    pub fn limit(&self) -> u32 {
        match self {
            QuotaKind::SuggestionVote => DAILY_VOTE_LIMIT,
            QuotaKind::AnswerUpvote => DAILY_UPVOTE_LIMIT,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuotaKind::SuggestionVote => "suggestion_vote",
            QuotaKind::AnswerUpvote => "answer_upvote",
        }
    }
}

/// Per-user usage counter for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyQuota {
    pub used: u32,
    pub day: NaiveDate,
}

impl DailyQuota {
    /// Usage as seen on `today`; a counter from another day reads as zero.
    pub fn used_on(&self, today: NaiveDate) -> u32 {
        if self.day == today {
            self.used
        } else {
            0
        }
    }
}

/// Usage on `today` for an optional stored counter.
pub fn used_today(current: Option<DailyQuota>, today: NaiveDate) -> u32 {
    current.map(|q| q.used_on(today)).unwrap_or(0)
}

/// Whether another unit can be consumed on `today`.
pub fn has_room(current: Option<DailyQuota>, today: NaiveDate, limit: u32) -> bool {
    used_today(current, today) < limit
}

/// Counter after consuming one unit on `today`.
///
/// The first use on a new day restarts the counter at 1. Callers check
/// `has_room` first.
pub fn consume(current: Option<DailyQuota>, today: NaiveDate) -> DailyQuota {
    DailyQuota {
        used: used_today(current, today) + 1,
        day: today,
    }
}
