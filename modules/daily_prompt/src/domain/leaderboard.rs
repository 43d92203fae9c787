use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::contract::model::{Answer, LeaderboardEntry, LeaderboardSort, TokenReward, User};
use crate::domain::rewards::POPULAR_ANSWER_LIKES;

/// Length of the trailing window used for `weekly_tokens`.
pub const WEEKLY_WINDOW_DAYS: i64 = 7;

pub fn weekly_window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(WEEKLY_WINDOW_DAYS)
}

/// Aggregate users into leaderboard rows ranked by total tokens.
///
/// Rewards outside the trailing window ending at `now` are ignored, as are
/// answers below the popularity threshold. Ties keep input order.
pub fn build_leaderboard(
    users: &[User],
    weekly_rewards: &[TokenReward],
    popular_answers: &[Answer],
    now: DateTime<Utc>,
) -> Vec<LeaderboardEntry> {
    let since = weekly_window_start(now);

    let mut weekly: HashMap<Uuid, i64> = HashMap::new();
    for r in weekly_rewards
        .iter()
        .filter(|r| r.timestamp >= since && r.timestamp <= now)
    {
        *weekly.entry(r.user_id).or_default() += r.amount;
    }

    let mut popular: HashMap<Uuid, u32> = HashMap::new();
    for a in popular_answers
        .iter()
        .filter(|a| a.likes >= POPULAR_ANSWER_LIKES)
    {
        *popular.entry(a.user_id).or_default() += 1;
    }

    let mut entries: Vec<LeaderboardEntry> = users
        .iter()
        .map(|u| LeaderboardEntry {
            user: u.clone(),
            rank: 0,
            total_tokens: u.tokens,
            weekly_tokens: weekly.get(&u.id).copied().unwrap_or(0),
            popular_answers: popular.get(&u.id).copied().unwrap_or(0),
        })
        .collect();

    rerank(&mut entries, LeaderboardSort::Total);
    entries
}

/// Stable descending sort on `sort`'s key, then 1-based ranks by position.
pub fn rerank(entries: &mut [LeaderboardEntry], sort: LeaderboardSort) {
    match sort {
        LeaderboardSort::Total => entries.sort_by(|a, b| b.total_tokens.cmp(&a.total_tokens)),
        LeaderboardSort::Weekly => entries.sort_by(|a, b| b.weekly_tokens.cmp(&a.weekly_tokens)),
    }
    for (i, e) in entries.iter_mut().enumerate() {
        e.rank = i as u32 + 1;
    }
}
