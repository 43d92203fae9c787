//! Reward amounts and the per-answer reward calculation.

use chrono::NaiveDate;

use crate::contract::model::{RewardGrant, RewardKind, User};

pub const BASE_ANSWER_REWARD: i64 = 10;

pub const EARLY_BIRD_BONUS: i64 = 15;
/// Respondents at positions `1..=EARLY_BIRD_SLOTS` get the early-bird bonus.
pub const EARLY_BIRD_SLOTS: u32 = 10;

pub const COMMUNITY_BONUS: i64 = 10;
pub const COMMUNITY_THRESHOLD: u32 = 100;

pub const POPULAR_ANSWER_BONUS: i64 = 25;
/// Likes at which an answer counts as popular.
pub const POPULAR_ANSWER_LIKES: u32 = 5;

pub const UPVOTE_GIVEN_REWARD: i64 = 5;
pub const QUESTION_SUBMIT_REWARD: i64 = 5;
pub const QUESTION_SELECTED_REWARD: i64 = 50;
pub const VOTE_REWARD: i64 = 1;

/// Multiplier applied to the whole answer reward for a streak length.
pub fn streak_multiplier(streak: u32) -> i64 {
    match streak {
        s if s >= 30 => 3,
        s if s >= 7 => 2,
        _ => 1,
    }
}

/// Streak after answering on `today`: extends a run that ended yesterday,
/// otherwise starts over at 1.
pub fn next_streak(last_answer: Option<NaiveDate>, streak: u32, today: NaiveDate) -> u32 {
    match (last_answer, today.pred_opt()) {
        (Some(last), Some(yesterday)) if last == yesterday => streak.saturating_add(1),
        _ => 1,
    }
}

/// A bonus on top of the base answer reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bonus {
    EarlyBird { position: u32, amount: i64 },
    Community { amount: i64 },
    Streak { days: u32, multiplier: i64, amount: i64 },
}

impl Bonus {
    pub fn amount(&self) -> i64 {
        match *self {
            Bonus::EarlyBird { amount, .. }
            | Bonus::Community { amount }
            | Bonus::Streak { amount, .. } => amount,
        }
    }

    pub fn kind(&self) -> RewardKind {
        match self {
            Bonus::EarlyBird { .. } => RewardKind::EarlyBird,
            Bonus::Community { .. } => RewardKind::CommunityBonus,
            Bonus::Streak { .. } => RewardKind::StreakBonus,
        }
    }

    pub fn description(&self) -> String {
        match self {
            Bonus::EarlyBird { position, .. } => format!("Early bird bonus (#{position})"),
            Bonus::Community { .. } => {
                format!("Community bonus ({COMMUNITY_THRESHOLD}+ participants)")
            }
            Bonus::Streak {
                days, multiplier, ..
            } => format!("{days}-day streak ({multiplier}x multiplier)"),
        }
    }

    pub fn grant(&self) -> RewardGrant {
        RewardGrant {
            kind: self.kind(),
            amount: self.amount(),
            description: self.description(),
        }
    }
}

/// Base reward plus bonuses, in evaluation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardBreakdown {
    pub base_reward: i64,
    pub bonuses: Vec<Bonus>,
}

impl RewardBreakdown {
    pub fn total(&self) -> i64 {
        self.base_reward + self.bonuses.iter().map(Bonus::amount).sum::<i64>()
    }

    /// Ledger grants: base first, then each bonus in order.
    pub fn grants(&self) -> Vec<RewardGrant> {
        std::iter::once(RewardGrant {
            kind: RewardKind::Answer,
            amount: self.base_reward,
            description: "Answered today's question".to_string(),
        })
        .chain(self.bonuses.iter().map(Bonus::grant))
        .collect()
    }
}

/// Reward for an answer by `user` (streak already counting this answer).
///
/// The streak bonus is computed last, from base plus every earlier bonus.
pub fn compute_reward(
    user: &User,
    answer_index_today: u32,
    total_answers_today: u32,
) -> RewardBreakdown {
    let mut bonuses = Vec::new();

    if answer_index_today <= EARLY_BIRD_SLOTS {
        bonuses.push(Bonus::EarlyBird {
            position: answer_index_today,
            amount: EARLY_BIRD_BONUS,
        });
    }

    if total_answers_today >= COMMUNITY_THRESHOLD {
        bonuses.push(Bonus::Community {
            amount: COMMUNITY_BONUS,
        });
    }

    let multiplier = streak_multiplier(user.streak);
    if multiplier > 1 {
        let subtotal = BASE_ANSWER_REWARD + bonuses.iter().map(Bonus::amount).sum::<i64>();
        bonuses.push(Bonus::Streak {
            days: user.streak,
            multiplier,
            amount: subtotal * (multiplier - 1),
        });
    }

    RewardBreakdown {
        base_reward: BASE_ANSWER_REWARD,
        bonuses,
    }
}
