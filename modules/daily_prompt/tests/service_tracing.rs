mod common;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::Backend;
use daily_prompt::contract::model::{
    AnswerSort, LeaderboardSort, NewSuggestion, SignIn, TokenReward, VoteDirection, VoteOutcome,
};
use daily_prompt::domain::error::DomainError;
use daily_prompt::domain::repo::{RewardLedger, StoreError, Stores};
use daily_prompt::domain::service::{Service, ServiceConfig};
use daily_prompt::infra::clock::ManualClock;
use daily_prompt::infra::storage::SqlStore;
use tracing_test::traced_test;
use uuid::Uuid;

/// Ledger that fails every call, as a full disk would.
struct BrokenLedger;

#[async_trait]
impl RewardLedger for BrokenLedger {
    async fn credit(&self, _reward: TokenReward) -> Result<i64, StoreError> {
        Err(StoreError::Write("disk I/O error".into()))
    }

    async fn list_for_user(
        &self,
        _user_id: Uuid,
        _since: Option<DateTime<Utc>>,
        _limit: u32,
    ) -> Result<Vec<TokenReward>, StoreError> {
        Err(StoreError::Read("database is locked".into()))
    }

    async fn list_since(&self, _since: DateTime<Utc>) -> Result<Vec<TokenReward>, StoreError> {
        Ok(Vec::new())
    }
}

async fn service_with_broken_ledger() -> Service {
    let mut stores = common::stores(Backend::Memory).await;
    stores.ledger = Arc::new(BrokenLedger);
    let clock = Arc::new(ManualClock::new(common::start()));
    Service::new(stores, clock, ServiceConfig::default())
}

fn sign_in(name: &str) -> SignIn {
    SignIn {
        username: name.into(),
        avatar: None,
        platform_fid: None,
        wallet_address: None,
    }
}

#[traced_test]
#[tokio::test]
async fn sign_in_and_get_user_emit_spans() {
    let h = common::Harness::new(Backend::Memory).await;
    let user = h.svc.sign_in(sign_in("traced")).await.unwrap();
    let fetched = h.svc.get_user(user.id).await.unwrap();
    assert_eq!(fetched.id, user.id);
}

#[traced_test]
#[tokio::test]
async fn leaderboard_emits_spans() {
    let h = common::Harness::new(Backend::Sql).await;
    h.user("traced").await;
    let board = h.svc.leaderboard(LeaderboardSort::Weekly).await.unwrap();
    assert_eq!(board.len(), 1);
}

/// SQLite harness plus a handle for installing failure triggers.
async fn sql_harness() -> (common::Harness, Arc<SqlStore>) {
    let store = common::sql_store().await;
    let h = common::Harness::over(
        Stores::from_backend(store.clone()),
        ServiceConfig {
            rewards_history_limit: 1000,
            ..ServiceConfig::default()
        },
    );
    (h, store)
}

/// Abort the statement that fires `event`, rolling back its transaction.
async fn break_writes(store: &SqlStore, event: &str) {
    sqlx::query(&format!(
        "CREATE TRIGGER store_offline {event} BEGIN SELECT RAISE(ABORT, 'disk I/O error'); END"
    ))
    .execute(store.pool())
    .await
    .unwrap();
}

async fn repair_writes(store: &SqlStore) {
    sqlx::query("DROP TRIGGER store_offline")
        .execute(store.pool())
        .await
        .unwrap();
}

async fn ledger_sum(h: &common::Harness, user_id: Uuid) -> i64 {
    h.svc
        .list_rewards(user_id)
        .await
        .unwrap()
        .iter()
        .map(|r| r.amount)
        .sum()
}

#[traced_test]
#[tokio::test]
async fn failed_answer_rewards_leave_nothing_behind_and_retry_succeeds() {
    let (h, store) = sql_harness().await;
    let user = h.user("unlucky").await;
    let question = h.question_today().await;

    break_writes(&store, "BEFORE INSERT ON token_rewards").await;
    let err = h.svc.submit_answer(user.id, "hello").await.unwrap_err();
    assert!(matches!(err, DomainError::Write { .. }), "{err:?}");

    let after = h.svc.get_user(user.id).await.unwrap();
    assert_eq!(after.tokens, 0);
    assert_eq!(after.streak, 0);
    assert!(!after.has_answered_today);
    assert_eq!(after.early_bird_count, 0);
    assert!(h
        .svc
        .list_answers(question.id, AnswerSort::Recent, None)
        .await
        .unwrap()
        .is_empty());

    repair_writes(&store).await;
    let retry = h.svc.submit_answer(user.id, "hello").await.unwrap();
    assert_eq!(retry.user.tokens, 25);
    assert_eq!(retry.user.streak, 1);
    assert_eq!(ledger_sum(&h, user.id).await, 25);
}

#[traced_test]
#[tokio::test]
async fn failed_balance_increment_keeps_ledger_and_tokens_equal() {
    let (h, store) = sql_harness().await;
    let user = h.user("author").await;

    break_writes(&store, "BEFORE UPDATE OF tokens ON users").await;
    let err = h
        .svc
        .submit_suggestion(
            user.id,
            NewSuggestion {
                text: "Best walk you ever took?".into(),
                category: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Write { .. }), "{err:?}");

    assert_eq!(h.svc.get_user(user.id).await.unwrap().tokens, 0);
    assert_eq!(ledger_sum(&h, user.id).await, 0);
    assert!(h.svc.list_suggestions().await.unwrap().is_empty());

    repair_writes(&store).await;
    h.svc
        .submit_suggestion(
            user.id,
            NewSuggestion {
                text: "Best walk you ever took?".into(),
                category: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(h.svc.get_user(user.id).await.unwrap().tokens, 5);
    assert_eq!(ledger_sum(&h, user.id).await, 5);
    assert_eq!(h.svc.list_suggestions().await.unwrap().len(), 1);
}

#[traced_test]
#[tokio::test]
async fn failed_vote_reward_keeps_vote_and_quota_unspent() {
    let (h, store) = sql_harness().await;
    let author = h.user("author").await;
    let voter = h.user("voter").await;
    let s = h
        .svc
        .submit_suggestion(
            author.id,
            NewSuggestion {
                text: "Favourite sound?".into(),
                category: None,
            },
        )
        .await
        .unwrap()
        .suggestion;

    break_writes(&store, "BEFORE INSERT ON token_rewards").await;
    let err = h
        .svc
        .vote_suggestion(voter.id, s.id, VoteDirection::Up)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Write { .. }), "{err:?}");
    assert_eq!(h.svc.daily_usage(voter.id).await.unwrap().votes_used, 0);
    assert_eq!(h.svc.list_suggestions().await.unwrap()[0].votes, 0);

    repair_writes(&store).await;
    assert!(matches!(
        h.svc.vote_suggestion(voter.id, s.id, VoteDirection::Up).await.unwrap(),
        VoteOutcome::Recorded {
            votes_used_today: 1,
            ..
        }
    ));
    assert_eq!(h.svc.get_user(voter.id).await.unwrap().tokens, 1);
    assert_eq!(ledger_sum(&h, voter.id).await, 1);
}

#[traced_test]
#[tokio::test]
async fn corrupt_like_counter_is_database_error() {
    let (h, store) = sql_harness().await;
    let author = h.user("author").await;
    let question = h.question_today().await;
    h.svc.submit_answer(author.id, "mine").await.unwrap();

    sqlx::query("UPDATE answers SET likes = -1")
        .execute(store.pool())
        .await
        .unwrap();
    let err = h
        .svc
        .list_answers(question.id, AnswerSort::Popular, None)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Database { .. }), "{err:?}");
}

#[traced_test]
#[tokio::test]
async fn failed_ledger_read_is_database_error() {
    let svc = service_with_broken_ledger().await;
    let err = svc.list_rewards(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, DomainError::Database { .. }), "{err:?}");
}
