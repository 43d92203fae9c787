use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};
use uuid::Uuid;

use crate::contract::model::{Answer, Question, SuggestedQuestion, TokenReward, User, VoteDirection};
use crate::domain::quota::{self, DailyQuota, QuotaKind};
use crate::domain::repo::{
    AnswersRepository, LikeGrants, LikeRecord, QuestionsRepository, QuotaRepository,
    RewardLedger, StoreError, SuggestionsRepository, UsersRepository, VoteRecord,
};
use crate::infra::storage::entity::{
    AnswerRow, QuestionRow, QuotaRow, RewardRow, SuggestionRow, UserRow, VoteRow,
};
use crate::infra::storage::mapper::{count, suggestion_with_votes};

macro_rules! user_select {
    () => {
        "SELECT id, username, avatar, platform_fid, wallet_address, tokens, streak, \
         has_answered_today, last_answer_date, total_upvotes_received, total_upvotes_given, \
         early_bird_count, created_at, updated_at FROM users "
    };
}

macro_rules! answer_select {
    () => {
        "SELECT a.id, a.question_id, a.user_id, u.username, u.avatar, a.text, a.likes, \
         a.created_at FROM answers a JOIN users u ON u.id = a.user_id "
    };
}

macro_rules! suggestion_select {
    () => {
        "SELECT s.id, s.text, s.category, s.submitted_by, u.username AS submitted_by_username, \
         s.submitted_at, s.votes, s.is_selected, s.selected_date \
         FROM suggested_questions s JOIN users u ON u.id = s.submitted_by "
    };
}

macro_rules! reward_select {
    () => {
        "SELECT id, user_id, kind, amount, description, timestamp FROM token_rewards "
    };
}

fn read_err(e: sqlx::Error) -> StoreError {
    StoreError::Read(e.to_string())
}

fn write_err(e: sqlx::Error) -> StoreError {
    StoreError::Write(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// SQLite-backed store. Schema migrations run on `connect`.
#[derive(Clone)]
pub struct SqlStore {
    pool: SqlitePool,
}

impl SqlStore {
    /// Open (creating if missing) the database at `url` and apply migrations.
    ///
    /// In-memory databases are pinned to a single long-lived connection, since
    /// each SQLite connection would otherwise see its own empty database.
    pub async fn connect(
        url: &str,
        max_conns: u32,
        busy_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let options = SqliteConnectOptions::from_str(url)
            .map_err(read_err)?
            .create_if_missing(true)
            .busy_timeout(busy_timeout);

        let mut pool_options = SqlitePoolOptions::new();
        pool_options = if in_memory {
            pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options.max_connections(max_conns.max(1))
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(read_err)?;
        info!(in_memory, "Connected to SQLite store");

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Write(format!("migration failed: {e}")))?;
        debug!("Schema up to date");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn load_votes(&self, suggestion_id: Uuid) -> Result<Vec<VoteRow>, StoreError> {
        sqlx::query_as::<_, VoteRow>(
            "SELECT suggestion_id, user_id, direction FROM suggestion_votes \
             WHERE suggestion_id = ? ORDER BY rowid",
        )
        .bind(suggestion_id)
        .fetch_all(&self.pool)
        .await
        .map_err(read_err)
    }
}

async fn load_quota(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    kind: QuotaKind,
) -> Result<Option<DailyQuota>, StoreError> {
    let row = sqlx::query_as::<_, QuotaRow>(
        "SELECT used, day FROM daily_quotas WHERE user_id = ? AND kind = ?",
    )
    .bind(user_id)
    .bind(kind.as_str())
    .fetch_optional(conn)
    .await
    .map_err(read_err)?;
    row.map(DailyQuota::try_from).transpose()
}

async fn save_quota(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    kind: QuotaKind,
    q: DailyQuota,
) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO daily_quotas (user_id, kind, used, day) VALUES (?, ?, ?, ?) \
         ON CONFLICT (user_id, kind) DO UPDATE SET used = excluded.used, day = excluded.day",
    )
    .bind(user_id)
    .bind(kind.as_str())
    .bind(i64::from(q.used))
    .bind(q.day)
    .execute(conn)
    .await
    .map_err(write_err)?;
    Ok(())
}

/// Overwrite everything but the balance.
async fn save_user(conn: &mut SqliteConnection, u: &User) -> Result<(), StoreError> {
    let res = sqlx::query(
        "UPDATE users SET username = ?, avatar = ?, platform_fid = ?, wallet_address = ?, \
         streak = ?, has_answered_today = ?, last_answer_date = ?, \
         total_upvotes_received = ?, total_upvotes_given = ?, early_bird_count = ?, \
         updated_at = ? WHERE id = ?",
    )
    .bind(&u.username)
    .bind(&u.avatar)
    .bind(u.platform_fid)
    .bind(&u.wallet_address)
    .bind(i64::from(u.streak))
    .bind(u.has_answered_today)
    .bind(u.last_answer_date)
    .bind(i64::from(u.total_upvotes_received))
    .bind(i64::from(u.total_upvotes_given))
    .bind(i64::from(u.early_bird_count))
    .bind(u.updated_at)
    .bind(u.id)
    .execute(conn)
    .await
    .map_err(write_err)?;
    if res.rows_affected() == 0 {
        return Err(StoreError::not_found("user", u.id));
    }
    Ok(())
}

/// Ledger insert plus balance increment on the caller's transaction.
async fn apply_credit(
    conn: &mut SqliteConnection,
    reward: &TokenReward,
) -> Result<i64, StoreError> {
    sqlx::query(
        "INSERT INTO token_rewards (id, user_id, kind, amount, description, timestamp) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(reward.id)
    .bind(reward.user_id)
    .bind(reward.kind.as_str())
    .bind(reward.amount)
    .bind(&reward.description)
    .bind(reward.timestamp)
    .execute(&mut *conn)
    .await
    .map_err(write_err)?;

    sqlx::query_scalar::<_, i64>(
        "UPDATE users SET tokens = tokens + ? WHERE id = ? RETURNING tokens",
    )
    .bind(reward.amount)
    .bind(reward.user_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(write_err)?
    .ok_or_else(|| StoreError::not_found("user", reward.user_id))
}

/// Fail with `RateLimitExceeded` when `kind` has no room left on `today`.
fn ensure_room(
    current: Option<DailyQuota>,
    kind: QuotaKind,
    today: NaiveDate,
    limit: u32,
) -> Result<(), StoreError> {
    if quota::has_room(current, today, limit) {
        Ok(())
    } else {
        Err(StoreError::RateLimitExceeded {
            kind,
            used: quota::used_today(current, today),
        })
    }
}

#[async_trait]
impl UsersRepository for SqlStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(concat!(user_select!(), "WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(read_err)?;
        row.map(User::try_from).transpose()
    }

    async fn find_by_platform_fid(&self, fid: i64) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(concat!(user_select!(), "WHERE platform_fid = ?"))
            .bind(fid)
            .fetch_optional(&self.pool)
            .await
            .map_err(read_err)?;
        row.map(User::try_from).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(concat!(
            user_select!(),
            "WHERE username = ? ORDER BY rowid LIMIT 1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(read_err)?;
        row.map(User::try_from).transpose()
    }

    async fn insert(&self, u: User) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO users (id, username, avatar, platform_fid, wallet_address, tokens, \
             streak, has_answered_today, last_answer_date, total_upvotes_received, \
             total_upvotes_given, early_bird_count, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(u.id)
        .bind(&u.username)
        .bind(&u.avatar)
        .bind(u.platform_fid)
        .bind(&u.wallet_address)
        .bind(u.tokens)
        .bind(i64::from(u.streak))
        .bind(u.has_answered_today)
        .bind(u.last_answer_date)
        .bind(i64::from(u.total_upvotes_received))
        .bind(i64::from(u.total_upvotes_given))
        .bind(i64::from(u.early_bird_count))
        .bind(u.created_at)
        .bind(u.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict(format!("user {}", u.id))
            } else {
                write_err(e)
            }
        })?;
        Ok(())
    }

    async fn update(&self, u: User) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await.map_err(write_err)?;
        save_user(&mut conn, &u).await
    }

    async fn list_top(&self, limit: u32) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, UserRow>(concat!(
            user_select!(),
            "ORDER BY tokens DESC, rowid ASC LIMIT ?"
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(read_err)?;
        rows.into_iter().map(User::try_from).collect()
    }
}

#[async_trait]
impl RewardLedger for SqlStore {
    async fn credit(&self, reward: TokenReward) -> Result<i64, StoreError> {
        let mut tx = self.pool.begin().await.map_err(write_err)?;
        let balance = apply_credit(&mut tx, &reward).await?;
        tx.commit().await.map_err(write_err)?;
        Ok(balance)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        since: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<TokenReward>, StoreError> {
        let rows = sqlx::query_as::<_, RewardRow>(concat!(
            reward_select!(),
            "WHERE user_id = ? AND (? IS NULL OR timestamp >= ?) \
             ORDER BY timestamp DESC, rowid DESC LIMIT ?"
        ))
        .bind(user_id)
        .bind(since)
        .bind(since)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(read_err)?;
        rows.into_iter().map(TokenReward::try_from).collect()
    }

    async fn list_since(&self, since: DateTime<Utc>) -> Result<Vec<TokenReward>, StoreError> {
        let rows = sqlx::query_as::<_, RewardRow>(concat!(
            reward_select!(),
            "WHERE timestamp >= ? ORDER BY timestamp, rowid"
        ))
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(read_err)?;
        rows.into_iter().map(TokenReward::try_from).collect()
    }
}

#[async_trait]
impl QuestionsRepository for SqlStore {
    async fn find_by_date(&self, date: NaiveDate) -> Result<Option<Question>, StoreError> {
        let row = sqlx::query_as::<_, QuestionRow>(
            "SELECT id, text, date, category, created_at FROM questions WHERE date = ?",
        )
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .map_err(read_err)?;
        Ok(row.map(Question::from))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Question>, StoreError> {
        let row = sqlx::query_as::<_, QuestionRow>(
            "SELECT id, text, date, category, created_at FROM questions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(read_err)?;
        Ok(row.map(Question::from))
    }

    async fn insert(&self, q: Question) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO questions (id, text, date, category, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(q.id)
        .bind(&q.text)
        .bind(q.date)
        .bind(&q.category)
        .bind(q.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict(format!("question for {}", q.date))
            } else {
                write_err(e)
            }
        })?;
        Ok(())
    }
}

#[async_trait]
impl AnswersRepository for SqlStore {
    async fn submit(
        &self,
        a: Answer,
        author: User,
        rewards: Vec<TokenReward>,
    ) -> Result<i64, StoreError> {
        let mut tx = self.pool.begin().await.map_err(write_err)?;
        sqlx::query(
            "INSERT INTO answers (id, question_id, user_id, text, likes, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(a.id)
        .bind(a.question_id)
        .bind(a.user_id)
        .bind(&a.text)
        .bind(i64::from(a.likes))
        .bind(a.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateAnswer {
                    question_id: a.question_id,
                    user_id: a.user_id,
                }
            } else {
                write_err(e)
            }
        })?;

        save_user(&mut tx, &author).await?;
        for r in &rewards {
            apply_credit(&mut tx, r).await?;
        }
        let balance = sqlx::query_scalar::<_, i64>("SELECT tokens FROM users WHERE id = ?")
            .bind(author.id)
            .fetch_one(&mut *tx)
            .await
            .map_err(read_err)?;
        tx.commit().await.map_err(write_err)?;
        Ok(balance)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Answer>, StoreError> {
        let row = sqlx::query_as::<_, AnswerRow>(concat!(answer_select!(), "WHERE a.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(read_err)?;
        row.map(Answer::try_from).transpose()
    }

    async fn count_for_question(&self, question_id: Uuid) -> Result<u32, StoreError> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM answers WHERE question_id = ?")
            .bind(question_id)
            .fetch_one(&self.pool)
            .await
            .map_err(read_err)?;
        count("answer count", n)
    }

    async fn list_for_question(&self, question_id: Uuid) -> Result<Vec<Answer>, StoreError> {
        let rows = sqlx::query_as::<_, AnswerRow>(concat!(
            answer_select!(),
            "WHERE a.question_id = ? ORDER BY a.created_at, a.rowid"
        ))
        .bind(question_id)
        .fetch_all(&self.pool)
        .await
        .map_err(read_err)?;
        rows.into_iter().map(Answer::try_from).collect()
    }

    async fn list_with_min_likes(&self, min_likes: u32) -> Result<Vec<Answer>, StoreError> {
        let rows = sqlx::query_as::<_, AnswerRow>(concat!(
            answer_select!(),
            "WHERE a.likes >= ? ORDER BY a.created_at, a.rowid"
        ))
        .bind(i64::from(min_likes))
        .fetch_all(&self.pool)
        .await
        .map_err(read_err)?;
        rows.into_iter().map(Answer::try_from).collect()
    }

    async fn record_like(
        &self,
        answer_id: Uuid,
        user_id: Uuid,
        today: NaiveDate,
        limit: u32,
        grants: LikeGrants,
    ) -> Result<LikeRecord, StoreError> {
        let mut tx = self.pool.begin().await.map_err(write_err)?;

        let author_id = sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM answers WHERE id = ?")
            .bind(answer_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(read_err)?
            .ok_or_else(|| StoreError::not_found("answer", answer_id))?;

        let liked = sqlx::query_scalar::<_, i64>(
            "SELECT 1 FROM answer_likes WHERE answer_id = ? AND user_id = ?",
        )
        .bind(answer_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(read_err)?;
        if liked.is_some() {
            return Ok(LikeRecord::AlreadyLiked);
        }

        let kind = QuotaKind::AnswerUpvote;
        let current = load_quota(&mut tx, user_id, kind).await?;
        ensure_room(current, kind, today, limit)?;

        sqlx::query("INSERT INTO answer_likes (answer_id, user_id) VALUES (?, ?)")
            .bind(answer_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(write_err)?;
        let likes = sqlx::query_scalar::<_, i64>(
            "UPDATE answers SET likes = likes + 1 WHERE id = ? RETURNING likes",
        )
        .bind(answer_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(write_err)
        .and_then(|n| count("answers.likes", n))?;

        let next = quota::consume(current, today);
        save_quota(&mut tx, user_id, kind, next).await?;

        let now = grants.given.timestamp;
        let given = sqlx::query(
            "UPDATE users SET total_upvotes_given = total_upvotes_given + 1, updated_at = ? \
             WHERE id = ?",
        )
        .bind(now)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(write_err)?;
        if given.rows_affected() == 0 {
            return Err(StoreError::not_found("user", user_id));
        }
        sqlx::query(
            "UPDATE users SET total_upvotes_received = total_upvotes_received + 1, \
             updated_at = ? WHERE id = ?",
        )
        .bind(now)
        .bind(author_id)
        .execute(&mut *tx)
        .await
        .map_err(write_err)?;

        apply_credit(&mut tx, &grants.given).await?;
        let popular = likes == grants.popular_at;
        if popular {
            apply_credit(&mut tx, &grants.popular).await?;
        }
        tx.commit().await.map_err(write_err)?;

        Ok(LikeRecord::Applied {
            likes,
            used_today: next.used,
            popular,
        })
    }
}

#[async_trait]
impl SuggestionsRepository for SqlStore {
    async fn submit(&self, s: SuggestedQuestion, reward: TokenReward) -> Result<i64, StoreError> {
        let mut tx = self.pool.begin().await.map_err(write_err)?;
        sqlx::query(
            "INSERT INTO suggested_questions \
             (id, text, category, submitted_by, submitted_at, votes, is_selected, selected_date) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(s.id)
        .bind(&s.text)
        .bind(&s.category)
        .bind(s.submitted_by)
        .bind(s.submitted_at)
        .bind(s.votes)
        .bind(s.is_selected)
        .bind(s.selected_date)
        .execute(&mut *tx)
        .await
        .map_err(write_err)?;
        let balance = apply_credit(&mut tx, &reward).await?;
        tx.commit().await.map_err(write_err)?;
        Ok(balance)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<SuggestedQuestion>, StoreError> {
        let row = sqlx::query_as::<_, SuggestionRow>(concat!(suggestion_select!(), "WHERE s.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(read_err)?;
        match row {
            Some(row) => {
                let votes = self.load_votes(id).await?;
                suggestion_with_votes(row, &votes).map(Some)
            }
            None => Ok(None),
        }
    }

    async fn list_open(&self) -> Result<Vec<SuggestedQuestion>, StoreError> {
        let rows = sqlx::query_as::<_, SuggestionRow>(concat!(
            suggestion_select!(),
            "WHERE s.is_selected = 0 ORDER BY s.submitted_at, s.rowid"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(read_err)?;
        let votes = sqlx::query_as::<_, VoteRow>(
            "SELECT v.suggestion_id, v.user_id, v.direction FROM suggestion_votes v \
             JOIN suggested_questions s ON s.id = v.suggestion_id \
             WHERE s.is_selected = 0 ORDER BY v.rowid",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(read_err)?;
        rows.into_iter()
            .map(|row| suggestion_with_votes(row, &votes))
            .collect()
    }

    async fn record_vote(
        &self,
        suggestion_id: Uuid,
        user_id: Uuid,
        direction: VoteDirection,
        today: NaiveDate,
        limit: u32,
        reward: TokenReward,
    ) -> Result<VoteRecord, StoreError> {
        let mut tx = self.pool.begin().await.map_err(write_err)?;

        let kind = QuotaKind::SuggestionVote;
        let current = load_quota(&mut tx, user_id, kind).await?;
        ensure_room(current, kind, today, limit)?;

        let exists = sqlx::query_scalar::<_, i64>("SELECT 1 FROM suggested_questions WHERE id = ?")
            .bind(suggestion_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(read_err)?;
        if exists.is_none() {
            return Err(StoreError::not_found("suggestion", suggestion_id));
        }

        let previous = sqlx::query_scalar::<_, String>(
            "SELECT direction FROM suggestion_votes WHERE suggestion_id = ? AND user_id = ?",
        )
        .bind(suggestion_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(read_err)?
        .map(|d| d.parse::<VoteDirection>())
        .transpose()
        .map_err(StoreError::Read)?;

        let delta = match previous {
            Some(prev) if prev == direction => return Ok(VoteRecord::Unchanged),
            Some(prev) => direction.weight() - prev.weight(),
            None => direction.weight(),
        };

        sqlx::query(
            "INSERT INTO suggestion_votes (suggestion_id, user_id, direction) VALUES (?, ?, ?) \
             ON CONFLICT (suggestion_id, user_id) DO UPDATE SET direction = excluded.direction",
        )
        .bind(suggestion_id)
        .bind(user_id)
        .bind(direction.as_str())
        .execute(&mut *tx)
        .await
        .map_err(write_err)?;
        let votes = sqlx::query_scalar::<_, i64>(
            "UPDATE suggested_questions SET votes = votes + ? WHERE id = ? RETURNING votes",
        )
        .bind(delta)
        .bind(suggestion_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(write_err)?;

        let next = quota::consume(current, today);
        save_quota(&mut tx, user_id, kind, next).await?;
        apply_credit(&mut tx, &reward).await?;
        tx.commit().await.map_err(write_err)?;

        Ok(VoteRecord::Applied {
            votes,
            used_today: next.used,
        })
    }

    async fn select(
        &self,
        id: Uuid,
        question: Question,
        reward: TokenReward,
    ) -> Result<SuggestedQuestion, StoreError> {
        let mut tx = self.pool.begin().await.map_err(write_err)?;
        sqlx::query(
            "INSERT INTO questions (id, text, date, category, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(question.id)
        .bind(&question.text)
        .bind(question.date)
        .bind(&question.category)
        .bind(question.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict(format!("question for {}", question.date))
            } else {
                write_err(e)
            }
        })?;

        let res = sqlx::query(
            "UPDATE suggested_questions SET is_selected = 1, selected_date = ? WHERE id = ?",
        )
        .bind(question.date)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(write_err)?;
        if res.rows_affected() == 0 {
            return Err(StoreError::not_found("suggestion", id));
        }
        apply_credit(&mut tx, &reward).await?;
        tx.commit().await.map_err(write_err)?;

        SuggestionsRepository::find_by_id(self, id)
            .await?
            .ok_or_else(|| StoreError::not_found("suggestion", id))
    }
}

#[async_trait]
impl QuotaRepository for SqlStore {
    async fn get(&self, user_id: Uuid, kind: QuotaKind) -> Result<Option<DailyQuota>, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(read_err)?;
        load_quota(&mut conn, user_id, kind).await
    }
}
