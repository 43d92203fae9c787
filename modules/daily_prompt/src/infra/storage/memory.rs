use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::contract::model::{Answer, Question, SuggestedQuestion, TokenReward, User, VoteDirection};
use crate::domain::quota::{self, DailyQuota, QuotaKind};
use crate::domain::repo::{
    AnswersRepository, LikeGrants, LikeRecord, QuestionsRepository, QuotaRepository,
    RewardLedger, StoreError, SuggestionsRepository, UsersRepository, VoteRecord,
};

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    // sign-up order
    user_order: Vec<Uuid>,
    questions: HashMap<Uuid, Question>,
    // creation order; author fields filled on read
    answers: Vec<Answer>,
    likes: HashSet<(Uuid, Uuid)>,
    rewards: Vec<TokenReward>,
    suggestions: Vec<SuggestedQuestion>,
    quotas: HashMap<(Uuid, QuotaKind), DailyQuota>,
}

// Compound writes check every precondition before the first mutation, so a
// failed call leaves the state untouched.
impl State {
    fn with_author(&self, mut a: Answer) -> Answer {
        if let Some(u) = self.users.get(&a.user_id) {
            a.username = u.username.clone();
            a.avatar = u.avatar.clone();
        }
        a
    }

    fn require_user(&self, id: Uuid) -> Result<(), StoreError> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::not_found("user", id))
        }
    }

    /// Overwrite everything but the balance.
    fn save_user(&mut self, u: User) -> Result<(), StoreError> {
        let stored = self
            .users
            .get_mut(&u.id)
            .ok_or_else(|| StoreError::not_found("user", u.id))?;
        let tokens = stored.tokens;
        *stored = User { tokens, ..u };
        Ok(())
    }

    fn credit(&mut self, reward: TokenReward) -> Result<i64, StoreError> {
        let user = self
            .users
            .get_mut(&reward.user_id)
            .ok_or_else(|| StoreError::not_found("user", reward.user_id))?;
        user.tokens += reward.amount;
        let balance = user.tokens;
        self.rewards.push(reward);
        Ok(balance)
    }
}

/// Process-local store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsersRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.state.read().users.get(&id).cloned())
    }

    async fn find_by_platform_fid(&self, fid: i64) -> Result<Option<User>, StoreError> {
        let st = self.state.read();
        Ok(st
            .user_order
            .iter()
            .filter_map(|id| st.users.get(id))
            .find(|u| u.platform_fid == Some(fid))
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let st = self.state.read();
        Ok(st
            .user_order
            .iter()
            .filter_map(|id| st.users.get(id))
            .find(|u| u.username == username)
            .cloned())
    }

    async fn insert(&self, u: User) -> Result<(), StoreError> {
        let mut st = self.state.write();
        if st.users.contains_key(&u.id) {
            return Err(StoreError::Conflict(format!("user {}", u.id)));
        }
        st.user_order.push(u.id);
        st.users.insert(u.id, u);
        Ok(())
    }

    async fn update(&self, u: User) -> Result<(), StoreError> {
        self.state.write().save_user(u)
    }

    async fn list_top(&self, limit: u32) -> Result<Vec<User>, StoreError> {
        let st = self.state.read();
        let mut users: Vec<User> = st
            .user_order
            .iter()
            .filter_map(|id| st.users.get(id).cloned())
            .collect();
        users.sort_by(|a, b| b.tokens.cmp(&a.tokens));
        users.truncate(limit as usize);
        Ok(users)
    }
}

#[async_trait]
impl RewardLedger for MemoryStore {
    async fn credit(&self, reward: TokenReward) -> Result<i64, StoreError> {
        self.state.write().credit(reward)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        since: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<TokenReward>, StoreError> {
        let st = self.state.read();
        Ok(st
            .rewards
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .filter(|r| since.map_or(true, |s| r.timestamp >= s))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn list_since(&self, since: DateTime<Utc>) -> Result<Vec<TokenReward>, StoreError> {
        let st = self.state.read();
        Ok(st
            .rewards
            .iter()
            .filter(|r| r.timestamp >= since)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl QuestionsRepository for MemoryStore {
    async fn find_by_date(&self, date: NaiveDate) -> Result<Option<Question>, StoreError> {
        let st = self.state.read();
        Ok(st.questions.values().find(|q| q.date == date).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Question>, StoreError> {
        Ok(self.state.read().questions.get(&id).cloned())
    }

    async fn insert(&self, q: Question) -> Result<(), StoreError> {
        let mut st = self.state.write();
        if st.questions.values().any(|existing| existing.date == q.date) {
            return Err(StoreError::Conflict(format!("question for {}", q.date)));
        }
        st.questions.insert(q.id, q);
        Ok(())
    }
}

#[async_trait]
impl AnswersRepository for MemoryStore {
    async fn submit(
        &self,
        a: Answer,
        author: User,
        rewards: Vec<TokenReward>,
    ) -> Result<i64, StoreError> {
        let mut st = self.state.write();
        if st
            .answers
            .iter()
            .any(|x| x.question_id == a.question_id && x.user_id == a.user_id)
        {
            return Err(StoreError::DuplicateAnswer {
                question_id: a.question_id,
                user_id: a.user_id,
            });
        }
        st.require_user(author.id)?;
        for r in &rewards {
            st.require_user(r.user_id)?;
        }

        let author_id = author.id;
        st.answers.push(Answer {
            is_own_answer: false,
            ..a
        });
        st.save_user(author)?;
        for r in rewards {
            st.credit(r)?;
        }
        Ok(st.users.get(&author_id).map_or(0, |u| u.tokens))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Answer>, StoreError> {
        let st = self.state.read();
        Ok(st
            .answers
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .map(|a| st.with_author(a)))
    }

    async fn count_for_question(&self, question_id: Uuid) -> Result<u32, StoreError> {
        let st = self.state.read();
        Ok(st
            .answers
            .iter()
            .filter(|a| a.question_id == question_id)
            .count() as u32)
    }

    async fn list_for_question(&self, question_id: Uuid) -> Result<Vec<Answer>, StoreError> {
        let st = self.state.read();
        Ok(st
            .answers
            .iter()
            .filter(|a| a.question_id == question_id)
            .cloned()
            .map(|a| st.with_author(a))
            .collect())
    }

    async fn list_with_min_likes(&self, min_likes: u32) -> Result<Vec<Answer>, StoreError> {
        let st = self.state.read();
        Ok(st
            .answers
            .iter()
            .filter(|a| a.likes >= min_likes)
            .cloned()
            .map(|a| st.with_author(a))
            .collect())
    }

    async fn record_like(
        &self,
        answer_id: Uuid,
        user_id: Uuid,
        today: NaiveDate,
        limit: u32,
        grants: LikeGrants,
    ) -> Result<LikeRecord, StoreError> {
        let mut st = self.state.write();

        let idx = st
            .answers
            .iter()
            .position(|a| a.id == answer_id)
            .ok_or_else(|| StoreError::not_found("answer", answer_id))?;
        if st.likes.contains(&(answer_id, user_id)) {
            return Ok(LikeRecord::AlreadyLiked);
        }

        let key = (user_id, QuotaKind::AnswerUpvote);
        let current = st.quotas.get(&key).copied();
        if !quota::has_room(current, today, limit) {
            return Err(StoreError::RateLimitExceeded {
                kind: QuotaKind::AnswerUpvote,
                used: quota::used_today(current, today),
            });
        }
        let author_id = st.answers[idx].user_id;
        st.require_user(user_id)?;
        st.require_user(author_id)?;
        st.require_user(grants.given.user_id)?;
        st.require_user(grants.popular.user_id)?;

        st.likes.insert((answer_id, user_id));
        st.answers[idx].likes += 1;
        let likes = st.answers[idx].likes;
        let next = quota::consume(current, today);
        st.quotas.insert(key, next);

        let now = grants.given.timestamp;
        if let Some(liker) = st.users.get_mut(&user_id) {
            liker.total_upvotes_given += 1;
            liker.updated_at = now;
        }
        if let Some(author) = st.users.get_mut(&author_id) {
            author.total_upvotes_received += 1;
            author.updated_at = now;
        }
        st.credit(grants.given)?;
        let popular = likes == grants.popular_at;
        if popular {
            st.credit(grants.popular)?;
        }

        Ok(LikeRecord::Applied {
            likes,
            used_today: next.used,
            popular,
        })
    }
}

#[async_trait]
impl SuggestionsRepository for MemoryStore {
    async fn submit(&self, s: SuggestedQuestion, reward: TokenReward) -> Result<i64, StoreError> {
        let mut st = self.state.write();
        st.require_user(reward.user_id)?;
        st.suggestions.push(s);
        st.credit(reward)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<SuggestedQuestion>, StoreError> {
        let st = self.state.read();
        Ok(st.suggestions.iter().find(|s| s.id == id).cloned())
    }

    async fn list_open(&self) -> Result<Vec<SuggestedQuestion>, StoreError> {
        let st = self.state.read();
        Ok(st
            .suggestions
            .iter()
            .filter(|s| !s.is_selected)
            .cloned()
            .collect())
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
        let mut guard = self.state.write();

        let key = (user_id, QuotaKind::SuggestionVote);
        let current = guard.quotas.get(&key).copied();
        if !quota::has_room(current, today, limit) {
            return Err(StoreError::RateLimitExceeded {
                kind: QuotaKind::SuggestionVote,
                used: quota::used_today(current, today),
            });
        }
        guard.require_user(reward.user_id)?;

        let State {
            suggestions,
            quotas,
            ..
        } = &mut *guard;
        let s = suggestions
            .iter_mut()
            .find(|s| s.id == suggestion_id)
            .ok_or_else(|| StoreError::not_found("suggestion", suggestion_id))?;
        let previous = s.vote_of(user_id);
        if previous == Some(direction) {
            return Ok(VoteRecord::Unchanged);
        }

        if let Some(prev) = previous {
            s.upvoted_by.retain(|id| *id != user_id);
            s.downvoted_by.retain(|id| *id != user_id);
            s.votes -= prev.weight();
        }
        match direction {
            VoteDirection::Up => s.upvoted_by.push(user_id),
            VoteDirection::Down => s.downvoted_by.push(user_id),
        }
        s.votes += direction.weight();

        let votes = s.votes;
        let next = quota::consume(current, today);
        quotas.insert(key, next);
        guard.credit(reward)?;

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
        let mut st = self.state.write();
        if st.questions.values().any(|q| q.date == question.date) {
            return Err(StoreError::Conflict(format!("question for {}", question.date)));
        }
        let idx = st
            .suggestions
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| StoreError::not_found("suggestion", id))?;
        st.require_user(reward.user_id)?;

        let date = question.date;
        st.questions.insert(question.id, question);
        let s = &mut st.suggestions[idx];
        s.is_selected = true;
        s.selected_date = Some(date);
        let selected = s.clone();
        st.credit(reward)?;
        Ok(selected)
    }
}

#[async_trait]
impl QuotaRepository for MemoryStore {
    async fn get(&self, user_id: Uuid, kind: QuotaKind) -> Result<Option<DailyQuota>, StoreError> {
        Ok(self.state.read().quotas.get(&(user_id, kind)).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::model::{RewardKind, DEFAULT_AVATAR};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    async fn user(store: &MemoryStore, name: &str) -> User {
        let u = User::new(Uuid::new_v4(), name.into(), DEFAULT_AVATAR.into(), Utc::now());
        UsersRepository::insert(store, u.clone()).await.unwrap();
        u
    }

    fn reward(user_id: Uuid, kind: RewardKind, amount: i64) -> TokenReward {
        TokenReward {
            id: Uuid::new_v4(),
            user_id,
            kind,
            amount,
            description: kind.as_str().into(),
            timestamp: Utc::now(),
        }
    }

    async fn suggestion(store: &MemoryStore, by: Uuid) -> SuggestedQuestion {
        let s = SuggestedQuestion {
            id: Uuid::new_v4(),
            text: "What made you smile?".into(),
            category: None,
            submitted_by: by,
            submitted_by_username: "author".into(),
            submitted_at: Utc::now(),
            votes: 0,
            upvoted_by: vec![],
            downvoted_by: vec![],
            is_selected: false,
            selected_date: None,
        };
        SuggestionsRepository::submit(store, s.clone(), reward(by, RewardKind::QuestionSubmit, 5))
            .await
            .unwrap();
        s
    }

    fn vote_reward(voter: Uuid) -> TokenReward {
        reward(voter, RewardKind::VoteQuestion, 1)
    }

    #[tokio::test]
    async fn update_never_touches_balance() {
        let store = MemoryStore::new();
        let user = user(&store, "a").await;
        let balance = store
            .credit(reward(user.id, RewardKind::Answer, 40))
            .await
            .unwrap();
        assert_eq!(balance, 40);

        let mut stale = user.clone();
        stale.streak = 3;
        store.update(stale).await.unwrap();

        let loaded = UsersRepository::find_by_id(&store, user.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.tokens, 40);
        assert_eq!(loaded.streak, 3);
    }

    #[tokio::test]
    async fn credit_for_unknown_user_appends_nothing() {
        let store = MemoryStore::new();
        let ghost = Uuid::new_v4();
        let err = store
            .credit(reward(ghost, RewardKind::Answer, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "user", .. }));
        assert!(store.list_for_user(ghost, None, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejected_answer_submit_changes_nothing() {
        let store = MemoryStore::new();
        let author = user(&store, "author").await;
        let answer = Answer {
            id: Uuid::new_v4(),
            question_id: Uuid::new_v4(),
            user_id: author.id,
            username: author.username.clone(),
            avatar: author.avatar.clone(),
            text: "hi".into(),
            likes: 0,
            created_at: Utc::now(),
            is_own_answer: true,
        };
        let mut counted = author.clone();
        counted.streak = 1;

        // Second reward names a user that does not exist.
        let rewards = vec![
            reward(author.id, RewardKind::Answer, 10),
            reward(Uuid::new_v4(), RewardKind::EarlyBird, 5),
        ];
        let err = AnswersRepository::submit(&store, answer.clone(), counted.clone(), rewards)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));

        assert_eq!(store.count_for_question(answer.question_id).await.unwrap(), 0);
        let loaded = UsersRepository::find_by_id(&store, author.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!((loaded.tokens, loaded.streak), (0, 0));
        assert!(store.list_for_user(author.id, None, 10).await.unwrap().is_empty());

        let rewards = vec![reward(author.id, RewardKind::Answer, 10)];
        let balance = AnswersRepository::submit(&store, answer, counted, rewards)
            .await
            .unwrap();
        assert_eq!(balance, 10);
    }

    #[tokio::test]
    async fn switching_vote_moves_score_by_two() {
        let store = MemoryStore::new();
        let author = user(&store, "author").await;
        let voter = user(&store, "voter").await.id;
        let s = suggestion(&store, author.id).await;

        let up = store
            .record_vote(s.id, voter, VoteDirection::Up, day(), 10, vote_reward(voter))
            .await
            .unwrap();
        assert_eq!(up, VoteRecord::Applied { votes: 1, used_today: 1 });

        let repeat = store
            .record_vote(s.id, voter, VoteDirection::Up, day(), 10, vote_reward(voter))
            .await
            .unwrap();
        assert_eq!(repeat, VoteRecord::Unchanged);

        let down = store
            .record_vote(s.id, voter, VoteDirection::Down, day(), 10, vote_reward(voter))
            .await
            .unwrap();
        assert_eq!(down, VoteRecord::Applied { votes: -1, used_today: 2 });

        let loaded = SuggestionsRepository::find_by_id(&store, s.id)
            .await
            .unwrap()
            .unwrap();
        assert!(loaded.upvoted_by.is_empty());
        assert_eq!(loaded.downvoted_by, vec![voter]);

        // Two applied votes, two credits; the repeat paid nothing.
        let paid = UsersRepository::find_by_id(&store, voter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(paid.tokens, 2);
    }

    #[tokio::test]
    async fn vote_cap_rejects_without_change() {
        let store = MemoryStore::new();
        let author = user(&store, "author").await;
        let voter = user(&store, "voter").await.id;
        let mut ids = Vec::new();
        for _ in 0..3 {
            ids.push(suggestion(&store, author.id).await.id);
        }

        for id in &ids[..2] {
            store
                .record_vote(*id, voter, VoteDirection::Up, day(), 2, vote_reward(voter))
                .await
                .unwrap();
        }
        let err = store
            .record_vote(ids[2], voter, VoteDirection::Up, day(), 2, vote_reward(voter))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::RateLimitExceeded { used: 2, .. }));

        let untouched = SuggestionsRepository::find_by_id(&store, ids[2])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(untouched.votes, 0);

        // Next day the counter starts over
        let next_day = day().succ_opt().unwrap();
        let ok = store
            .record_vote(ids[2], voter, VoteDirection::Up, next_day, 2, vote_reward(voter))
            .await
            .unwrap();
        assert_eq!(ok, VoteRecord::Applied { votes: 1, used_today: 1 });
    }

    #[tokio::test]
    async fn select_on_taken_date_changes_nothing() {
        let store = MemoryStore::new();
        let author = user(&store, "author").await;
        let s = suggestion(&store, author.id).await;
        let question = |text: &str| Question {
            id: Uuid::new_v4(),
            text: text.into(),
            date: day(),
            category: None,
            created_at: Utc::now(),
        };
        QuestionsRepository::insert(&store, question("already here"))
            .await
            .unwrap();

        let err = store
            .select(s.id, question(&s.text), reward(author.id, RewardKind::QuestionSelected, 50))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let loaded = SuggestionsRepository::find_by_id(&store, s.id)
            .await
            .unwrap()
            .unwrap();
        assert!(!loaded.is_selected);
        let author = UsersRepository::find_by_id(&store, author.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(author.tokens, 5);
    }
}
