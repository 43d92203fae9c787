use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::contract::model::{
    Answer, AnswerSort, AnswerSubmission, DailyUsage, LeaderboardEntry, LeaderboardSort,
    LikeOutcome, NewQuestion, NewSuggestion, Question, RewardGrant, RewardKind, Selection,
    SignIn, SuggestedQuestion, SuggestionSubmission, TokenReward, User, VoteDirection,
    VoteOutcome, DEFAULT_AVATAR,
};
use crate::domain::error::DomainError;
use crate::domain::leaderboard::{build_leaderboard, rerank, weekly_window_start};
use crate::domain::ports::Clock;
use crate::domain::quota::{self, QuotaKind, DAILY_UPVOTE_LIMIT, DAILY_VOTE_LIMIT};
use crate::domain::repo::{LikeGrants, LikeRecord, StoreError, Stores, VoteRecord};
use crate::domain::rewards::{
    compute_reward, next_streak, Bonus, POPULAR_ANSWER_BONUS, POPULAR_ANSWER_LIKES,
    QUESTION_SELECTED_REWARD, QUESTION_SUBMIT_REWARD, UPVOTE_GIVEN_REWARD, VOTE_REWARD,
};

/// Domain service owning every read and write of daily prompt state.
/// Depends only on the store ports and the clock, not on infra types.
#[derive(Clone)]
pub struct Service {
    stores: Stores,
    clock: Arc<dyn Clock>,
    config: ServiceConfig,
}

/// Configuration for the domain service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub leaderboard_limit: u32,
    pub rewards_history_limit: u32,
    pub max_answer_length: usize,
    pub max_suggestion_length: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            leaderboard_limit: 50,
            rewards_history_limit: 20,
            max_answer_length: 500,
            max_suggestion_length: 200,
        }
    }
}

impl Service {
    pub fn new(stores: Stores, clock: Arc<dyn Clock>, config: ServiceConfig) -> Self {
        Self {
            stores,
            clock,
            config,
        }
    }

    // --- users ---

    /// Create the user on first sign-in, refresh the profile afterwards.
    #[instrument(
        name = "daily_prompt.service.sign_in",
        skip(self, req),
        fields(username = %req.username, platform_fid = ?req.platform_fid)
    )]
    pub async fn sign_in(&self, req: SignIn) -> Result<User, DomainError> {
        let username = req.username.trim().to_string();
        if username.is_empty() {
            return Err(DomainError::validation("username", "must not be empty"));
        }

        let existing = match req.platform_fid {
            Some(fid) => self.stores.users.find_by_platform_fid(fid).await?,
            None => self.stores.users.find_by_username(&username).await?,
        };
        let now = self.clock.now();

        match existing {
            Some(mut user) => {
                user.username = username;
                if let Some(avatar) = req.avatar {
                    user.avatar = avatar;
                }
                if req.wallet_address.is_some() {
                    user.wallet_address = req.wallet_address;
                }
                user.updated_at = now;
                self.stores.users.update(user.clone()).await?;
                debug!(user_id = %user.id, "Existing user signed in");
                Ok(self.present(user))
            }
            None => {
                let mut user = User::new(
                    Uuid::new_v4(),
                    username,
                    req.avatar.unwrap_or_else(|| DEFAULT_AVATAR.to_string()),
                    now,
                );
                user.platform_fid = req.platform_fid;
                user.wallet_address = req.wallet_address;
                self.stores.users.insert(user.clone()).await?;
                info!(user_id = %user.id, "Created user on first sign-in");
                Ok(user)
            }
        }
    }

    #[instrument(name = "daily_prompt.service.get_user", skip(self), fields(user_id = %id))]
    pub async fn get_user(&self, id: Uuid) -> Result<User, DomainError> {
        let user = self
            .stores
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::user_not_found(id))?;
        Ok(self.present(user))
    }

    /// Most recent ledger entries for a user; unknown users have none.
    #[instrument(name = "daily_prompt.service.list_rewards", skip(self), fields(user_id = %user_id))]
    pub async fn list_rewards(&self, user_id: Uuid) -> Result<Vec<TokenReward>, DomainError> {
        let rewards = self
            .stores
            .ledger
            .list_for_user(user_id, None, self.config.rewards_history_limit)
            .await?;
        debug!("Found {} rewards", rewards.len());
        Ok(rewards)
    }

    #[instrument(name = "daily_prompt.service.daily_usage", skip(self), fields(user_id = %user_id))]
    pub async fn daily_usage(&self, user_id: Uuid) -> Result<DailyUsage, DomainError> {
        let today = self.clock.today();
        let votes = self
            .stores
            .quotas
            .get(user_id, QuotaKind::SuggestionVote)
            .await?;
        let upvotes = self
            .stores
            .quotas
            .get(user_id, QuotaKind::AnswerUpvote)
            .await?;
        Ok(DailyUsage {
            votes_used: quota::used_today(votes, today),
            votes_limit: DAILY_VOTE_LIMIT,
            upvotes_used: quota::used_today(upvotes, today),
            upvotes_limit: DAILY_UPVOTE_LIMIT,
        })
    }

    // --- questions and answers ---

    #[instrument(name = "daily_prompt.service.today_question", skip(self))]
    pub async fn today_question(&self) -> Result<Option<Question>, DomainError> {
        let today = self.clock.today();
        Ok(self.stores.questions.find_by_date(today).await?)
    }

    #[instrument(
        name = "daily_prompt.service.schedule_question",
        skip(self, new_question),
        fields(date = %new_question.date)
    )]
    pub async fn schedule_question(
        &self,
        new_question: NewQuestion,
    ) -> Result<Question, DomainError> {
        let text = self.validate_text("text", &new_question.text, self.config.max_answer_length)?;
        let question = Question {
            id: Uuid::new_v4(),
            text,
            date: new_question.date,
            category: new_question.category,
            created_at: self.clock.now(),
        };
        self.insert_question(question.clone()).await?;
        info!(question_id = %question.id, "Scheduled question");
        Ok(question)
    }

    /// Answer today's question and collect the answer rewards.
    ///
    /// The answer, the author's counters and every reward commit together.
    #[instrument(name = "daily_prompt.service.submit_answer", skip(self, text), fields(user_id = %user_id))]
    pub async fn submit_answer(
        &self,
        user_id: Uuid,
        text: &str,
    ) -> Result<AnswerSubmission, DomainError> {
        let today = self.clock.today();
        let now = self.clock.now();

        let mut user = self.require_user(user_id).await?;
        let question = self
            .stores
            .questions
            .find_by_date(today)
            .await?
            .ok_or_else(|| DomainError::no_active_question(today))?;
        let text = self.validate_text("text", text, self.config.max_answer_length)?;

        let prior = self
            .stores
            .answers
            .count_for_question(question.id)
            .await?;
        let answer = Answer {
            id: Uuid::new_v4(),
            question_id: question.id,
            user_id,
            username: user.username.clone(),
            avatar: user.avatar.clone(),
            text,
            likes: 0,
            created_at: now,
            is_own_answer: true,
        };

        user.streak = next_streak(user.last_answer_date, user.streak, today);
        user.has_answered_today = true;
        user.last_answer_date = Some(today);

        let breakdown = compute_reward(&user, prior + 1, prior);
        if breakdown
            .bonuses
            .iter()
            .any(|b| matches!(b, Bonus::EarlyBird { .. }))
        {
            user.early_bird_count += 1;
        }
        user.updated_at = now;
        let rewards: Vec<TokenReward> = breakdown
            .grants()
            .into_iter()
            .map(|grant| self.reward_entry(user_id, grant))
            .collect();

        match self
            .stores
            .answers
            .submit(answer.clone(), user.clone(), rewards.clone())
            .await
        {
            Ok(balance) => user.tokens = balance,
            Err(StoreError::DuplicateAnswer { question_id, .. }) => {
                warn!(question_id = %question_id, "Duplicate answer rejected");
                return Err(DomainError::DuplicateAnswer { question_id });
            }
            Err(e) => return Err(self.write_failed("submit answer", e)),
        }
        for reward in &rewards {
            self.log_reward(reward);
        }

        info!(
            answer_id = %answer.id,
            position = prior + 1,
            streak = user.streak,
            total = breakdown.total(),
            "Answer submitted"
        );
        Ok(AnswerSubmission {
            answer,
            rewards,
            user,
        })
    }

    #[instrument(
        name = "daily_prompt.service.list_answers",
        skip(self),
        fields(question_id = %question_id)
    )]
    pub async fn list_answers(
        &self,
        question_id: Uuid,
        sort: AnswerSort,
        viewer: Option<Uuid>,
    ) -> Result<Vec<Answer>, DomainError> {
        if self
            .stores
            .questions
            .find_by_id(question_id)
            .await?
            .is_none()
        {
            return Err(DomainError::QuestionNotFound { id: question_id });
        }

        let mut answers = self
            .stores
            .answers
            .list_for_question(question_id)
            .await?;
        for a in answers.iter_mut() {
            a.is_own_answer = viewer == Some(a.user_id);
        }
        match sort {
            AnswerSort::Popular => answers.sort_by(|a, b| b.likes.cmp(&a.likes)),
            AnswerSort::Recent => answers.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }
        debug!("Listed {} answers", answers.len());
        Ok(answers)
    }

    #[instrument(
        name = "daily_prompt.service.like_answer",
        skip(self),
        fields(user_id = %user_id, answer_id = %answer_id)
    )]
    pub async fn like_answer(
        &self,
        user_id: Uuid,
        answer_id: Uuid,
    ) -> Result<LikeOutcome, DomainError> {
        let today = self.clock.today();
        self.require_user(user_id).await?;
        let mut answer = self
            .stores
            .answers
            .find_by_id(answer_id)
            .await?
            .ok_or_else(|| DomainError::answer_not_found(answer_id))?;
        if answer.user_id == user_id {
            return Err(DomainError::validation(
                "answerId",
                "cannot like your own answer",
            ));
        }

        let grants = LikeGrants {
            given: self.reward_entry(
                user_id,
                RewardGrant {
                    kind: RewardKind::UpvoteGiven,
                    amount: UPVOTE_GIVEN_REWARD,
                    description: "Upvoted community answer".to_string(),
                },
            ),
            popular: self.reward_entry(
                answer.user_id,
                RewardGrant {
                    kind: RewardKind::UpvotesReceived,
                    amount: POPULAR_ANSWER_BONUS,
                    description: format!("Answer reached {POPULAR_ANSWER_LIKES} likes"),
                },
            ),
            popular_at: POPULAR_ANSWER_LIKES,
        };

        let (like_count, likes_used_today, popular) = match self
            .stores
            .answers
            .record_like(answer_id, user_id, today, DAILY_UPVOTE_LIMIT, grants.clone())
            .await
        {
            Ok(LikeRecord::Applied {
                likes,
                used_today,
                popular,
            }) => (likes, used_today, popular),
            Ok(LikeRecord::AlreadyLiked) => {
                debug!("Answer already liked by user");
                return Ok(LikeOutcome::AlreadyLiked { answer });
            }
            Err(StoreError::RateLimitExceeded { used, .. }) => {
                info!(used, "Daily upvote limit reached");
                return Ok(LikeOutcome::RateLimited {
                    likes_used_today: used,
                });
            }
            Err(StoreError::NotFound { .. }) => {
                return Err(DomainError::answer_not_found(answer_id))
            }
            Err(e) => return Err(self.write_failed("record like", e)),
        };
        answer.likes = like_count;

        let mut rewards = vec![grants.given];
        if popular {
            rewards.push(grants.popular);
            info!(author_id = %answer.user_id, "Answer became popular");
        }
        for reward in &rewards {
            self.log_reward(reward);
        }

        Ok(LikeOutcome::Liked {
            answer,
            rewards,
            likes_used_today,
        })
    }

    // --- suggestions ---

    #[instrument(name = "daily_prompt.service.submit_suggestion", skip(self, new), fields(user_id = %user_id))]
    pub async fn submit_suggestion(
        &self,
        user_id: Uuid,
        new: NewSuggestion,
    ) -> Result<SuggestionSubmission, DomainError> {
        let user = self.require_user(user_id).await?;
        let text = self.validate_text("text", &new.text, self.config.max_suggestion_length)?;
        let suggestion = SuggestedQuestion {
            id: Uuid::new_v4(),
            text,
            category: new.category,
            submitted_by: user.id,
            submitted_by_username: user.username,
            submitted_at: self.clock.now(),
            votes: 0,
            upvoted_by: Vec::new(),
            downvoted_by: Vec::new(),
            is_selected: false,
            selected_date: None,
        };
        let reward = self.reward_entry(
            user_id,
            RewardGrant {
                kind: RewardKind::QuestionSubmit,
                amount: QUESTION_SUBMIT_REWARD,
                description: "Submitted a question suggestion".to_string(),
            },
        );
        self.stores
            .suggestions
            .submit(suggestion.clone(), reward.clone())
            .await
            .map_err(|e| self.write_failed("submit suggestion", e))?;
        self.log_reward(&reward);
        info!(suggestion_id = %suggestion.id, "Suggestion submitted");
        Ok(SuggestionSubmission { suggestion, reward })
    }

    /// Open suggestions, highest score first; equal scores keep submission order.
    #[instrument(name = "daily_prompt.service.list_suggestions", skip(self))]
    pub async fn list_suggestions(&self) -> Result<Vec<SuggestedQuestion>, DomainError> {
        let mut list = self.stores.suggestions.list_open().await?;
        list.sort_by(|a, b| b.votes.cmp(&a.votes));
        Ok(list)
    }

    #[instrument(
        name = "daily_prompt.service.vote_suggestion",
        skip(self),
        fields(user_id = %user_id, suggestion_id = %suggestion_id, direction = direction.as_str())
    )]
    pub async fn vote_suggestion(
        &self,
        user_id: Uuid,
        suggestion_id: Uuid,
        direction: VoteDirection,
    ) -> Result<VoteOutcome, DomainError> {
        let today = self.clock.today();
        self.require_user(user_id).await?;
        let suggestion = self.open_suggestion(suggestion_id).await?;
        if suggestion.submitted_by == user_id {
            return Err(DomainError::SelfVote { suggestion_id });
        }

        let reward = self.reward_entry(
            user_id,
            RewardGrant {
                kind: RewardKind::VoteQuestion,
                amount: VOTE_REWARD,
                description: "Voted on a question suggestion".to_string(),
            },
        );
        let votes_used_today = match self
            .stores
            .suggestions
            .record_vote(
                suggestion_id,
                user_id,
                direction,
                today,
                DAILY_VOTE_LIMIT,
                reward.clone(),
            )
            .await
        {
            Ok(VoteRecord::Applied { used_today, .. }) => used_today,
            Ok(VoteRecord::Unchanged) => {
                debug!("Vote unchanged");
                return Ok(VoteOutcome::Unchanged { suggestion });
            }
            Err(StoreError::RateLimitExceeded { used, .. }) => {
                info!(used, "Daily vote limit reached");
                return Ok(VoteOutcome::RateLimited {
                    votes_used_today: used,
                });
            }
            Err(StoreError::NotFound { .. }) => {
                return Err(DomainError::suggestion_not_found(suggestion_id))
            }
            Err(e) => return Err(self.write_failed("record vote", e)),
        };
        self.log_reward(&reward);

        let suggestion = self.open_suggestion(suggestion_id).await?;
        info!(votes = suggestion.votes, votes_used_today, "Vote recorded");
        Ok(VoteOutcome::Recorded {
            suggestion,
            reward,
            votes_used_today,
        })
    }

    /// Promote a suggestion to the daily question for `date` and pay its author.
    #[instrument(
        name = "daily_prompt.service.select_suggestion",
        skip(self),
        fields(suggestion_id = %suggestion_id, date = %date)
    )]
    pub async fn select_suggestion(
        &self,
        suggestion_id: Uuid,
        date: NaiveDate,
    ) -> Result<Selection, DomainError> {
        let suggestion = self
            .stores
            .suggestions
            .find_by_id(suggestion_id)
            .await?
            .ok_or_else(|| DomainError::suggestion_not_found(suggestion_id))?;
        if suggestion.is_selected {
            return Err(DomainError::validation(
                "suggestionId",
                "suggestion was already selected",
            ));
        }

        let question = Question {
            id: Uuid::new_v4(),
            text: suggestion.text.clone(),
            date,
            category: suggestion.category.clone(),
            created_at: self.clock.now(),
        };
        let reward = self.reward_entry(
            suggestion.submitted_by,
            RewardGrant {
                kind: RewardKind::QuestionSelected,
                amount: QUESTION_SELECTED_REWARD,
                description: "Your suggested question was selected".to_string(),
            },
        );

        let suggestion = match self
            .stores
            .suggestions
            .select(suggestion_id, question.clone(), reward.clone())
            .await
        {
            Ok(s) => s,
            Err(StoreError::Conflict(_)) => return Err(Self::date_taken(date)),
            Err(StoreError::NotFound { .. }) => {
                return Err(DomainError::suggestion_not_found(suggestion_id))
            }
            Err(e) => return Err(self.write_failed("select suggestion", e)),
        };
        self.log_reward(&reward);
        info!(question_id = %question.id, "Suggestion selected");
        Ok(Selection {
            suggestion,
            question,
            reward,
        })
    }

    // --- leaderboard ---

    #[instrument(name = "daily_prompt.service.leaderboard", skip(self), fields(sort = ?sort))]
    pub async fn leaderboard(
        &self,
        sort: LeaderboardSort,
    ) -> Result<Vec<LeaderboardEntry>, DomainError> {
        let now = self.clock.now();
        let users = self
            .stores
            .users
            .list_top(self.config.leaderboard_limit)
            .await?;
        let weekly = self
            .stores
            .ledger
            .list_since(weekly_window_start(now))
            .await?;
        let popular = self
            .stores
            .answers
            .list_with_min_likes(POPULAR_ANSWER_LIKES)
            .await?;

        let users: Vec<User> = users.into_iter().map(|u| self.present(u)).collect();
        let mut entries = build_leaderboard(&users, &weekly, &popular, now);
        if sort != LeaderboardSort::Total {
            rerank(&mut entries, sort);
        }
        debug!("Leaderboard has {} entries", entries.len());
        Ok(entries)
    }

    // --- helpers ---

    /// Ledger entry for `grant`, stamped now. Stores credit it with the write
    /// that earned it.
    fn reward_entry(&self, user_id: Uuid, grant: RewardGrant) -> TokenReward {
        TokenReward {
            id: Uuid::new_v4(),
            user_id,
            kind: grant.kind,
            amount: grant.amount,
            description: grant.description,
            timestamp: self.clock.now(),
        }
    }

    fn log_reward(&self, reward: &TokenReward) {
        debug!(
            user_id = %reward.user_id,
            kind = %reward.kind,
            amount = reward.amount,
            "Reward granted"
        );
    }

    /// Write paths require a known user.
    async fn require_user(&self, user_id: Uuid) -> Result<User, DomainError> {
        self.stores
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(DomainError::NotAuthenticated)
    }

    async fn open_suggestion(&self, id: Uuid) -> Result<SuggestedQuestion, DomainError> {
        self.stores
            .suggestions
            .find_by_id(id)
            .await?
            .filter(|s| !s.is_selected)
            .ok_or_else(|| DomainError::suggestion_not_found(id))
    }

    async fn insert_question(&self, question: Question) -> Result<(), DomainError> {
        match self.stores.questions.insert(question.clone()).await {
            Ok(()) => Ok(()),
            Err(StoreError::Conflict(_)) => Err(Self::date_taken(question.date)),
            Err(e) => Err(self.write_failed("insert question", e)),
        }
    }

    fn date_taken(date: NaiveDate) -> DomainError {
        DomainError::validation(
            "date",
            format!("a question is already scheduled for {date}"),
        )
    }

    fn present(&self, mut user: User) -> User {
        user.has_answered_today = user.answered_on(self.clock.today());
        user
    }

    fn write_failed(&self, what: &str, e: StoreError) -> DomainError {
        error!(error = %e, "Failed to {}", what);
        match e {
            StoreError::Read(message) => DomainError::database(message),
            other => DomainError::write(other.to_string()),
        }
    }

    fn validate_text(&self, field: &str, raw: &str, max: usize) -> Result<String, DomainError> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(DomainError::validation(field, "must not be empty"));
        }
        let len = text.chars().count();
        if len > max {
            return Err(DomainError::validation(
                field,
                format!("too long: {len} characters (max: {max})"),
            ));
        }
        Ok(text.to_string())
    }
}
