use serde::{Deserialize, Serialize};

use crate::domain::service::ServiceConfig;

/// Which store adapter backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    Memory,
    #[default]
    Sql,
}

/// Configuration for the daily_prompt module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DailyPromptConfig {
    #[serde(default)]
    pub store: StoreKind,
    #[serde(default = "default_leaderboard_limit")]
    pub leaderboard_limit: u32,
    #[serde(default = "default_rewards_history_limit")]
    pub rewards_history_limit: u32,
    #[serde(default = "default_max_answer_length")]
    pub max_answer_length: usize,
    #[serde(default = "default_max_suggestion_length")]
    pub max_suggestion_length: usize,
}

impl Default for DailyPromptConfig {
    fn default() -> Self {
        Self {
            store: StoreKind::default(),
            leaderboard_limit: default_leaderboard_limit(),
            rewards_history_limit: default_rewards_history_limit(),
            max_answer_length: default_max_answer_length(),
            max_suggestion_length: default_max_suggestion_length(),
        }
    }
}

impl DailyPromptConfig {
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            leaderboard_limit: self.leaderboard_limit,
            rewards_history_limit: self.rewards_history_limit,
            max_answer_length: self.max_answer_length,
            max_suggestion_length: self.max_suggestion_length,
        }
    }
}

fn default_leaderboard_limit() -> u32 {
    50
}

fn default_rewards_history_limit() -> u32 {
    20
}

fn default_max_answer_length() -> usize {
    500
}

fn default_max_suggestion_length() -> usize {
    200
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let cfg: DailyPromptConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.store, StoreKind::Sql);
        assert_eq!(cfg.leaderboard_limit, 50);
        assert_eq!(cfg.rewards_history_limit, 20);
        assert_eq!(cfg.max_answer_length, 500);
        assert_eq!(cfg.max_suggestion_length, 200);
    }

    #[test]
    fn store_kind_is_snake_case() {
        let cfg: DailyPromptConfig = serde_json::from_str(r#"{"store":"memory"}"#).unwrap();
        assert_eq!(cfg.store, StoreKind::Memory);
        assert!(serde_json::from_str::<DailyPromptConfig>(r#"{"store":"redis"}"#).is_err());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_json::from_str::<DailyPromptConfig>(r#"{"page_size":5}"#).is_err());
    }
}
