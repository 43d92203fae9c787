#![allow(dead_code, unused_macros)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use daily_prompt::contract::model::{NewQuestion, Question, SignIn, User};
use daily_prompt::domain::ports::Clock;
use daily_prompt::domain::repo::Stores;
use daily_prompt::domain::service::{Service, ServiceConfig};
use daily_prompt::infra::clock::ManualClock;
use daily_prompt::infra::storage::{MemoryStore, SqlStore};

#[derive(Debug, Clone, Copy)]
pub enum Backend {
    Memory,
    Sql,
}

/// Service over a fresh store with a clock parked at a fixed morning.
pub struct Harness {
    pub svc: Arc<Service>,
    pub clock: Arc<ManualClock>,
}

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap()
}

pub async fn sql_store() -> Arc<SqlStore> {
    let store = SqlStore::connect("sqlite::memory:", 1, Duration::from_secs(5))
        .await
        .expect("sqlite in-memory store");
    Arc::new(store)
}

pub async fn stores(backend: Backend) -> Stores {
    match backend {
        Backend::Memory => Stores::from_backend(Arc::new(MemoryStore::new())),
        Backend::Sql => Stores::from_backend(sql_store().await),
    }
}

impl Harness {
    pub async fn new(backend: Backend) -> Self {
        Self::with_config(backend, ServiceConfig::default()).await
    }

    pub async fn with_config(backend: Backend, config: ServiceConfig) -> Self {
        Self::over(stores(backend).await, config)
    }

    pub fn over(stores: Stores, config: ServiceConfig) -> Self {
        let clock = Arc::new(ManualClock::new(start()));
        let svc = Arc::new(Service::new(stores, clock.clone(), config));
        Self { svc, clock }
    }

    pub async fn user(&self, name: &str) -> User {
        self.svc
            .sign_in(SignIn {
                username: name.to_string(),
                avatar: None,
                platform_fid: None,
                wallet_address: None,
            })
            .await
            .expect("sign in")
    }

    /// Schedule a question for the clock's current day.
    pub async fn question_today(&self) -> Question {
        self.svc
            .schedule_question(NewQuestion {
                text: "What made you smile today?".to_string(),
                date: self.clock.today(),
                category: Some("daily".to_string()),
            })
            .await
            .expect("schedule question")
    }
}

/// Run each named scenario `async fn name(Backend)` against both stores.
macro_rules! on_every_backend {
    ($($name:ident),* $(,)?) => {
        mod memory {
            $(
                #[tokio::test]
                async fn $name() {
                    super::$name(crate::common::Backend::Memory).await
                }
            )*
        }
        mod sql {
            $(
                #[tokio::test]
                async fn $name() {
                    super::$name(crate::common::Backend::Sql).await
                }
            )*
        }
    };
}
