use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use axum::Router;
use runtime::{ConfigProvider, DatabaseConfig};
use tracing::{debug, info};
use utoipa::OpenApi;

use crate::api::rest::routes::{self, DailyPromptApiDoc};
use crate::config::{DailyPromptConfig, StoreKind};
use crate::contract::client::DailyPromptApi;
use crate::domain::ports::{Clock, SystemClock};
use crate::domain::repo::Stores;
use crate::domain::service::{Service, ServiceConfig};
use crate::gateways::local::DailyPromptLocalClient;
use crate::infra::storage::{MemoryStore, SqlStore};

pub const MODULE_NAME: &str = "daily_prompt";

const DEFAULT_MAX_CONNS: u32 = 10;
const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5_000;

/// Module entry point: owns the domain service once initialized and hands
/// out the REST router and the in-process client.
#[derive(Default)]
pub struct DailyPrompt {
    // Keep the domain service behind ArcSwap for cheap read-mostly access.
    service: ArcSwapOption<Service>,
}

impl DailyPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the module section, open the configured store and build the service.
    ///
    /// `force_memory` swaps in the in-memory store regardless of config.
    pub async fn init<C: ConfigProvider>(
        &self,
        config: &C,
        database: Option<&DatabaseConfig>,
        force_memory: bool,
    ) -> anyhow::Result<()> {
        info!("Initializing daily_prompt module");

        let cfg: DailyPromptConfig = config.module_config(MODULE_NAME)?;
        let kind = if force_memory {
            StoreKind::Memory
        } else {
            cfg.store
        };
        debug!(
            store = ?kind,
            leaderboard_limit = cfg.leaderboard_limit,
            "Loaded daily_prompt config"
        );

        let stores = open_stores(kind, database).await?;
        self.init_with(stores, Arc::new(SystemClock), cfg.service_config());
        Ok(())
    }

    /// Wire an already-built set of stores; used by tests with a manual clock.
    pub fn init_with(&self, stores: Stores, clock: Arc<dyn Clock>, config: ServiceConfig) {
        self.service
            .store(Some(Arc::new(Service::new(stores, clock, config))));
    }

    pub fn service(&self) -> anyhow::Result<Arc<Service>> {
        self.service
            .load_full()
            .ok_or_else(|| anyhow::anyhow!("Service not initialized"))
    }

    /// In-process client for other modules.
    pub fn client(&self) -> anyhow::Result<Arc<dyn DailyPromptApi>> {
        Ok(Arc::new(DailyPromptLocalClient::new(self.service()?)))
    }

    pub fn register_rest(&self, router: Router) -> anyhow::Result<Router> {
        info!("Registering daily_prompt REST routes");
        let router = routes::register_routes(router, self.service()?);
        Ok(router)
    }

    pub fn openapi() -> utoipa::openapi::OpenApi {
        DailyPromptApiDoc::openapi()
    }
}

async fn open_stores(kind: StoreKind, database: Option<&DatabaseConfig>) -> anyhow::Result<Stores> {
    match kind {
        StoreKind::Memory => {
            info!("Using in-memory store");
            Ok(Stores::from_backend(Arc::new(MemoryStore::new())))
        }
        StoreKind::Sql => {
            let db = database.ok_or_else(|| {
                anyhow::anyhow!("daily_prompt store is `sql` but no `database` section is configured")
            })?;
            let store = SqlStore::connect(
                &db.url,
                db.max_conns.unwrap_or(DEFAULT_MAX_CONNS),
                Duration::from_millis(u64::from(
                    db.busy_timeout_ms.unwrap_or(DEFAULT_BUSY_TIMEOUT_MS),
                )),
            )
            .await?;
            Ok(Stores::from_backend(Arc::new(store)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use runtime::{AppConfig, AppConfigProvider};

    fn provider_with(section: serde_json::Value) -> AppConfigProvider {
        let mut app = AppConfig::default();
        app.modules.insert(MODULE_NAME.to_string(), section);
        AppConfigProvider::new(app)
    }

    #[tokio::test]
    async fn sql_store_without_database_fails() {
        let module = DailyPrompt::new();
        let err = module
            .init(&provider_with(serde_json::json!({ "store": "sql" })), None, false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("database"));
        assert!(module.service().is_err());
    }

    #[tokio::test]
    async fn mock_flag_forces_memory_store() {
        let module = DailyPrompt::new();
        module
            .init(&provider_with(serde_json::json!({ "store": "sql" })), None, true)
            .await
            .unwrap();
        assert!(module.client().is_ok());
        assert!(module.register_rest(Router::new()).is_ok());
    }

    #[tokio::test]
    async fn opens_sqlite_in_memory() {
        let module = DailyPrompt::new();
        let db = DatabaseConfig {
            url: "sqlite::memory:".into(),
            max_conns: None,
            busy_timeout_ms: None,
        };
        module
            .init(&provider_with(serde_json::json!({})), Some(&db), false)
            .await
            .unwrap();
        let svc = module.service().unwrap();
        assert!(svc.today_question().await.unwrap().is_none());
    }
}
