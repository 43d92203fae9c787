//! HTTP host: owns the axum router, the global middleware stack, health and
//! OpenAPI endpoints, and the serving loop.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use arc_swap::ArcSwap;
use axum::{middleware::from_fn, routing::get, Router};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

mod config;
pub mod problem;
pub mod request_id;
mod web;

pub use config::ApiIngressConfig;

pub struct ApiIngress {
    // Read-mostly config
    config: ArcSwap<ApiIngressConfig>,
    // Router finalized by `build_router`, taken by `serve`
    final_router: Mutex<Option<Router>>,
}

impl Default for ApiIngress {
    fn default() -> Self {
        Self::new(ApiIngressConfig::default())
    }
}

impl ApiIngress {
    pub fn new(config: ApiIngressConfig) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
            final_router: Mutex::new(None),
        }
    }

    pub fn get_config(&self) -> ApiIngressConfig {
        (**self.config.load()).clone()
    }

    pub fn set_config(&self, config: ApiIngressConfig) {
        self.config.store(Arc::new(config));
    }

    /// Wrap the application routes with health, docs and the middleware stack.
    ///
    /// The result is also kept for a later `serve` call.
    pub fn build_router(
        &self,
        app: Router,
        openapi: Option<utoipa::openapi::OpenApi>,
    ) -> Result<Router> {
        let config = self.get_config();
        let mut router = Router::new()
            .route("/health", get(web::health_check))
            .merge(app);

        if config.enable_docs {
            if let Some(doc) = openapi {
                let doc = Arc::new(serde_json::to_value(doc)?);
                tracing::info!(
                    paths = doc["paths"].as_object().map(|p| p.len()).unwrap_or(0),
                    "Serving OpenAPI document"
                );
                router = router
                    .route(
                        "/openapi.json",
                        get({
                            use axum::{http::header, response::IntoResponse};
                            let v = doc.clone();
                            move || async move {
                                let json = axum::Json((*v).clone());
                                ([(header::CACHE_CONTROL, "no-store")], json).into_response()
                            }
                        }),
                    )
                    .route("/docs", get(web::serve_docs));
            }
        }

        // Middleware order (outermost to innermost):
        // PropagateRequestId -> SetRequestId -> push_req_id_to_extensions -> Trace -> Timeout -> CORS -> BodyLimit
        // Router::layer wraps everything added so far, so layers go on innermost first.
        router = router.layer(RequestBodyLimitLayer::new(config.body_limit_bytes));
        if config.cors_enabled {
            router = router.layer(CorsLayer::permissive());
        }
        router = router.layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )));
        router = router.layer(crate::request_id::create_trace_layer());
        router = router.layer(from_fn(crate::request_id::push_req_id_to_extensions));

        let x_request_id = crate::request_id::header();
        router = router.layer(SetRequestIdLayer::new(
            x_request_id.clone(),
            crate::request_id::MakeReqId,
        ));
        router = router.layer(PropagateRequestIdLayer::new(x_request_id));

        *self.final_router.lock() = Some(router.clone());
        tracing::debug!("HTTP router finalized");
        Ok(router)
    }

    /// Bind, report the bound address, and serve until cancelled.
    pub async fn serve(
        &self,
        cancel: CancellationToken,
        ready: Option<oneshot::Sender<SocketAddr>>,
    ) -> Result<()> {
        let cfg = self.get_config();
        let addr: SocketAddr = cfg
            .bind_addr
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid bind address '{}': {}", cfg.bind_addr, e))?;

        // Take the router so the guard is dropped before awaits
        let stored = { self.final_router.lock().take() };
        let router = match stored {
            Some(r) => r,
            None => {
                tracing::debug!("No application routes registered, serving health only");
                self.build_router(Router::new(), None)?
            }
        };

        let listener = tokio::net::TcpListener::bind(addr).await?;
        let bound = listener.local_addr()?;
        tracing::info!("HTTP server bound on {}", bound);
        if let Some(tx) = ready {
            let _ = tx.send(bound);
        }

        let shutdown = {
            let cancel = cancel.clone();
            async move {
                cancel.cancelled().await;
                tracing::info!("HTTP server shutting down gracefully (cancellation)");
            }
        };

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| anyhow::anyhow!(e))
    }
}

/// Resolve on SIGTERM/SIGINT (Ctrl+C on Windows).
pub async fn wait_for_shutdown() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!(target: "shutdown", "SIGINT received");
            }
            _ = sigterm.recv() => {
                tracing::info!(target: "shutdown", "SIGTERM received");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        tracing::info!(target: "shutdown", "Ctrl+C received");
    }

    Ok(())
}
