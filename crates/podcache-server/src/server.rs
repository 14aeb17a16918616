use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, http::StatusCode, middleware, routing::get};
use podcache_core::{Clock, InventorySource};
use podcache_kube::{ClientOptions, KubePodSource, build_client};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};

use crate::cache::{CacheSettings, UserCacheStore};
use crate::error::StartupError;
use crate::middleware::IdentityState;
use crate::{config::AppConfig, handlers, middleware as app_middleware};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<UserCacheStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(cache: Arc<UserCacheStore>, config: AppConfig) -> Self {
        Self {
            cache,
            config: Arc::new(config),
        }
    }
}

pub struct PodcacheServer {
    addr: SocketAddr,
    app: Router,
}

pub fn build_app(state: AppState) -> Result<Router, StartupError> {
    let cfg = state.config.clone();
    let identity = IdentityState::new(&cfg.auth.user_header).map_err(StartupError::Config)?;

    let mut router = Router::new()
        // Public endpoints
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        // Identity-scoped endpoints
        .route("/pods", get(handlers::list_pods))
        .route("/search", get(handlers::search_pods))
        .route("/cache/stats", get(handlers::cache_stats));

    if cfg.metrics.enabled {
        router = router.route("/metrics", get(handlers::metrics));
    }

    // Middleware stack (order: identity -> metrics -> request id -> compression/cors/trace -> body limit -> timeout)
    let router = router
        .layer(middleware::from_fn_with_state(
            identity,
            app_middleware::user_identity,
        ))
        .layer(middleware::from_fn(app_middleware::track_metrics))
        .layer(middleware::from_fn(app_middleware::request_id))
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    let req_id = req
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(axum::extract::DefaultBodyLimit::max(
            cfg.server.body_limit_bytes,
        ));

    // Unbounded unless configured. `AppConfig::validate` keeps it above the
    // upstream deadline so an in-flight refresh still publishes.
    let router = match cfg.request_timeout() {
        Some(timeout) => router.layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        )),
        None => router,
    };

    Ok(router.with_state(state))
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
    source: Option<Arc<dyn InventorySource>>,
    clock: Option<Arc<dyn Clock>>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
            source: None,
            clock: None,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    /// Use this source instead of connecting to a cluster.
    pub fn with_source(mut self, source: Arc<dyn InventorySource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Assemble the cache and router.
    ///
    /// Without an explicit source this builds a Kubernetes client from the
    /// configured kubeconfig or the in-cluster environment.
    pub async fn build(self) -> Result<PodcacheServer, StartupError> {
        self.config.validate().map_err(StartupError::Config)?;

        let source: Arc<dyn InventorySource> = match self.source {
            Some(source) => source,
            None => {
                let mut options = ClientOptions::default();
                if let Some(path) = &self.config.upstream.kubeconfig {
                    options = options.with_kubeconfig(path.clone());
                }
                let client = build_client(&options).await?;
                tracing::info!(
                    kubeconfig = ?self.config.upstream.kubeconfig,
                    "Kubernetes client initialized"
                );
                Arc::new(KubePodSource::new(client))
            }
        };

        let settings = CacheSettings::from_config(&self.config);
        tracing::info!(
            ttl_secs = settings.ttl.as_secs(),
            coalesce = settings.coalesce_refreshes,
            upstream_timeout_ms = ?settings.upstream_timeout.map(|d| d.as_millis()),
            "Cache configured"
        );
        let mut store = UserCacheStore::new(source, settings);
        if let Some(clock) = self.clock {
            store = store.with_clock(clock);
        }

        let state = AppState::new(Arc::new(store), self.config);
        let app = build_app(state)?;

        Ok(PodcacheServer {
            addr: self.addr,
            app,
        })
    }
}

impl PodcacheServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    pub async fn serve(
        self,
        listener: tokio::net::TcpListener,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        tracing::info!("listening on {}", listener.local_addr()?);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
