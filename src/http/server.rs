//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the proxy handler
//! - Wire up middleware (request ID, tracing)
//! - Bind the server to a listener
//! - Apply rule reloads while serving
//! - Stop gracefully on shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::Response,
    routing::{on, MethodFilter},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::pipeline::Pipeline;
use crate::http::request::request_id_layer;
use crate::http::transport::{HttpTransport, Transport};
use crate::observability::metrics;
use crate::rewrite::{RewriteError, RewriterRegistry, RuleStore};

/// Methods the proxy accepts; anything else gets 405.
const PROXIED_METHODS: MethodFilter = MethodFilter::GET
    .or(MethodFilter::HEAD)
    .or(MethodFilter::POST);

/// Errors raised while building the server.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid rules: {0}")]
    Rules(#[from] RewriteError),

    #[error("HTTP client setup failed: {0}")]
    Client(#[from] reqwest::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

/// HTTP server for the forward proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    rules: Arc<RuleStore>,
}

impl HttpServer {
    /// Create a server with the built-in rewriters and the `reqwest` transport.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let transport = HttpTransport::new(&config.timeouts)?;
        Self::with_parts(config, RewriterRegistry::with_builtins(), Arc::new(transport))
    }

    /// Create a server from an explicit registry and transport.
    pub fn with_parts(
        config: ProxyConfig,
        registry: RewriterRegistry,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ServerError> {
        let rules = Arc::new(RuleStore::new(&config, registry)?);
        let pipeline = Pipeline::new(
            rules.clone(),
            transport,
            Duration::from_secs(config.timeouts.request_secs),
        );

        let state = AppState {
            pipeline: Arc::new(pipeline),
        };

        Ok(Self {
            router: Self::build_router(state),
            config,
            rules,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", on(PROXIED_METHODS, proxy_handler))
            .route("/", on(PROXIED_METHODS, proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(request_id_layer())
                    .layer(TraceLayer::new_for_http()),
            )
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Configurations received on `config_updates` replace the active
    /// rules. The server stops once `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ProxyConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let rules = self.rules.clone();
        let initial = self.config.clone();
        let reloader = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                apply_update(&rules, &initial, &config);
            }
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn apply_update(rules: &RuleStore, initial: &ProxyConfig, config: &ProxyConfig) {
    if config.listener != initial.listener
        || config.timeouts != initial.timeouts
        || config.observability != initial.observability
    {
        tracing::warn!("Listener, timeout and observability changes take effect after restart");
    }

    match rules.reload(config) {
        Ok(generation) => {
            tracing::info!(generation, "Configuration reloaded");
            metrics::record_reload(true);
        }
        Err(e) => {
            tracing::error!(error = %e, "Reload rejected, keeping current rules");
            metrics::record_reload(false);
        }
    }
}

/// Main proxy handler.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Result<Response, ProxyError> {
    state.pipeline.handle(addr, request).await
}
