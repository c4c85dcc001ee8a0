//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration, then apply command-line overrides
//! - Initialize logging and metrics
//! - Compile the rules, start the watchers, bind the listener
//! - Serve until a shutdown signal arrives
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - The listener binds last (traffic only when rules are ready)

use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::validation::validate_config;
use crate::config::watcher::ConfigWatcher;
use crate::config::{load_config, ConfigError, ProxyConfig};
use crate::http::{HttpServer, ServerError};
use crate::lifecycle::signals;
use crate::lifecycle::Shutdown;
use crate::observability::logging::{self, LoggingError};
use crate::observability::metrics;

/// Errors that abort startup.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid override: {0}")]
    Override(String),

    #[error("Logging setup failed: {0}")]
    Logging(#[from] LoggingError),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub timeout: Option<u64>,
}

impl Overrides {
    /// Apply the overrides and re-validate the result.
    pub fn apply(&self, config: &mut ProxyConfig) -> Result<(), StartupError> {
        if self.host.is_some() || self.port.is_some() {
            let mut addr: SocketAddr = config
                .listener
                .bind_address
                .parse()
                .map_err(|_| StartupError::Override(config.listener.bind_address.clone()))?;

            if let Some(host) = &self.host {
                let ip: IpAddr = host
                    .parse()
                    .map_err(|_| StartupError::Override(format!("`{}` is not an IP address", host)))?;
                addr.set_ip(ip);
            }
            if let Some(port) = self.port {
                addr.set_port(port);
            }
            config.listener.bind_address = addr.to_string();
        }

        if let Some(timeout) = self.timeout {
            config.timeouts.request_secs = timeout;
        }

        validate_config(config).map_err(|errors| StartupError::Config(ConfigError::Validation(errors)))
    }
}

/// Run the proxy from `config_path` until Ctrl+C or SIGTERM.
pub async fn run(config_path: &Path, overrides: Overrides) -> Result<(), StartupError> {
    let mut config = load_config(config_path)?;
    overrides.apply(&mut config)?;

    logging::init_logging(&config.observability)?;

    tracing::info!("rewrite-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        path = ?config_path,
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        domains = config.domains.len(),
        uris = config.uris.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    if !config.plugin_dir.is_empty() {
        tracing::warn!(
            plugin_dir = %config.plugin_dir,
            "Plugin directories are not loaded; only registered rewriter kinds are available"
        );
    }

    let server = HttpServer::new(config.clone())?;

    let (watcher, config_updates) = ConfigWatcher::new(config_path);
    let _hangup = signals::spawn_reload_on_hangup(config_path.to_path_buf(), watcher.sender())?;
    let _watcher = match watcher.run() {
        Ok(w) => Some(w),
        Err(e) => {
            tracing::warn!(error = %e, "File watching unavailable, reload with SIGHUP only");
            None
        }
    };

    let address = config.listener.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let mut server_task = tokio::spawn(server.run(listener, config_updates, shutdown.subscribe()));

    tokio::select! {
        result = &mut server_task => {
            flatten(result)?;
        }
        _ = signals::shutdown_signal() => {
            shutdown.trigger();
            flatten(server_task.await)?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

fn flatten(
    result: Result<Result<(), std::io::Error>, tokio::task::JoinError>,
) -> Result<(), StartupError> {
    match result {
        Ok(inner) => Ok(inner?),
        Err(e) => Err(StartupError::Io(std::io::Error::other(e))),
    }
}
