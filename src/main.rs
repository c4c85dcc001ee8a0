//! Rewrite Proxy
//!
//! A forward HTTP proxy that rewrites the target of each request before
//! forwarding it, built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌──────────────────────────────────────────────┐
//!                          │                REWRITE PROXY                 │
//!                          │                                              │
//!     Client Request       │  ┌────────┐   ┌──────────┐   ┌───────────┐   │
//!     ─────────────────────┼─▶│  http  │──▶│ security │──▶│  rewrite  │   │
//!                          │  │ server │   │  access  │   │ RuleSet   │   │
//!                          │  └────────┘   └──────────┘   └─────┬─────┘   │
//!                          │                                    │         │
//!                          │                                    ▼         │
//!     Client Response      │  ┌──────────┐              ┌────────────┐    │
//!     ◀────────────────────┼──│ response │◀─────────────│ transport  │◀───┼──── Upstream
//!                          │  └──────────┘              └────────────┘    │
//!                          │                                              │
//!                          │  config (watch/SIGHUP) → RuleStore reload    │
//!                          └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use rewrite_proxy::lifecycle::startup::{self, Overrides};

#[derive(Parser, Debug)]
#[command(name = "rewrite-proxy", version, about = "Forward HTTP proxy with regex rewriting")]
struct Cli {
    /// Address to listen on (overrides listener.bind_address).
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides listener.bind_address).
    #[arg(long)]
    port: Option<u16>,

    /// Upstream request timeout in seconds.
    #[arg(long)]
    timeout: Option<u64>,

    /// Path to the YAML or TOML configuration file.
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let overrides = Overrides {
        host: cli.host,
        port: cli.port,
        timeout: cli.timeout,
    };

    startup::run(&cli.config, overrides).await?;
    Ok(())
}
