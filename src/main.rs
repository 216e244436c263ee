//! Pinterest feed proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request        ┌───────────────────────────────────────────────┐
//!     ──────────────────────┼─▶ http server ─▶ routing ─▶ upstream client ──┼──▶ Pinterest
//!                           │                                 │             │
//!     Client Response       │                                 ▼             │
//!     ◀─────────────────────┼── header filter ◀── titles ◀── thumbnails     │
//!                           └───────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use pinfeed::config::{read_config, validate_config, ConfigError, ProxyConfig};
use pinfeed::lifecycle::{shutdown_on_signal, Shutdown};
use pinfeed::observability::{logging, metrics};
use pinfeed::HttpServer;

#[derive(Parser)]
#[command(name = "pinfeed")]
#[command(about = "Pinterest RSS proxy with full titles and large thumbnails", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overriding the configuration.
    #[arg(short, long)]
    bind: Option<String>,

    /// Listen port, overriding the port of the bind address.
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,
}

impl Cli {
    /// File (or defaults), then command-line overrides, then one validation pass.
    fn load(&self) -> Result<ProxyConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => ProxyConfig::default(),
        };
        self.apply_overrides(&mut config);
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }

    /// An unparsable bind address is left as is so validation reports it.
    fn apply_overrides(&self, config: &mut ProxyConfig) {
        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        }
        if let Some(port) = self.port {
            if let Ok(mut addr) = config.listener.bind_address.parse::<SocketAddr>() {
                addr.set_port(port);
                config.listener.bind_address = addr.to_string();
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.load()?;

    logging::init(&config.observability);

    tracing::info!("pinfeed v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        origin = %config.upstream.origin,
        request_timeout_secs = config.timeouts.request_secs,
        missing_title = ?config.rewrite.missing_title,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(shutdown_on_signal(shutdown));

    let server = HttpServer::new(config)?;
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
