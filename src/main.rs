//! mlc-serve
//!
//! OpenAI-compatible HTTP front-end for an inference engine.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────────┐
//!                  │                    mlc-serve                     │
//!                  │                                                  │
//!  Client Request  │  ┌────────┐   ┌────────────┐   ┌─────────────┐   │
//!  ────────────────┼─▶│  CORS  │──▶│ request id │──▶│ api routes  │   │
//!                  │  │ layer  │   │ trace/time │   │ (AppContext)│   │
//!                  │  └────────┘   └────────────┘   └──────┬──────┘   │
//!                  │                                       │          │
//!                  │                                       ▼          │
//!  Client Response │  ┌──────────────┐              ┌─────────────┐   │
//!  ◀───────────────┼──│ error mapping│◀─────────────│   engine    │   │
//!                  │  └──────────────┘              │  connector  │   │
//!                  │                                └─────────────┘   │
//!                  │  lifecycle: engine start → serve → drain → stop  │
//!                  └──────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use mlc_serve::config::{self, ServeConfig};
use mlc_serve::engine::EchoConnector;
use mlc_serve::lifecycle::signals::shutdown_signal;
use mlc_serve::observability::{logging, metrics};
use mlc_serve::{api, create_app};

#[derive(Parser)]
#[command(name = "mlc-serve")]
#[command(about = "OpenAI-compatible HTTP front-end for an inference engine", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override the served model id.
    #[arg(short, long)]
    model: Option<String>,
}

fn load(cli: &Cli) -> Result<ServeConfig, config::ConfigError> {
    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => ServeConfig::default(),
    };
    if let Some(bind) = &cli.bind {
        config.listener.bind_address = bind.clone();
    }
    if let Some(model) = &cli.model {
        config.engine.model_id = model.clone();
    }
    config::validation::validate_config(&config).map_err(config::ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load(&cli).map_err(|e| {
        // Logging is not up yet.
        eprintln!("ERROR: configuration invalid: {e}");
        e
    })?;

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "mlc-serve starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        model = %config.engine.model_id,
        request_timeout_secs = config.listener.request_timeout_secs,
        shutdown_timeout_secs = config.lifecycle.shutdown_timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let connector = Arc::new(EchoConnector::new(&config.engine));
    let app = create_app(connector, api::router(), &config)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listener bound");

    app.serve(listener, shutdown_signal()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
