//! Age verification daemon: serves the HTTP API, replays pose traces offline,
//! and prints the effective configuration.

mod config;
mod error;
mod replay;

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use ageverify_analysis::GeminiClient;
use ageverify_rpc::{AppState, RpcServer, ServiceMetrics};
use ageverify_types::Direction;
use ageverify_utils::{init_logging, LogFormat};
use ageverify_verification::{Reconciler, RuleReconciler, VerificationOrchestrator};
use anyhow::Context;
use clap::Parser;

use crate::config::{ReconcilerKind, ServiceConfig};

#[derive(Parser)]
#[command(name = "ageverify", about = "Liveness-checked age verification service")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// CLI flags and env vars override them.
    #[arg(long, env = "AGEVERIFY_CONFIG")]
    config: Option<PathBuf>,

    /// HTTP API port.
    #[arg(long, env = "AGEVERIFY_PORT")]
    port: Option<u16>,

    /// Address the HTTP API binds to.
    #[arg(long, env = "AGEVERIFY_LISTEN_ADDR")]
    listen_addr: Option<IpAddr>,

    /// Log level filter, e.g. "info" or "debug,ageverify_liveness=trace".
    #[arg(long, env = "AGEVERIFY_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "AGEVERIFY_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Enable the Prometheus metrics endpoint.
    #[arg(long, env = "AGEVERIFY_ENABLE_METRICS")]
    metrics: bool,

    /// API key for the analysis service.
    #[arg(long, env = "AGEVERIFY_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Start the HTTP API.
    Serve,

    /// Run a recorded pose trace through a liveness attempt and print the report.
    Replay {
        /// JSON trace file.
        trace: PathBuf,

        /// Fixed challenge, comma-separated (e.g. "LEFT,RIGHT"). Defaults to the
        /// configured profile's directions in order.
        #[arg(long, value_delimiter = ',')]
        sequence: Vec<String>,
    },

    /// Print the effective configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match cli.config.as_deref() {
        Some(path) => ServiceConfig::from_toml_file(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(addr) = cli.listen_addr {
        config.listen_addr = addr;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    config.enable_metrics |= cli.metrics;

    init_logging(config.log_format, &config.log_level);
    if let Some(path) = &cli.config {
        tracing::info!("Loaded config from {}", path.display());
    }

    match cli.command {
        Command::Serve => serve(config, cli.api_key).await,
        Command::Replay { trace, sequence } => {
            let directions = if sequence.is_empty() {
                replay::default_sequence(&config.liveness)
            } else {
                sequence
                    .iter()
                    .map(|s| s.parse::<Direction>())
                    .collect::<Result<Vec<_>, _>>()?
            };
            let frames = replay::load_trace(&trace)?;
            let report = replay::replay(&frames, directions, config.liveness)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Command::Config => {
            print!("{}", config.to_toml_string());
            Ok(())
        }
    }
}

async fn serve(config: ServiceConfig, api_key: Option<String>) -> anyhow::Result<()> {
    let api_key = api_key
        .or_else(|| config.analysis.api_key_from_env())
        .with_context(|| {
            format!(
                "no analysis API key: pass --api-key or set {}",
                config.analysis.api_key_env
            )
        })?;
    let client = Arc::new(GeminiClient::new(&config.analysis, api_key)?);

    let reconciler: Arc<dyn Reconciler> = match config.reconciler {
        ReconcilerKind::Remote => client.clone(),
        ReconcilerKind::Rules => Arc::new(RuleReconciler::new(config.max_age_gap)),
    };
    let orchestrator = VerificationOrchestrator::new(
        client.clone(),
        client.clone(),
        reconciler,
        config.verification.clone(),
    )?;

    let mut state = AppState::new(orchestrator);
    if config.enable_metrics {
        state = state.with_metrics(Arc::new(ServiceMetrics::new()));
    }

    tracing::info!(
        "Starting age verification service on {} (model {}, reconciler {:?}, legal age {}, metrics {})",
        config.socket_addr(),
        config.analysis.model,
        config.reconciler,
        config.verification.legal_age,
        if config.enable_metrics { "on" } else { "off" },
    );

    let server = RpcServer::new(config.socket_addr(), Arc::new(state))
        .with_allowed_origins(config.allowed_origins.clone());
    server
        .start(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("failed to listen for shutdown signal: {e}");
            }
            tracing::info!("Shutdown signal received, stopping");
        })
        .await?;

    tracing::info!("ageverify daemon exited cleanly");
    Ok(())
}
