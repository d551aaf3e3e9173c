//! restin - HTTP inbound gateway for transactional middleware
//!
//! # Usage
//!
//! ```bash
//! # Serve with a section document (default command)
//! restin
//! restin serve --config configs/restin.json
//!
//! # Development: register in-process echo services for the loopback runtime
//! restin serve --config configs/restin.json --echo ECHOSVC --echo Q
//! ```
//!
//! The production middleware binding implements the client-context traits
//! out of tree; this binary wires the in-process loopback runtime, which is
//! meant for development and integration testing.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter, Registry};

use restin_config::{Config, Section};
use restin_gateway::{server, Gateway};
use restin_protocol::loopback::{LoopbackRuntime, ServiceRegistry};

/// restin - HTTP inbound gateway
#[derive(Parser, Debug)]
#[command(name = "restin")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to the configuration section document
    #[arg(short, long, default_value = "configs/restin.json", global = true)]
    config: PathBuf,

    /// Log level until the section's `debug` key applies (trace..error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Register an echo service on the loopback runtime (repeatable)
    #[arg(long = "echo", global = true)]
    echo_services: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the gateway (default)
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_handle = init_logging(&cli.log_level)?;

    match cli.command {
        Some(Command::Serve) | None => run(cli, log_handle).await,
    }
}

type LogHandle = reload::Handle<EnvFilter, Registry>;

/// Initialize the tracing subscriber with a reloadable filter
fn init_logging(level: &str) -> Result<LogHandle> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let (filter, handle) = reload::Layer::new(filter);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();

    Ok(handle)
}

async fn run(cli: Cli, log_handle: LogHandle) -> Result<()> {
    let section = Section::from_json_file(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let config = Config::from_section(&section).context("configuration rejected")?;

    // The section's debug key overrides the CLI level process-wide
    if let Some(debug) = &config.gateway.debug {
        let filter = EnvFilter::try_new(debug)
            .with_context(|| format!("invalid debug config '{debug}'"))?;
        log_handle.reload(filter).context("applying debug config")?;
    }

    if config.gateway.gencore {
        // Crashes should produce core dumps again
        tracing::info!("gencore set - restoring the default SIGSEGV handler");
        unsafe {
            libc::signal(libc::SIGSEGV, libc::SIG_DFL);
        }
    }

    let mut services = ServiceRegistry::new();
    for name in &cli.echo_services {
        tracing::warn!(service = %name, "registering loopback echo service");
        services.register(name.clone(), |buffer| async move { Ok(buffer) });
    }
    tracing::warn!("using the in-process loopback runtime (development mode)");
    let factory = LoopbackRuntime::new(services);

    let gateway = Arc::new(Gateway::new(&config, &factory).context("gateway startup failed")?);

    let cancel = CancellationToken::new();
    tokio::spawn(watch_signals(cancel.clone()));

    tracing::info!("restin init ok - serving");
    let served = server::serve(Arc::clone(&gateway), &config.gateway, cancel).await;

    // Reclaim every worker slot before exiting, even after a serve error
    gateway.shutdown().await;
    served.context("serve failed")?;

    tracing::info!("shutdown complete");
    Ok(())
}

/// Cancel on SIGINT or SIGTERM
async fn watch_signals(cancel: CancellationToken) {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut term = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            Ok(term) => term,
            Err(err) => {
                tracing::error!(error = %err, "cannot install SIGTERM handler");
                let _ = ctrl_c.await;
                cancel.cancel();
                return;
            }
        };

        tokio::select! {
            _ = ctrl_c => {}
            _ = term.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }

    tracing::warn!("shutdown signal received - draining workers");
    cancel.cancel();
}
