//! mendd entry point.
//!
//! # Usage
//!
//! ```text
//! mendd handle --event batch.json --cluster-name prod-eks
//! mendd serve --port 8080 --config /etc/mendgrid/mendgrid.toml
//! mendd classify prod-status-check-failed-node3
//! mendd seed --topology topology.toml
//! ```

use std::io::Read;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use mendd::{ConfigArgs, RecoveryTrigger, build_dispatcher, open_store};
use mendgrid_recovery::classify;
use mendgrid_state::Topology;

const DEFAULT_FILTER: &str = "info,mendd=debug,mendgrid=debug";

#[derive(Parser)]
#[command(name = "mendd", about = "mendgrid cluster auto-recovery daemon", version)]
struct Cli {
    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Handle one notification batch and print the invocation status.
    Handle {
        /// Batch file, or "-" for stdin.
        #[arg(long, short, default_value = "-")]
        event: String,

        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Serve the HTTP trigger; each POST body is one batch.
    Serve {
        /// Address to bind.
        #[arg(long, default_value = "0.0.0.0")]
        bind: std::net::IpAddr,

        /// Port to listen on.
        #[arg(long, default_value = "8080")]
        port: u16,

        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Print the remediation an alarm name maps to.
    Classify {
        alarm_name: String,
    },
    /// Load a topology file into the local control plane.
    Seed {
        /// Topology TOML file.
        #[arg(long, short)]
        topology: PathBuf,

        #[command(flatten)]
        config: ConfigArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Command::Handle { event, config } => run_handle(&event, &config).await,
        Command::Serve { bind, port, config } => run_serve(SocketAddr::new(bind, port), &config).await,
        Command::Classify { alarm_name } => {
            println!("{}", classify(&alarm_name));
            Ok(())
        }
        Command::Seed { topology, config } => run_seed(&topology, &config),
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run_handle(event: &str, args: &ConfigArgs) -> anyhow::Result<()> {
    let config = args.resolve()?;
    let raw = read_event(event)?;

    let store = open_store(&config)?;
    let dispatcher = build_dispatcher(&config, store)?;

    let status = dispatcher
        .handle_raw(&raw)
        .await
        .context("malformed notification batch")?;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

fn read_event(event: &str) -> anyhow::Result<Vec<u8>> {
    if event == "-" {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("failed to read batch from stdin")?;
        Ok(buf)
    } else {
        std::fs::read(event).with_context(|| format!("failed to read {event}"))
    }
}

async fn run_serve(addr: SocketAddr, args: &ConfigArgs) -> anyhow::Result<()> {
    let config = args.resolve()?;
    let store = open_store(&config)?;
    let dispatcher = Arc::new(build_dispatcher(&config, store)?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for shutdown signal");
            // Dropping the sender would stop the trigger.
            std::future::pending::<()>().await;
        }
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    RecoveryTrigger::new(dispatcher).serve(addr, shutdown_rx).await?;
    info!("mendd stopped");
    Ok(())
}

fn run_seed(topology: &std::path::Path, args: &ConfigArgs) -> anyhow::Result<()> {
    let config = args.layered()?;
    let store = open_store(&config)?;
    let topology = Topology::from_file(topology)?;
    let count = topology
        .apply(&store)
        .context("failed to seed topology")?;
    info!(node_groups = count, path = %config.state_path.display(), "topology seeded");
    Ok(())
}
