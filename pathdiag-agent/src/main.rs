//! pathdiag - locate the first failing hop between two GNS3 nodes
//!
//! - Loads the project inventory from the GNS3 server
//! - Finds the shortest path between source and destination
//! - Probes each node's console in order and stops at the first failure
//! - Ctrl-C cancels the inventory fetch or the walk and prints what is known

mod config;
mod inventory;
mod report;

use anyhow::{Context, Result};
use clap::Parser;
use config::DiagConfig;
use inventory::Gns3Client;
use pathdiag_kernel::{
    cancel_pair, CancelSignal, Diagnosis, Diagnostician, Inventory, NodeHealthChecker, PathWalker, TelnetTransport,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// GNS3 path diagnostic: find where connectivity breaks between two nodes
#[derive(Debug, Parser)]
#[command(name = "pathdiag")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// GNS3 server URL
    #[arg(long = "gns3")]
    server: Option<String>,

    /// Project name or id
    #[arg(long)]
    project: Option<String>,

    /// Node that reported the error
    #[arg(long)]
    source: Option<String>,

    /// Node that failed to respond
    #[arg(long = "dest")]
    destination: Option<String>,

    /// Path to the YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Console connection timeout in milliseconds
    #[arg(long)]
    connect_timeout_ms: Option<u64>,

    /// Wait after each line sent to a console, in milliseconds
    #[arg(long)]
    settle_ms: Option<u64>,

    /// Print the diagnosis as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

impl Cli {
    fn apply(&self, config: &mut DiagConfig) {
        if let Some(url) = &self.server {
            config.server.url = url.clone();
        }
        if self.project.is_some() {
            config.project = self.project.clone();
        }
        if self.source.is_some() {
            config.source = self.source.clone();
        }
        if self.destination.is_some() {
            config.destination = self.destination.clone();
        }
        if let Some(ms) = self.connect_timeout_ms {
            config.probe.connect_timeout_ms = ms;
        }
        if let Some(ms) = self.settle_ms {
            config.probe.settle_ms = ms;
        }
    }
}

fn init_tracing(debug: bool) {
    let default = if debug { "pathdiag=debug,pathdiag_kernel=debug" } else { "pathdiag=info,pathdiag_kernel=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

async fn load_inventory(client: &Gns3Client, project: &str) -> Result<Inventory> {
    let project = client
        .find_project(project)
        .await
        .context("Failed to look up project")?;
    info!("Using project: {} (id {})", project.name, project.project_id);

    let inventory = client
        .fetch_inventory(&project.project_id)
        .await
        .context("Failed to fetch project topology")?;
    Ok(inventory)
}

/// Inventory fetch, then kernel diagnosis with the configured probe settings.
/// `None` means the run was cancelled before the walk started.
async fn run(config: &DiagConfig, cancel: &CancelSignal) -> Result<Option<Diagnosis>> {
    let project = config
        .project
        .as_deref()
        .context("No project given (--project or `project:` in config)")?;
    let source = config.source.as_deref().context("No source node given (--source)")?;
    let destination = config
        .destination
        .as_deref()
        .context("No destination node given (--dest)")?;

    let client = Gns3Client::new(&config.server.url, config.http_timeout())?;
    info!("Connected to GNS3 server at {}", client.base_url());

    let inventory = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            warn!("cancelled while loading the inventory");
            return Ok(None);
        }
        inventory = load_inventory(&client, project) => inventory?,
    };

    let settings = config.probe_settings();
    let checker = NodeHealthChecker::new(TelnetTransport::new(settings.connect_timeout))
        .with_settle_delay(settings.settle_delay)
        .with_commands(config.probe_commands());
    let diagnostician = Diagnostician::new(PathWalker::new(checker));

    let diagnosis = diagnostician
        .diagnose(&inventory, source, destination, cancel)
        .await
        .context("Diagnosis aborted")?;
    Ok(Some(diagnosis))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok(); // Ok si .env n'existe pas

    let cli = Cli::parse();
    init_tracing(cli.debug);

    let mut config = DiagConfig::load(&DiagConfig::config_path(cli.config.as_deref())).await?;
    cli.apply(&mut config);

    let (handle, signal) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling");
            handle.cancel();
        }
    });

    let Some(diagnosis) = run(&config, &signal).await? else {
        println!("{}", report::CANCELLED_BEFORE_WALK);
        return Ok(ExitCode::from(report::EXIT_CANCELLED));
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&diagnosis)?);
    } else {
        print!("{}", report::render(&diagnosis));
    }
    Ok(ExitCode::from(report::exit_code(&diagnosis)))
}
