//! azsync: applies, deletes or reads a manifest of cluster network resources.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context as _, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use azsync::clients::{Authorizer, NullAuthorizer, StaticToken};
use azsync::{Agent, ArmClient, ClusterConfig, ClusterScope, Context, Manifest, RunReport};

/// azsync resource reconciler
#[derive(Parser, Debug)]
#[command(name = "azsync", version, about)]
struct Args {
    /// Cluster configuration file (JSON)
    #[arg(long, short, global = true, default_value = "cluster.json")]
    config: PathBuf,

    /// Resource manifest file (JSON)
    #[arg(long, short, global = true, default_value = "resources.json")]
    manifest: PathBuf,

    /// Bearer token for the Resource Manager API
    #[arg(long, env = "AZSYNC_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Give up after this many seconds (overrides the config file)
    #[arg(long)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create or update every resource
    Apply,
    /// Delete every resource
    Delete,
    /// Print the current state of every resource
    Get,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "azsync=info,reqwest=warn,hyper=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let config = ClusterConfig::load(&args.config).context("Failed to load cluster config")?;
    let manifest = Manifest::load(&args.manifest).context("Failed to load manifest")?;
    let scope = Arc::new(ClusterScope::from_config(&config).context("Invalid cluster config")?);

    info!(
        "Cluster {} in {} ({} network {})",
        scope.cluster_name(),
        scope.resource_group(),
        scope.ownership(),
        scope.vnet().name
    );

    let authorizer: Arc<dyn Authorizer> = match args.token {
        Some(token) => Arc::new(StaticToken::new(token)),
        None => {
            warn!("No token given, sending unauthenticated requests");
            Arc::new(NullAuthorizer)
        }
    };
    let arm = ArmClient::new(scope.subscription_id(), authorizer)
        .with_base_url(config.base_url.clone())
        .with_poll_interval(config.poll_interval());
    let agent = Agent::from_arm(scope, arm);

    let ctx = match args.timeout.map(Duration::from_secs).or(config.timeout()) {
        Some(timeout) => Context::with_timeout(timeout),
        None => Context::new(),
    };

    let interrupt = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            interrupt.cancel();
        }
    });

    match args.command {
        Command::Apply => check(agent.apply(&ctx, &manifest).await, "apply"),
        Command::Delete => check(agent.delete(&ctx, &manifest).await, "delete"),
        Command::Get => {
            let report = agent.get(&ctx, &manifest).await;
            let mut out = serde_json::Map::new();
            for outcome in &report.outcomes {
                let value = match &outcome.result {
                    Ok(value) => value.clone(),
                    Err(e) => serde_json::json!({ "error": e.to_string() }),
                };
                out.insert(format!("{}/{}", outcome.kind, outcome.name), value);
            }
            println!("{}", serde_json::to_string_pretty(&out)?);
            check(report, "get")
        }
    }
}

fn check<T>(report: RunReport<T>, verb: &str) -> Result<()> {
    if report.cancelled {
        bail!("{} cancelled after {} resources", verb, report.outcomes.len());
    }
    let failed = report.failures().count();
    if failed > 0 {
        bail!("{} failed for {} of {} resources", verb, failed, report.outcomes.len());
    }
    info!("{} completed for {} resources", verb, report.outcomes.len());
    Ok(())
}
