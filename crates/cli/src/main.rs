//! `glas` CLI entry-point (spec §6.4).
//!
//! Available sub-commands:
//! - `serve`   — start the orchestrator and the API server.
//! - `migrate` — run pending database migrations.
//!
//! Unlike the scaffold this project is built from, there is no `worker`
//! sub-command: GLAS gives every task its own dedicated worker spawned
//! directly by the `Orchestrator` (spec §5, "no pooling") rather than a
//! detached process draining a shared queue. `serve` *is* the worker host.

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use engine::{JsonNodeFactory, JsonWorkflowFactory, Orchestrator};

#[derive(Parser)]
#[command(name = "glas", about = "Laboratory workflow orchestrator", version)]
struct Cli {
    /// Port the API server binds to.
    #[arg(long, default_value_t = 8000)]
    port: u16,

    /// Path to the node fleet's JSON configuration.
    #[arg(long, default_value = "./config/nodes.json")]
    nodes: PathBuf,

    /// Path to the workflow list's JSON configuration.
    #[arg(long, default_value = "./config/workflows.json")]
    workflows: PathBuf,

    /// Raise the default log level to INFO.
    #[arg(long)]
    verbose: bool,

    /// Sink INFO-and-above log events into the `logs` table.
    #[arg(long)]
    logs: bool,

    /// Run against simulated instruments; logs a banner once at startup.
    #[arg(long)]
    emulate: bool,

    /// Raise the default log level to DEBUG.
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the orchestrator and serve the HTTP API.
    Serve,
    /// Run pending database migrations.
    Migrate,
}

fn database_url() -> String {
    let user = std::env::var("DATABASE_USER").unwrap_or_else(|_| "postgres".to_string());
    let password = std::env::var("DATABASE_PASSWORD").unwrap_or_else(|_| "postgres".to_string());
    let host = std::env::var("DATABASE_HOST").unwrap_or_else(|_| "localhost".to_string());
    let port = std::env::var("DATABASE_PORT").unwrap_or_else(|_| "5432".to_string());
    let name = std::env::var("DATABASE_NAME").unwrap_or_else(|_| "glas".to_string());
    format!("postgres://{user}:{password}@{host}:{port}/{name}")
}

fn authorized_ips() -> Vec<IpAddr> {
    std::env::var("AUTHORIZED_IPS")
        .unwrap_or_default()
        .split_whitespace()
        .filter_map(|s| s.parse().ok())
        .collect()
}

fn install_tracing(cli: &Cli, log_layer: Option<db::logs::DbLogLayer>) {
    let default_directive = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let registry = tracing_subscriber::registry().with(filter).with(tracing_subscriber::fmt::layer());
    match log_layer {
        Some(layer) => registry.with(layer).init(),
        None => registry.init(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let pool = db::pool::create_pool(&database_url(), 10).await.expect("failed to connect to database");

    let log_layer = cli.logs.then(|| db::logs::DbLogLayer::new(pool.clone()));
    install_tracing(&cli, log_layer);

    if cli.emulate {
        warn!("running in EMULATE mode: node drivers report simulated instruments only");
    }

    match cli.command {
        Command::Serve => {
            let orchestrator =
                Arc::new(Orchestrator::new(pool.clone(), Arc::new(JsonNodeFactory), Arc::new(JsonWorkflowFactory)));

            let nodes_blob = tokio::fs::read(&cli.nodes).await.unwrap_or_default();
            let workflows_blob = tokio::fs::read(&cli.workflows).await.unwrap_or_default();
            let code = orchestrator.start(&nodes_blob, &workflows_blob).await;
            info!("orchestrator start at boot: {:?}", code);

            let bind = format!("0.0.0.0:{}", cli.port);
            let jwt_secret = std::env::var("JWT_SECRET").expect("JWT_SECRET must be set");

            api::serve(&bind, pool, orchestrator, cli.nodes.clone(), cli.workflows.clone(), jwt_secret, authorized_ips())
                .await
                .expect("api server failed");
        }
        Command::Migrate => {
            db::pool::run_migrations(&pool).await.expect("migration failed");
            info!("migrations applied successfully");
        }
    }
}
