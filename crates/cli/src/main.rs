// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! nexus - distributed SSH task runner

mod output;
mod render;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use nexus_core::{RunStatus, TaskName};
use nexus_engine::{Orchestrator, RunOptions, TelemetryEvent};
use nexus_ssh::{pool::DialFn, Pool, PoolConfig, RealTransport};
use tokio::sync::mpsc;

use output::OutputFormat;

#[derive(Parser)]
#[command(name = "nexus", version, about = "Run SSH-based task pipelines described in HCL")]
struct Cli {
    /// Path to the runbook
    #[arg(short = 'c', long = "config", global = true, default_value = "nexus.hcl")]
    config: PathBuf,

    /// Output format
    #[arg(short = 'o', long = "output", value_enum, default_value_t, global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one or more tasks and everything they depend on
    Run(RunArgs),
    /// Print the phased execution plan without running anything
    Plan(PlanArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Task names to run
    #[arg(required = true)]
    tasks: Vec<String>,

    /// Keep running later tasks/hosts after a failure
    #[arg(long)]
    continue_on_error: bool,

    /// Max tasks run concurrently within a phase
    #[arg(long, default_value_t = 10)]
    parallel_limit: usize,
}

#[derive(Args)]
struct PlanArgs {
    /// Task names to plan for
    #[arg(required = true)]
    tasks: Vec<String>,
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn real_dial(connect_timeout: Duration) -> DialFn<RealTransport> {
    Arc::new(move |addr| Box::pin(async move { RealTransport::dial(&addr, connect_timeout).await }))
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = nexus_config::load_file(&cli.config)
        .with_context(|| format!("loading runbook {}", cli.config.display()))?;

    let pool_config = PoolConfig {
        size: config.defaults.max_connections,
        connect_timeout: Duration::from_millis(config.defaults.connect_timeout_ms),
        ..PoolConfig::default()
    };
    let pool = Arc::new(Pool::new(real_dial(pool_config.connect_timeout)));
    let orchestrator = Orchestrator::new(pool.clone(), pool_config);

    match cli.command {
        Commands::Plan(args) => {
            let targets = task_names(&args.tasks);
            let plan = orchestrator.plan(&config, &targets).context("building execution plan")?;
            println!("{}", render::render_plan(&plan, cli.output));
        }
        Commands::Run(args) => {
            let targets = task_names(&args.tasks);
            let (telemetry_tx, telemetry_rx) = mpsc::channel(256);
            let drain = tokio::spawn(drain_telemetry(telemetry_rx));
            let opts = RunOptions {
                continue_on_error: args.continue_on_error.then_some(true),
                parallel_limit: args.parallel_limit,
                dry_run: false,
                telemetry: Some(telemetry_tx),
            };
            let result = orchestrator.run(&config, &targets, &opts).await.context("running pipeline")?;
            drop(opts);
            pool.shutdown().await;
            drain.await.ok();
            println!("{}", render::render_result(&result, cli.output));
            if result.status == RunStatus::Error {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Default telemetry sink: log every event and drop it. A future UI
/// (progress bars, a TUI) would drain the same channel differently.
async fn drain_telemetry(mut rx: mpsc::Receiver<TelemetryEvent>) {
    while let Some(event) = rx.recv().await {
        tracing::info!(?event, "telemetry");
    }
}

fn task_names(raw: &[String]) -> Vec<TaskName> {
    raw.iter().map(|t| TaskName::from(t.as_str())).collect()
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
