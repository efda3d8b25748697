//! # Argo CD Update
//!
//! Promotion step that points Argo CD Applications at new revisions and waits
//! for the resulting syncs.
//!
//! ## Usage
//!
//! ```bash
//! # Poll until the step reaches a terminal status
//! argocd-update run --config step.yaml --promotion promo-1 --project my-project --stage test
//!
//! # Run a single pass, e.g. from an external scheduler
//! argocd-update run --config step.yaml --promotion promo-1 --project my-project --stage test --once
//!
//! # Print the JSON Schema of the step configuration
//! argocd-update schema
//! ```
//!
//! The final step result is printed to stdout as JSON. The exit code is zero
//! only when the step `Succeeded` (or is still `Running` with `--once`).

use anyhow::{Context, Result};
use argocd_update::config::UpdaterConfig;
use argocd_update::controller::server::{start_server, ServerState};
use argocd_update::provider::kubernetes::KubeApplicationClient;
use argocd_update::runtime;
use argocd_update::{ArgoCdUpdateConfig, ArgoCdUpdater, StepContext, StepResult, StepStatus};
use argocd_update::UpdateError;
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Argo CD Application updater for promotion pipelines
#[derive(Parser)]
#[command(name = "argocd-update", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run reconciliation passes for one step until it settles
    Run(RunArgs),
    /// Print the JSON Schema of the step configuration
    Schema,
}

#[derive(Args)]
struct RunArgs {
    /// Step configuration file (YAML or JSON)
    #[arg(short, long)]
    config: PathBuf,

    /// Name of the Promotion the step runs for
    #[arg(long)]
    promotion: String,

    /// Project (namespace) of the requesting Stage
    #[arg(long)]
    project: String,

    /// Name of the requesting Stage
    #[arg(long)]
    stage: String,

    /// Human actor who triggered the Promotion
    #[arg(long)]
    actor: Option<String>,

    /// Seconds between passes (overrides `POLL_INTERVAL_SECS`)
    #[arg(long)]
    interval: Option<u64>,

    /// Maximum number of passes (overrides `MAX_PASSES`)
    #[arg(long)]
    max_passes: Option<u32>,

    /// Run exactly one pass
    #[arg(long)]
    once: bool,

    /// Serve metrics and probes on this port (overrides `METRICS_PORT`)
    #[arg(long)]
    metrics_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run_command(args).await,
        Commands::Schema => {
            let schema = schemars::schema_for!(ArgoCdUpdateConfig);
            println!(
                "{}",
                serde_json::to_string_pretty(&schema).context("Failed to render schema")?
            );
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run_command(args: RunArgs) -> Result<ExitCode> {
    let mut config = UpdaterConfig::from_env();
    if let Some(interval) = args.interval {
        config.poll_interval_secs = interval;
    }
    if let Some(max_passes) = args.max_passes {
        config.max_passes = max_passes;
    }
    if args.metrics_port.is_some() {
        config.metrics_port = args.metrics_port;
    }

    let client = runtime::initialize(&config).await?;

    let text = std::fs::read_to_string(&args.config).context(format!(
        "Failed to read step configuration: {}",
        args.config.display()
    ))?;
    let step_config = match ArgoCdUpdateConfig::from_yaml(&text) {
        Ok(step_config) => step_config,
        Err(e) => {
            let result = StepResult::errored(UpdateError::InvalidConfig(e));
            print_result(&result)?;
            return Ok(exit_code(&result, args.once));
        }
    };

    let mut ctx = StepContext::new(args.promotion, args.project, args.stage);
    if let Some(actor) = args.actor {
        ctx = ctx.with_actor(actor);
    }

    let server_state = Arc::new(ServerState::default());
    if let Some(port) = config.metrics_port {
        let state = Arc::clone(&server_state);
        tokio::spawn(async move {
            if let Err(e) = start_server(port, state).await {
                error!("HTTP server error: {}", e);
            }
        });
    }

    let interval = config.poll_interval_duration();
    let max_passes = if args.once { 1 } else { config.max_passes.max(1) };
    let updater = ArgoCdUpdater::new(Arc::new(KubeApplicationClient::new(client)), config);

    let mut pass = 0;
    let result = loop {
        pass += 1;
        let result = updater.reconcile(&ctx, &step_config).await;
        server_state.mark_ready();

        if pass >= max_passes || result.is_terminal() {
            break result;
        }
        info!(
            "Pass {}/{} finished with status {}, next pass in {}s",
            pass,
            max_passes,
            result.status,
            interval.as_secs()
        );
        tokio::time::sleep(interval).await;
    };

    if !args.once && !result.is_terminal() {
        warn!("Step did not settle after {} passes", pass);
    }

    print_result(&result)?;
    Ok(exit_code(&result, args.once))
}

fn print_result(result: &StepResult) -> Result<()> {
    let report = json!({
        "status": result.status,
        "message": result.error.as_ref().map(ToString::to_string),
        "healthCheck": result.health_check,
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("Failed to render step result")?
    );
    Ok(())
}

fn exit_code(result: &StepResult, once: bool) -> ExitCode {
    match result.status {
        StepStatus::Succeeded => ExitCode::SUCCESS,
        StepStatus::Running if once => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}
