use crate::{
    conn::{ConnectionPinger, PostgresPinger, RedisPinger, build_runner, checkpoint_store},
    error::CliError,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use clap::Parser;
use commands::Commands;
use engine_config::{
    loader::{load_config, resolve_path},
    schedule::ScheduleParser,
    settings::{AppConfig, ConfigValidator},
};
use engine_runtime::scheduler::Scheduler;
use model::task::spec::TaskSpec;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod conn;
mod error;
mod output;
mod shutdown;

#[derive(Parser)]
#[command(
    name = "courier",
    version,
    about = "Incremental PostgreSQL to Redis replication"
)]
struct Cli {
    /// Config file path; falls back to $COURIER_CONFIG, then ./config.yaml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let code = match dispatch(cli).await {
        Ok(code) => code,
        Err(err) => {
            error!(error = %err, "Command failed");
            ExitCode::GeneralError
        }
    };
    std::process::exit(code.as_i32());
}

async fn dispatch(cli: Cli) -> Result<ExitCode, CliError> {
    let path = resolve_path(cli.config);
    let config = load_config(&path)?;
    let tasks = ConfigValidator::default().validate(&config)?;

    match cli.command {
        Commands::Run => run(&config, tasks).await,
        Commands::RunOnce { task, json } => {
            let spec = find_task(&tasks, &task)?;
            let runner = build_runner(&config).await?;
            let outcome = runner.run(spec).await;
            output::print_outcome(&outcome, json)?;
            Ok(if outcome.is_success() {
                ExitCode::Success
            } else {
                ExitCode::GeneralError
            })
        }
        Commands::Validate => {
            info!(path = %path.display(), tasks = tasks.len(), "Configuration is valid");
            output::print_tasks(&tasks);
            Ok(ExitCode::Success)
        }
        Commands::TestConn => {
            let pingers: [Box<dyn ConnectionPinger>; 2] = [
                Box::new(PostgresPinger {
                    settings: config.postgres.clone(),
                }),
                Box::new(RedisPinger {
                    settings: config.redis.clone(),
                }),
            ];
            let mut code = ExitCode::Success;
            for pinger in &pingers {
                match pinger.ping().await {
                    Ok(()) => println!("{:<10} ok", pinger.name()),
                    Err(err) => {
                        println!("{:<10} FAILED: {err}", pinger.name());
                        code = ExitCode::GeneralError;
                    }
                }
            }
            Ok(code)
        }
        Commands::Checkpoint { task } => {
            let spec = find_task(&tasks, &task)?;
            let tracking = spec
                .tracking
                .as_ref()
                .ok_or_else(|| CliError::UntrackedTask(task.clone()))?;
            let store = checkpoint_store(&config).await?;
            match store.get(&tracking.checkpoint_key).await? {
                Some(value) => println!("{}: {value}", tracking.checkpoint_key),
                None => println!("{}: <none>", tracking.checkpoint_key),
            }
            Ok(ExitCode::Success)
        }
    }
}

async fn run(config: &AppConfig, tasks: Vec<TaskSpec>) -> Result<ExitCode, CliError> {
    let runner = build_runner(config).await?;
    let scheduler = Scheduler::new(tasks, &ScheduleParser::new(), runner)?;

    let shutdown = ShutdownCoordinator::new(CancellationToken::new());
    shutdown.register_handlers();
    scheduler.start()?;

    shutdown.cancel_token().cancelled().await;
    scheduler.stop().await;

    let metrics = scheduler.metrics().snapshot();
    info!(
        runs_started = metrics.runs_started,
        runs_succeeded = metrics.runs_succeeded,
        runs_failed = metrics.runs_failed,
        fires_skipped = metrics.fires_skipped,
        rows_loaded = metrics.rows_loaded,
        rows_skipped = metrics.rows_skipped,
        "Courier stopped"
    );

    Ok(if shutdown.is_shutdown_requested() {
        ExitCode::ShutdownRequested
    } else {
        ExitCode::Success
    })
}

fn find_task<'a>(tasks: &'a [TaskSpec], name: &str) -> Result<&'a TaskSpec, CliError> {
    tasks
        .iter()
        .find(|t| t.name.as_str() == name)
        .ok_or_else(|| CliError::UnknownTask(name.to_string()))
}
