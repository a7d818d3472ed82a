//! Netsnap Binary Entry Point
//!
//! `init` clones the snapshot repository, `schedule` runs sweeps on an
//! interval until interrupted, `sweep` runs a single sweep and exits.
//! Core functionality is provided by the `netsnap` library crate.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use netsnap::{
    config::{AppConfig, expand_home, parse_duration},
    device::{Credentials, DriverRegistry},
    job::{JobRun, SweepJob, SweepParams, SweepScheduler},
    prompt,
    repo::init_repo,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default configuration file, read when present.
const DEFAULT_CONFIG: &str = "netsnap.yaml";

/// Netsnap - network device state snapshots in git
#[derive(Parser, Debug)]
#[command(name = "netsnap", version, about, long_about = None)]
struct Cli {
    /// Append logs to this file (in addition to stderr)
    #[arg(long, global = true, default_value = "netsnap.log", env = "NETSNAP_LOG_FILE")]
    log_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clone the remote snapshot repository into a new local folder
    Init(InitArgs),
    /// Sweep the inventory on a fixed interval until interrupted
    Schedule(ScheduleArgs),
    /// Sweep the inventory once, publish, and exit
    Sweep(SweepArgs),
}

#[derive(Args, Debug)]
struct InitArgs {
    /// URL of the remote git repository
    #[arg(long)]
    remote: Option<String>,

    /// Local folder to clone into (must not exist)
    #[arg(long)]
    path: Option<PathBuf>,

    /// Private key for the clone
    #[arg(long)]
    ssh_key: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SweepArgs {
    /// Path to configuration file
    #[arg(short, long, env = "NETSNAP_CONFIG")]
    config: Option<PathBuf>,

    /// Local working copy (overrides config file)
    #[arg(long, env = "NETSNAP_PATH")]
    path: Option<PathBuf>,

    /// Private key for pushes (overrides config file)
    #[arg(long, env = "NETSNAP_SSH_KEY")]
    ssh_key: Option<PathBuf>,

    /// Device login username
    #[arg(long, env = "NETSNAP_USERNAME")]
    username: Option<String>,

    /// Device login password
    #[arg(long, env = "NETSNAP_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(Args, Debug)]
struct ScheduleArgs {
    #[command(flatten)]
    sweep: SweepArgs,

    /// Time between sweeps, e.g. `3600` or `1h` (overrides config file)
    #[arg(long, env = "NETSNAP_INTERVAL", value_parser = parse_duration)]
    interval: Option<Duration>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(&cli.log_file)?;

    match cli.command {
        Command::Init(args) => run_init(args).await,
        Command::Schedule(args) => run_schedule(args).await,
        Command::Sweep(args) => run_sweep(args).await,
    }
}

/// Log to stderr and append to `log_file`.
fn init_tracing(log_file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let file = OpenOptions::new().create(true).append(true).open(log_file)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,netsnap=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

async fn run_init(args: InitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let remote = match args.remote {
        Some(remote) => remote,
        None => prompt::line("remote URL", "Enter URL of remote git repository: ")?,
    };
    let path = match args.path {
        Some(path) => path,
        None => prompt::line("local path", "Enter path of local folder: ")?.into(),
    };
    let path = expand_home(&path);

    tracing::info!("Cloning {} into {}", remote, path.display());
    let ssh_key = args.ssh_key.as_deref().map(expand_home);
    tokio::task::spawn_blocking(move || init_repo(&remote, &path, ssh_key)).await??;
    Ok(())
}

async fn run_sweep(args: SweepArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(args.config.as_deref())?;
    let job = build_job(&config, args)?;

    match job.run().await {
        JobRun::Completed(report) => {
            tracing::info!(
                "Sweep finished: {} collected, {} failed in {:?}",
                report.sweep.collected(),
                report.sweep.failed(),
                report.sweep.duration,
            );
            report.publish?;
            Ok(())
        }
        JobRun::WorkingCopyMissing => {
            Err("working copy not found; run `netsnap init` first".into())
        }
        JobRun::Skipped => Ok(()),
    }
}

async fn run_schedule(args: ScheduleArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(args.sweep.config.as_deref())?;
    let job = Arc::new(build_job(&config, args.sweep)?);
    let interval = resolve_interval(args.interval, &config)?;

    tracing::info!("Starting sweep scheduler...");
    let scheduler = SweepScheduler::new().await?;
    scheduler.spawn(job, interval).await?;
    scheduler.start().await?;

    tracing::info!("Press Ctrl+C to shutdown");
    shutdown_signal().await;

    tracing::info!("Shutting down scheduler...");
    if let Err(e) = scheduler.shutdown().await {
        tracing::error!("Failed to shutdown scheduler: {}", e);
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Load the configuration file.
///
/// An explicit path must exist; the default `netsnap.yaml` is optional.
fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            AppConfig::load(path)?
        }
        None if Path::new(DEFAULT_CONFIG).exists() => {
            tracing::info!("Loading configuration from: {}", DEFAULT_CONFIG);
            AppConfig::load(DEFAULT_CONFIG)?
        }
        None => {
            tracing::warn!("No configuration file found, using defaults");
            AppConfig::from_yaml("{}")?
        }
    };

    if config.inventory.is_empty() {
        tracing::warn!("Inventory is empty; sweeps will only publish the working copy");
    }
    tracing::info!(
        "Inventory: {} devices, {} getters, transport {}, workers {}",
        config.inventory.len(),
        config.getters.len(),
        config.driver.transport,
        config.schedule.max_concurrency,
    );
    Ok(config)
}

/// Sweep interval: flag/env > config file > prompt.
///
/// Asked last, after the path, key and credentials.
fn resolve_interval(
    flag: Option<Duration>,
    config: &AppConfig,
) -> Result<Duration, prompt::PromptError> {
    match flag.or(config.schedule.interval) {
        Some(interval) => Ok(interval),
        None => prompt::interval("Commit every (seconds, or e.g. 1h): "),
    }
}

/// Resolve the remaining parameters (flag/env > config file > prompt) and
/// assemble the sweep job.
fn build_job(config: &AppConfig, args: SweepArgs) -> Result<SweepJob, Box<dyn std::error::Error>> {
    let path = match args.path.or_else(|| config.repository.path.clone()) {
        Some(path) => path,
        None => prompt::line("local path", "Enter path of local folder: ")?.into(),
    };
    let path = expand_home(&path);
    let ssh_key = match args.ssh_key.or_else(|| config.repository.ssh_key.clone()) {
        Some(key) => Some(key),
        None => prompt::optional_line("SSH key path (blank for agent/default): ")?.map(PathBuf::from),
    };
    let ssh_key = ssh_key.as_deref().map(expand_home);
    let username = match args.username {
        Some(username) => username,
        None => prompt::line("username", "Username: ")?,
    };
    let password = match args.password {
        Some(password) => password,
        None => prompt::password("Password: ")?,
    };

    let registry = Arc::new(DriverRegistry::napalm(&config.driver));
    tracing::debug!("Drivers registered for vendors: {:?}", registry.vendors());

    Ok(SweepJob::from_config(
        config,
        SweepParams {
            path,
            credentials: Credentials::new(username, password),
            ssh_key,
        },
        registry,
    ))
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal");
        }
    }
}
