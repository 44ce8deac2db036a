//! Launchpad - starts the shape generation API server and UI
//!
//! `launchpad all` starts the API server in the background, waits out the grace
//! period, checks it is still alive and then runs the UI in the foreground.

mod logging;
mod output;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

use launchpad_core::application::{shutdown_channel, Launcher, ShutdownSender};
use launchpad_core::domain::{ConfigOverrides, LaunchConfig};
use launchpad_core::port::HealthProbe;
use launchpad_infra_system::health_probe_impl::DEFAULT_HEALTH_TIMEOUT;
use launchpad_infra_system::{HttpHealthProbe, TokioProcessSpawner};

use logging::LogFormat;
use output::LaunchMode;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "launchpad")]
#[command(about = "Start the shape generation API server and UI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log output format
    #[arg(long, env = "LAUNCHPAD_LOG_FORMAT", value_enum, default_value = "pretty", global = true)]
    log_format: LogFormat,

    /// Directory the services are started from (project root)
    #[arg(long, env = "LAUNCHPAD_PROJECT_DIR", global = true)]
    project_dir: Option<PathBuf>,
}

/// API server flags (override API_HOST / API_PORT)
#[derive(Args, Debug, Default)]
struct ApiArgs {
    /// Interface the API server binds to
    #[arg(long)]
    host: Option<String>,

    /// Port the API server binds to
    #[arg(long)]
    port: Option<String>,
}

/// UI server flags (override UI_PORT / API_URL / START_BACKEND)
#[derive(Args, Debug, Default)]
struct UiArgs {
    /// Port the UI server binds to
    #[arg(long)]
    ui_port: Option<String>,

    /// Base URL the UI uses to reach the API server
    #[arg(long)]
    api_url: Option<String>,

    /// Let the UI start its own API server
    #[arg(long)]
    start_backend: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server, then the UI in the foreground
    All {
        #[command(flatten)]
        api: ApiArgs,

        #[command(flatten)]
        ui: UiArgs,

        /// Poll the health endpoint instead of a fixed grace period (optional attempt count)
        #[arg(long, num_args = 0..=1, default_missing_value = "60")]
        wait_healthy: Option<u32>,
    },

    /// Start only the API server and keep it in the foreground
    Api {
        #[command(flatten)]
        api: ApiArgs,

        /// Poll the health endpoint instead of a fixed grace period (optional attempt count)
        #[arg(long, num_args = 0..=1, default_missing_value = "60")]
        wait_healthy: Option<u32>,
    },

    /// Start only the UI, pointed at an existing API server
    Ui {
        #[command(flatten)]
        ui: UiArgs,
    },

    /// Print the resolved configuration and service command lines
    Config {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Query the API server's health endpoint once
    Health {
        /// API base URL (default: resolved API URL)
        #[arg(long)]
        api_url: Option<String>,
    },
}

fn overrides(api: &ApiArgs, ui: &UiArgs, wait_healthy: Option<u32>) -> ConfigOverrides {
    ConfigOverrides {
        api_host: api.host.clone(),
        api_port: api.port.clone(),
        ui_port: ui.ui_port.clone(),
        api_url: ui.api_url.clone(),
        start_backend: ui.start_backend,
        wait_healthy,
    }
}

/// env (.env included) > defaults, then command-line flags on top
fn resolve_config(overrides: ConfigOverrides) -> Result<LaunchConfig> {
    let config = LaunchConfig::from_env().context("Invalid launcher configuration")?;
    Ok(config.apply(overrides))
}

#[tokio::main]
async fn main() -> ExitCode {
    // 1. Load .env before anything reads the environment (real env vars win)
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    // 2. Initialize logging
    let _log_guard = match logging::init_logging(cli.log_format) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    match dotenv {
        Ok(path) => info!(path = %path.display(), "Loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(error = %e, ".env not loaded (using process environment)"),
    }

    info!("Launchpad v{} starting...", VERSION);

    // 3. Run the command
    match run(cli).await {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            error!(error = ?e, "Launch failed");
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::All {
            api,
            ui,
            wait_healthy,
        } => {
            let config = resolve_config(overrides(&api, &ui, wait_healthy))?;
            launch(LaunchMode::All, config, cli.project_dir).await
        }
        Commands::Api { api, wait_healthy } => {
            let config = resolve_config(overrides(&api, &UiArgs::default(), wait_healthy))?;
            launch(LaunchMode::Api, config, cli.project_dir).await
        }
        Commands::Ui { ui } => {
            let config = resolve_config(overrides(&ApiArgs::default(), &ui, None))?;
            launch(LaunchMode::Ui, config, cli.project_dir).await
        }
        Commands::Config { json } => {
            let config = resolve_config(ConfigOverrides::default())?;
            output::print_config(&config, json)?;
            Ok(0)
        }
        Commands::Health { api_url } => {
            let config = resolve_config(ConfigOverrides {
                api_url,
                ..Default::default()
            })?;
            check_health(&config).await
        }
    }
}

async fn launch(mode: LaunchMode, config: LaunchConfig, project_dir: Option<PathBuf>) -> Result<i32> {
    let interrupts = Interrupts::install()?;
    output::print_banner(mode, &config);

    // 4. Setup dependencies (DI wiring)
    let mut spawner = TokioProcessSpawner::new();
    if let Some(dir) = project_dir {
        info!(dir = %dir.display(), "Starting services from project directory");
        spawner = spawner.with_working_dir(dir);
    }
    let health_probe =
        HttpHealthProbe::new(DEFAULT_HEALTH_TIMEOUT).context("Failed to create HTTP client")?;
    let launcher = Launcher::new(config, Arc::new(spawner), Arc::new(health_probe));

    // 5. Interrupts become a shutdown request for the launcher
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    tokio::spawn(interrupts.forward(shutdown_tx));

    // 6. Run until the foreground process exits, startup fails or we are interrupted
    let report = match mode {
        LaunchMode::All => launcher.run_all(shutdown_rx).await,
        LaunchMode::Api => launcher.run_api(shutdown_rx).await,
        LaunchMode::Ui => launcher.run_ui(shutdown_rx).await,
    }
    .context("Launch aborted")?;

    info!(
        outcome = ?report.outcome,
        phase = %report.final_phase(),
        "Launch finished"
    );
    output::print_outcome(&report);

    Ok(report.outcome.exit_code())
}

/// Ctrl+C (plus SIGTERM on unix), registered before any child is started
struct Interrupts {
    #[cfg(unix)]
    sigint: tokio::signal::unix::Signal,
    #[cfg(unix)]
    sigterm: tokio::signal::unix::Signal,
    #[cfg(windows)]
    ctrl_c: tokio::signal::windows::CtrlC,
}

impl Interrupts {
    /// Install the handlers now; signals arriving before `forward` runs are kept
    fn install() -> Result<Self> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            Ok(Self {
                sigint: signal(SignalKind::interrupt())
                    .context("Failed to install Ctrl+C handler")?,
                sigterm: signal(SignalKind::terminate())
                    .context("Failed to install SIGTERM handler")?,
            })
        }

        #[cfg(windows)]
        {
            Ok(Self {
                ctrl_c: tokio::signal::windows::ctrl_c()
                    .context("Failed to install Ctrl+C handler")?,
            })
        }
    }

    /// Wait for the first interrupt and signal shutdown
    async fn forward(mut self, shutdown_tx: ShutdownSender) {
        #[cfg(unix)]
        tokio::select! {
            _ = self.sigint.recv() => {}
            _ = self.sigterm.recv() => {}
        }

        #[cfg(windows)]
        self.ctrl_c.recv().await;

        info!("Shutdown signal received");
        shutdown_tx.shutdown();
    }
}

async fn check_health(config: &LaunchConfig) -> Result<i32> {
    let url = config.derived_api_url();
    let probe = HttpHealthProbe::new(DEFAULT_HEALTH_TIMEOUT).context("Failed to create HTTP client")?;

    match probe.check(&url).await {
        Ok(report) => {
            output::print_health(&url, &report);
            Ok(0)
        }
        Err(e) => {
            warn!(url = %url, error = %e, "Health check failed");
            output::print_unreachable(&url, &e);
            Ok(1)
        }
    }
}
