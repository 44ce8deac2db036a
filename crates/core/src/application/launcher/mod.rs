// Launcher - starts the API / UI services and supervises their coarse lifecycle

mod guard;
mod shutdown;

pub use guard::ChildGuard;
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};

use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::domain::{
    LaunchConfig, LaunchOutcome, LaunchPhase, LaunchReport, Lifecycle, ReadinessPolicy,
    ServiceCommand, ServiceRole,
};
use crate::error::Result;
use crate::port::{ChildExit, HealthProbe, ProcessError, ProcessSpawner};

/// Result of bringing the API server up
enum ApiStart {
    Ready(ChildGuard),
    Failed,
    Interrupted,
}

enum Readiness {
    Alive,
    Dead,
    Interrupted,
}

enum ForegroundEvent {
    Exited(std::result::Result<ChildExit, ProcessError>),
    Interrupted,
}

/// Launcher use case
///
/// One instance per invocation; the configuration is fixed at construction.
pub struct Launcher {
    config: LaunchConfig,
    spawner: Arc<dyn ProcessSpawner>,
    health_probe: Arc<dyn HealthProbe>,
}

impl Launcher {
    pub fn new(
        config: LaunchConfig,
        spawner: Arc<dyn ProcessSpawner>,
        health_probe: Arc<dyn HealthProbe>,
    ) -> Self {
        Self {
            config,
            spawner,
            health_probe,
        }
    }

    pub fn config(&self) -> &LaunchConfig {
        &self.config
    }

    /// Combined launch: API in the background, probe, then UI in the foreground
    ///
    /// The UI is told the explicit API URL if one was given, otherwise
    /// `http://localhost:<api port>`.
    pub async fn run_all(&self, mut shutdown: ShutdownToken) -> Result<LaunchReport> {
        let mut lifecycle = Lifecycle::new();

        if self.config.start_backend {
            warn!("start-backend is set for a combined launch; the UI will start its own API server too");
        }

        let mut api = match self.bring_up_api(&mut lifecycle, &mut shutdown).await? {
            ApiStart::Ready(api) => api,
            ApiStart::Failed => return Ok(report(LaunchOutcome::StartupFailed, lifecycle)),
            ApiStart::Interrupted => return Ok(report(LaunchOutcome::Interrupted, lifecycle)),
        };

        lifecycle.advance(LaunchPhase::UiRunning)?;
        let ui = ServiceCommand::ui(&self.config, &self.config.derived_api_url());
        // on error the API guard is dropped, which terminates the API server
        let outcome = self.run_foreground(&ui, &mut shutdown).await?;

        lifecycle.advance(LaunchPhase::ShuttingDown)?;
        api.terminate();
        lifecycle.advance(LaunchPhase::Terminated)?;

        Ok(report(outcome, lifecycle))
    }

    /// API-only launch: API probed, then kept in the foreground
    pub async fn run_api(&self, mut shutdown: ShutdownToken) -> Result<LaunchReport> {
        let mut lifecycle = Lifecycle::new();

        let mut api = match self.bring_up_api(&mut lifecycle, &mut shutdown).await? {
            ApiStart::Ready(api) => api,
            ApiStart::Failed => return Ok(report(LaunchOutcome::StartupFailed, lifecycle)),
            ApiStart::Interrupted => return Ok(report(LaunchOutcome::Interrupted, lifecycle)),
        };

        lifecycle.advance(LaunchPhase::ApiRunning)?;
        let outcome = self.supervise_foreground(&mut api, &mut shutdown).await?;

        lifecycle.advance(LaunchPhase::ShuttingDown)?;
        api.terminate();
        lifecycle.advance(LaunchPhase::Terminated)?;

        Ok(report(outcome, lifecycle))
    }

    /// UI-only launch against the configured API URL; API phases are skipped
    pub async fn run_ui(&self, mut shutdown: ShutdownToken) -> Result<LaunchReport> {
        let mut lifecycle = Lifecycle::new();

        lifecycle.advance(LaunchPhase::UiRunning)?;
        let ui = ServiceCommand::ui(&self.config, self.config.api_url());
        let outcome = self.run_foreground(&ui, &mut shutdown).await?;

        lifecycle.advance(LaunchPhase::ShuttingDown)?;
        lifecycle.advance(LaunchPhase::Terminated)?;

        Ok(report(outcome, lifecycle))
    }

    /// Start the API server in the background and wait for it per the readiness policy
    async fn bring_up_api(
        &self,
        lifecycle: &mut Lifecycle,
        shutdown: &mut ShutdownToken,
    ) -> Result<ApiStart> {
        lifecycle.advance(LaunchPhase::ApiStarting)?;

        let command = ServiceCommand::api(&self.config);
        info!(
            command = %command.command_line(),
            host = %self.config.api_host,
            port = %self.config.api_port,
            "Starting API server"
        );

        let mut api = match self.spawner.spawn(&command) {
            Ok(child) => ChildGuard::new(ServiceRole::Api, child),
            Err(e) => {
                error!(error = %e, "API server failed to start");
                lifecycle.advance(LaunchPhase::ApiFailed)?;
                return Ok(ApiStart::Failed);
            }
        };
        info!(pid = ?api.pid(), "API server started in background");

        lifecycle.advance(LaunchPhase::ApiProbing)?;
        match self.await_api_ready(&mut api, shutdown).await {
            Readiness::Alive => Ok(ApiStart::Ready(api)),
            Readiness::Dead => {
                lifecycle.advance(LaunchPhase::ApiFailed)?;
                Ok(ApiStart::Failed)
            }
            Readiness::Interrupted => {
                info!("Interrupted while waiting for the API server");
                lifecycle.advance(LaunchPhase::ShuttingDown)?;
                api.terminate();
                lifecycle.advance(LaunchPhase::Terminated)?;
                Ok(ApiStart::Interrupted)
            }
        }
    }

    async fn await_api_ready(&self, api: &mut ChildGuard, shutdown: &mut ShutdownToken) -> Readiness {
        match self.config.readiness {
            ReadinessPolicy::GracePeriod => {
                let grace_ms = self.config.grace_period.as_millis() as u64;
                info!(grace_ms, "Waiting before liveness check");
                if !pause(self.config.grace_period, shutdown).await {
                    return Readiness::Interrupted;
                }
                probe_liveness(api)
            }
            ReadinessPolicy::HealthPoll { interval, attempts } => {
                let url = self.config.derived_api_url();
                for attempt in 1..=attempts {
                    if !pause(interval, shutdown).await {
                        return Readiness::Interrupted;
                    }
                    if !api.is_alive() {
                        return probe_liveness(api);
                    }

                    let checked = tokio::select! {
                        checked = self.health_probe.check(&url) => Some(checked),
                        _ = shutdown.wait() => None,
                    };
                    match checked {
                        None => return Readiness::Interrupted,
                        Some(Ok(health)) => {
                            info!(
                                attempt,
                                status = %health.status,
                                is_ready = health.is_ready,
                                "API server answered health check"
                            );
                            return Readiness::Alive;
                        }
                        Some(Err(e)) => {
                            info!(attempt, attempts, error = %e, "Waiting for API server...")
                        }
                    }
                }
                warn!(attempts, "API server may not be fully started; continuing");
                probe_liveness(api)
            }
        }
    }

    async fn run_foreground(
        &self,
        command: &ServiceCommand,
        shutdown: &mut ShutdownToken,
    ) -> Result<LaunchOutcome> {
        info!(role = %command.role, command = %command.command_line(), "Starting foreground process");
        let child = self.spawner.spawn(command)?;
        let mut guard = ChildGuard::new(command.role, child);
        info!(role = %command.role, pid = ?guard.pid(), "Foreground process started");

        self.supervise_foreground(&mut guard, shutdown).await
    }

    /// Block until the child exits or an interrupt arrives
    async fn supervise_foreground(
        &self,
        child: &mut ChildGuard,
        shutdown: &mut ShutdownToken,
    ) -> Result<LaunchOutcome> {
        let event = tokio::select! {
            exit = child.wait() => ForegroundEvent::Exited(exit),
            _ = shutdown.wait() => ForegroundEvent::Interrupted,
        };

        match event {
            ForegroundEvent::Exited(exit) => {
                let exit = exit?;
                info!(
                    role = %child.role(),
                    code = ?exit.code,
                    signal = ?exit.signal,
                    "Foreground process exited"
                );
                Ok(LaunchOutcome::Exited {
                    code: exit.exit_code(),
                })
            }
            ForegroundEvent::Interrupted => {
                info!(role = %child.role(), "Interrupt received, stopping foreground process");
                child.terminate();
                Ok(LaunchOutcome::Interrupted)
            }
        }
    }
}

/// Sleep unless interrupted first; `false` means interrupted
async fn pause(duration: Duration, shutdown: &mut ShutdownToken) -> bool {
    tokio::select! {
        _ = sleep(duration) => true,
        _ = shutdown.wait() => false,
    }
}

/// One-shot, non-destructive liveness check
fn probe_liveness(api: &mut ChildGuard) -> Readiness {
    if api.is_alive() {
        info!(pid = ?api.pid(), "API server is alive");
        Readiness::Alive
    } else {
        error!("API server exited during startup; not starting anything else");
        Readiness::Dead
    }
}

fn report(outcome: LaunchOutcome, lifecycle: Lifecycle) -> LaunchReport {
    LaunchReport {
        outcome,
        phases: lifecycle.into_history(),
    }
}
