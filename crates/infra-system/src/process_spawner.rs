// Process spawner implementation
// reason: tokio::process for non-blocking children, nix for signal-zero probes and SIGTERM
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::ExitStatus;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use launchpad_core::domain::ServiceCommand;
use launchpad_core::port::{ChildExit, ChildProcess, ProcessError, ProcessSpawner};

/// Spawns service processes as OS children sharing the launcher's console
#[derive(Debug, Default, Clone)]
pub struct TokioProcessSpawner {
    working_dir: Option<PathBuf>,
}

impl TokioProcessSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run children from `dir` (the services resolve `src.*` modules relative to it)
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

impl ProcessSpawner for TokioProcessSpawner {
    fn spawn(&self, command: &ServiceCommand) -> Result<Box<dyn ChildProcess>, ProcessError> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        // stdout/stderr are inherited so service output reaches the console
        let child = cmd.spawn().map_err(|e| ProcessError::SpawnFailed {
            program: command.program.clone(),
            reason: e.to_string(),
        })?;

        info!(
            role = %command.role,
            pid = ?child.id(),
            program = %command.program,
            "Spawned child process"
        );

        Ok(Box::new(TokioChild {
            program: command.program.clone(),
            child,
        }))
    }
}

/// Handle to a child started by TokioProcessSpawner
pub struct TokioChild {
    program: String,
    child: Child,
}

#[async_trait]
impl ChildProcess for TokioChild {
    fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    fn is_alive(&mut self) -> bool {
        match self.child.try_wait() {
            Ok(Some(status)) => {
                debug!(program = %self.program, status = %status, "Child has exited");
                false
            }
            Ok(None) => true,
            Err(e) => {
                warn!(program = %self.program, error = %e, "try_wait failed, falling back to pid probe");
                self.child.id().map(pid_is_alive).unwrap_or(false)
            }
        }
    }

    async fn wait(&mut self) -> Result<ChildExit, ProcessError> {
        let status = self
            .child
            .wait()
            .await
            .map_err(|e| ProcessError::IoError(e.to_string()))?;
        Ok(to_child_exit(status))
    }

    fn terminate(&mut self) -> Result<(), ProcessError> {
        // an exited child (reaped or zombie) must not be signalled
        if !self.is_alive() {
            return Err(ProcessError::NotRunning);
        }
        let pid = self.child.id().ok_or(ProcessError::NotRunning)?;

        #[cfg(unix)]
        {
            request_termination(pid)
        }

        #[cfg(not(unix))]
        {
            debug!(pid = %pid, "Killing child process");
            self.child
                .start_kill()
                .map_err(|e| ProcessError::Signal(e.to_string()))
        }
    }
}

fn to_child_exit(status: ExitStatus) -> ChildExit {
    #[cfg(unix)]
    let signal = {
        use std::os::unix::process::ExitStatusExt;
        status.signal()
    };
    #[cfg(not(unix))]
    let signal = None;

    ChildExit {
        code: status.code(),
        signal,
    }
}

/// Send SIGTERM; a vanished process maps to `NotRunning`
#[cfg(unix)]
pub fn request_termination(pid: u32) -> Result<(), ProcessError> {
    use nix::errno::Errno;
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    info!(pid = %pid, "Sending SIGTERM");
    match kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        Ok(()) => Ok(()),
        Err(Errno::ESRCH) => Err(ProcessError::NotRunning),
        Err(e) => Err(ProcessError::Signal(format!("SIGTERM failed: {}", e))),
    }
}

/// Check if a process is still alive without affecting it
pub fn pid_is_alive(pid: u32) -> bool {
    #[cfg(unix)]
    {
        use nix::errno::Errno;
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        // Signal 0 checks if process exists without actually sending a signal;
        // EPERM means it exists but belongs to someone else
        match kill(Pid::from_raw(pid as i32), None::<Signal>) {
            Ok(()) => true,
            Err(Errno::EPERM) => true,
            Err(_) => false,
        }
    }

    #[cfg(windows)]
    {
        use std::process::Command;

        let filter = format!("PID eq {}", pid);
        let output = Command::new("tasklist")
            .args(["/FI", filter.as_str(), "/NH"])
            .output();

        if let Ok(output) = output {
            let output_str = String::from_utf8_lossy(&output.stdout);
            output_str.contains(&pid.to_string())
        } else {
            false
        }
    }
}
