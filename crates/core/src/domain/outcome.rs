// Launch Outcome -> process exit code

use super::lifecycle::LaunchPhase;

/// Exit code when the API server did not survive the grace period
pub const STARTUP_FAILURE_EXIT_CODE: i32 = 1;

/// Exit code after an interrupt (128 + SIGINT)
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// API process was not alive after the grace period; UI never started
    StartupFailed,
    /// Foreground process exited on its own with this code
    Exited { code: i32 },
    /// Interrupt received before the foreground process exited
    Interrupted,
}

impl LaunchOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            LaunchOutcome::StartupFailed => STARTUP_FAILURE_EXIT_CODE,
            LaunchOutcome::Exited { code } => *code,
            LaunchOutcome::Interrupted => INTERRUPTED_EXIT_CODE,
        }
    }
}

/// What a launch did: its outcome and the phases it went through
#[derive(Debug, Clone)]
pub struct LaunchReport {
    pub outcome: LaunchOutcome,
    pub phases: Vec<LaunchPhase>,
}

impl LaunchReport {
    pub fn final_phase(&self) -> LaunchPhase {
        self.phases.last().copied().unwrap_or(LaunchPhase::Idle)
    }

    pub fn visited(&self, phase: LaunchPhase) -> bool {
        self.phases.contains(&phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(LaunchOutcome::StartupFailed.exit_code(), 1);
        assert_eq!(LaunchOutcome::Exited { code: 0 }.exit_code(), 0);
        assert_eq!(LaunchOutcome::Exited { code: 3 }.exit_code(), 3);
        assert_eq!(LaunchOutcome::Interrupted.exit_code(), 130);
    }
}
