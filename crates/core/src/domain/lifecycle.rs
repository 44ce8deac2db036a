// Launch Lifecycle State Machine
//
// idle -> api_starting -> api_probing -> {api_failed | ui_running | api_running}
//      -> shutting_down -> terminated
// UI-only launches go idle -> ui_running directly.

use super::error::{DomainError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchPhase {
    Idle,
    ApiStarting,
    ApiProbing,
    /// API process gone at the end of the grace period (terminal)
    ApiFailed,
    /// API-only launch: API is the foreground process
    ApiRunning,
    UiRunning,
    ShuttingDown,
    Terminated,
}

impl std::fmt::Display for LaunchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LaunchPhase::Idle => write!(f, "IDLE"),
            LaunchPhase::ApiStarting => write!(f, "API_STARTING"),
            LaunchPhase::ApiProbing => write!(f, "API_PROBING"),
            LaunchPhase::ApiFailed => write!(f, "API_FAILED"),
            LaunchPhase::ApiRunning => write!(f, "API_RUNNING"),
            LaunchPhase::UiRunning => write!(f, "UI_RUNNING"),
            LaunchPhase::ShuttingDown => write!(f, "SHUTTING_DOWN"),
            LaunchPhase::Terminated => write!(f, "TERMINATED"),
        }
    }
}

impl LaunchPhase {
    pub fn can_transition_to(self, next: LaunchPhase) -> bool {
        use LaunchPhase::*;
        matches!(
            (self, next),
            (Idle, ApiStarting)
                | (Idle, UiRunning)
                | (ApiStarting, ApiProbing)
                | (ApiStarting, ApiFailed)
                | (ApiProbing, ApiFailed)
                | (ApiProbing, ApiRunning)
                | (ApiProbing, UiRunning)
                // interrupted during the grace period
                | (ApiProbing, ShuttingDown)
                | (ApiRunning, ShuttingDown)
                | (UiRunning, ShuttingDown)
                | (ShuttingDown, Terminated)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, LaunchPhase::ApiFailed | LaunchPhase::Terminated)
    }
}

/// Current phase plus every phase visited, in order
#[derive(Debug, Clone)]
pub struct Lifecycle {
    history: Vec<LaunchPhase>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            history: vec![LaunchPhase::Idle],
        }
    }

    pub fn current(&self) -> LaunchPhase {
        // history always starts with Idle
        self.history.last().copied().unwrap_or(LaunchPhase::Idle)
    }

    pub fn history(&self) -> &[LaunchPhase] {
        &self.history
    }

    /// Move to `next`, rejecting transitions the state machine does not allow
    pub fn advance(&mut self, next: LaunchPhase) -> Result<()> {
        let current = self.current();
        if !current.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: current.to_string(),
                to: next.to_string(),
            });
        }
        tracing::debug!(from = %current, to = %next, "Launch phase transition");
        self.history.push(next);
        Ok(())
    }

    pub fn into_history(self) -> Vec<LaunchPhase> {
        self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LaunchPhase::*;

    #[test]
    fn test_combined_happy_path() {
        let mut lifecycle = Lifecycle::new();
        for phase in [ApiStarting, ApiProbing, UiRunning, ShuttingDown, Terminated] {
            lifecycle.advance(phase).unwrap();
        }

        assert_eq!(lifecycle.current(), Terminated);
        assert!(lifecycle.current().is_terminal());
        assert_eq!(lifecycle.history().len(), 6);
    }

    #[test]
    fn test_ui_only_skips_api_phases() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.advance(UiRunning).unwrap();
        lifecycle.advance(ShuttingDown).unwrap();
        lifecycle.advance(Terminated).unwrap();

        assert_eq!(lifecycle.history(), &[Idle, UiRunning, ShuttingDown, Terminated]);
    }

    #[test]
    fn test_api_failed_is_terminal() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.advance(ApiStarting).unwrap();
        lifecycle.advance(ApiProbing).unwrap();
        lifecycle.advance(ApiFailed).unwrap();

        let err = lifecycle.advance(UiRunning).unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidTransition {
                from: "API_FAILED".to_string(),
                to: "UI_RUNNING".to_string(),
            }
        );
        assert_eq!(lifecycle.current(), ApiFailed);
    }

    #[test]
    fn test_cannot_start_ui_before_probe() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.advance(ApiStarting).unwrap();

        assert!(lifecycle.advance(UiRunning).is_err());
        assert!(!Idle.can_transition_to(Terminated));
    }
}
