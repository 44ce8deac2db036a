// Child Guard
// Scoped owner of a started child: best-effort termination on every exit path

use tracing::{debug, info, warn};

use crate::domain::ServiceRole;
use crate::port::{ChildExit, ChildProcess, ProcessError};

pub struct ChildGuard {
    role: ServiceRole,
    child: Box<dyn ChildProcess>,
    released: bool,
}

impl ChildGuard {
    pub fn new(role: ServiceRole, child: Box<dyn ChildProcess>) -> Self {
        Self {
            role,
            child,
            released: false,
        }
    }

    pub fn role(&self) -> ServiceRole {
        self.role
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.pid()
    }

    pub fn is_alive(&mut self) -> bool {
        self.child.is_alive()
    }

    pub async fn wait(&mut self) -> Result<ChildExit, ProcessError> {
        self.child.wait().await
    }

    /// Request termination; never fails and may be called any number of times
    ///
    /// A child that is already gone is not an error. The request is not
    /// awaited: the process may still be exiting when this returns.
    pub fn terminate(&mut self) {
        self.released = true;
        match self.child.terminate() {
            Ok(()) => info!(role = %self.role, pid = ?self.child.pid(), "Termination requested"),
            Err(ProcessError::NotRunning) => {
                debug!(role = %self.role, "Process already exited, nothing to terminate")
            }
            Err(e) => warn!(role = %self.role, error = %e, "Termination request failed (ignored)"),
        }
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if !self.released {
            self.terminate();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::process::mocks::MockChild;
    use std::time::Duration;

    #[test]
    fn test_drop_terminates_running_child() {
        let (child, monitor) = MockChild::running(1);

        {
            let _guard = ChildGuard::new(ServiceRole::Api, Box::new(child));
        }

        assert!(monitor.was_terminated());
        assert_eq!(monitor.terminate_calls(), 1);
    }

    #[test]
    fn test_explicit_terminate_is_not_repeated_on_drop() {
        let (child, monitor) = MockChild::running(1);

        let mut guard = ChildGuard::new(ServiceRole::Api, Box::new(child));
        guard.terminate();
        drop(guard);

        assert_eq!(monitor.terminate_calls(), 1);
    }

    #[tokio::test]
    async fn test_terminate_absent_process_twice_is_silent() {
        let (child, monitor) = MockChild::exits_after(1, Duration::from_millis(1), 0);
        let mut guard = ChildGuard::new(ServiceRole::Api, Box::new(child));
        guard.wait().await.unwrap();

        guard.terminate();
        guard.terminate();

        assert_eq!(monitor.terminate_calls(), 2);
        assert!(!monitor.was_terminated());
    }
}
