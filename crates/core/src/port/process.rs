// Process Port
// Abstraction over spawning service processes and handling their children

use crate::domain::ServiceCommand;
use async_trait::async_trait;
use thiserror::Error;

/// How a child process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildExit {
    pub code: Option<i32>,
    /// Terminating signal (unix only)
    pub signal: Option<i32>,
}

impl ChildExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Shell-style exit code: the code, else 128 + signal, else 1
    pub fn exit_code(&self) -> i32 {
        match (self.code, self.signal) {
            (Some(code), _) => code,
            (None, Some(signal)) => 128 + signal,
            (None, None) => 1,
        }
    }
}

/// Process errors
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Spawn failed for '{program}': {reason}")]
    SpawnFailed { program: String, reason: String },

    #[error("Process is not running")]
    NotRunning,

    #[error("Signal delivery failed: {0}")]
    Signal(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// A started child process
#[async_trait]
pub trait ChildProcess: Send {
    /// OS process id; `None` once the child has been reaped
    fn pid(&self) -> Option<u32>;

    /// Non-destructive liveness check (never signals the process)
    fn is_alive(&mut self) -> bool;

    /// Wait for the child to exit. Cancel-safe.
    async fn wait(&mut self) -> Result<ChildExit, ProcessError>;

    /// Request termination without waiting for it to complete
    ///
    /// # Errors
    /// - ProcessError::NotRunning if the process already exited
    /// - ProcessError::Signal if the request could not be delivered
    fn terminate(&mut self) -> Result<(), ProcessError>;
}

/// Starts service processes in the background
///
/// Implementations:
/// - TokioProcessSpawner: real OS processes
/// - MockSpawner: scripted children for tests
pub trait ProcessSpawner: Send + Sync {
    /// Start `command`; must not block on the child
    fn spawn(&self, command: &ServiceCommand) -> Result<Box<dyn ChildProcess>, ProcessError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::ServiceRole;
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    /// Mock child behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Runs until terminated
        Running,
        /// Exits on its own after the duration with the code
        ExitsAfter(Duration, i32),
    }

    #[derive(Debug)]
    struct MockChildState {
        behavior: MockBehavior,
        spawned_at: Instant,
        terminated: bool,
        terminate_calls: usize,
    }

    impl MockChildState {
        fn alive(&self) -> bool {
            if self.terminated {
                return false;
            }
            match self.behavior {
                MockBehavior::Running => true,
                MockBehavior::ExitsAfter(after, _) => self.spawned_at.elapsed() < after,
            }
        }

        fn exit(&self) -> ChildExit {
            match self.behavior {
                MockBehavior::ExitsAfter(_, code) if !self.terminated => ChildExit {
                    code: Some(code),
                    signal: None,
                },
                // SIGTERM
                _ => ChildExit {
                    code: None,
                    signal: Some(15),
                },
            }
        }
    }

    /// Mock child process; clone the monitor before handing the child away
    pub struct MockChild {
        pid: u32,
        state: Arc<Mutex<MockChildState>>,
    }

    /// Read-only view of a MockChild's state after it was moved
    #[derive(Clone)]
    pub struct MockChildMonitor {
        state: Arc<Mutex<MockChildState>>,
    }

    impl MockChild {
        pub fn new(pid: u32, behavior: MockBehavior) -> (Self, MockChildMonitor) {
            let state = Arc::new(Mutex::new(MockChildState {
                behavior,
                spawned_at: Instant::now(),
                terminated: false,
                terminate_calls: 0,
            }));
            let monitor = MockChildMonitor {
                state: Arc::clone(&state),
            };
            (Self { pid, state }, monitor)
        }

        pub fn running(pid: u32) -> (Self, MockChildMonitor) {
            Self::new(pid, MockBehavior::Running)
        }

        pub fn exits_after(pid: u32, after: Duration, code: i32) -> (Self, MockChildMonitor) {
            Self::new(pid, MockBehavior::ExitsAfter(after, code))
        }
    }

    impl MockChildMonitor {
        pub fn is_alive(&self) -> bool {
            self.state.lock().unwrap().alive()
        }

        pub fn was_terminated(&self) -> bool {
            self.state.lock().unwrap().terminated
        }

        pub fn terminate_calls(&self) -> usize {
            self.state.lock().unwrap().terminate_calls
        }
    }

    #[async_trait]
    impl ChildProcess for MockChild {
        fn pid(&self) -> Option<u32> {
            Some(self.pid)
        }

        fn is_alive(&mut self) -> bool {
            self.state.lock().unwrap().alive()
        }

        async fn wait(&mut self) -> Result<ChildExit, ProcessError> {
            loop {
                {
                    let state = self.state.lock().unwrap();
                    if !state.alive() {
                        return Ok(state.exit());
                    }
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        }

        fn terminate(&mut self) -> Result<(), ProcessError> {
            let mut state = self.state.lock().unwrap();
            state.terminate_calls += 1;
            if !state.alive() {
                return Err(ProcessError::NotRunning);
            }
            state.terminated = true;
            Ok(())
        }
    }

    /// Mock spawner handing out scripted children per role
    #[derive(Default)]
    pub struct MockSpawner {
        children: Mutex<HashMap<ServiceRole, VecDeque<MockChild>>>,
        spawned: Mutex<Vec<(ServiceCommand, Instant)>>,
    }

    impl MockSpawner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a child for the next spawn of `role`
        pub fn with_child(self, role: ServiceRole, child: MockChild) -> Self {
            self.children
                .lock()
                .unwrap()
                .entry(role)
                .or_default()
                .push_back(child);
            self
        }

        /// Commands spawned so far, in order
        pub fn spawned(&self) -> Vec<ServiceCommand> {
            self.spawned
                .lock()
                .unwrap()
                .iter()
                .map(|(command, _)| command.clone())
                .collect()
        }

        /// When `role` was first spawned
        pub fn spawned_at(&self, role: ServiceRole) -> Option<Instant> {
            self.spawned
                .lock()
                .unwrap()
                .iter()
                .find(|(command, _)| command.role == role)
                .map(|(_, at)| *at)
        }

        pub fn spawned_role(&self, role: ServiceRole) -> Option<ServiceCommand> {
            self.spawned().into_iter().find(|c| c.role == role)
        }
    }

    impl ProcessSpawner for MockSpawner {
        fn spawn(&self, command: &ServiceCommand) -> Result<Box<dyn ChildProcess>, ProcessError> {
            let child = self
                .children
                .lock()
                .unwrap()
                .get_mut(&command.role)
                .and_then(VecDeque::pop_front)
                .ok_or_else(|| ProcessError::SpawnFailed {
                    program: command.program.clone(),
                    reason: format!("no scripted {} child", command.role),
                })?;
            self.spawned
                .lock()
                .unwrap()
                .push((command.clone(), Instant::now()));
            Ok(Box::new(child))
        }
    }
}
