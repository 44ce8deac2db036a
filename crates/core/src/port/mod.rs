// Port Layer - Interfaces for external dependencies

pub mod health;
pub mod process;

// Re-exports
pub use health::{HealthError, HealthProbe, HealthReport};
pub use process::{ChildExit, ChildProcess, ProcessError, ProcessSpawner};
