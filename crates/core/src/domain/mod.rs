// Domain Layer - Launch configuration, commands, lifecycle

pub mod command;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod outcome;

// Re-exports
pub use command::{ServiceCommand, ServiceRole};
pub use config::{ConfigOverrides, LaunchConfig, ReadinessPolicy};
pub use error::{ConfigError, DomainError};
pub use lifecycle::{LaunchPhase, Lifecycle};
pub use outcome::{LaunchOutcome, LaunchReport};
