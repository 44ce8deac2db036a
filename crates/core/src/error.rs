// Central Error Type for the Launcher

use thiserror::Error;

/// Application-level error type
///
/// A dead API server at the end of the grace period is NOT an error:
/// it is reported as `LaunchOutcome::StartupFailed`.
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::domain::ConfigError),

    #[error("Process error: {0}")]
    Process(#[from] crate::port::ProcessError),
}

/// Result type alias using LaunchError
pub type Result<T> = std::result::Result<T, LaunchError>;
