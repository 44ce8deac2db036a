// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid launch phase transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
}

/// Malformed launcher-internal setting.
///
/// Service-facing values (host, ports, URL) never produce this: they are
/// handed to the child process verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, DomainError>;
