// Launchpad Core - Domain Logic & Ports
// NO infrastructure dependencies: processes and HTTP live behind ports

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{LaunchError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
