// Launchpad Infrastructure - System Adapters
// Implements: ProcessSpawner, HealthProbe

pub mod health_probe_impl;
pub mod process_spawner;

pub use health_probe_impl::HttpHealthProbe;
pub use process_spawner::{pid_is_alive, TokioChild, TokioProcessSpawner};
