// Application Layer - Use Cases

pub mod launcher;

// Re-exports
pub use launcher::{shutdown_channel, ChildGuard, Launcher, ShutdownSender, ShutdownToken};
