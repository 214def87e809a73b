//! Shared utilities

pub mod config;
pub mod context;
pub mod diagnostic;
pub mod fs;
pub mod hash;
pub mod process;
pub mod shell;

pub use config::Config;
pub use context::RootConfig;
pub use diagnostic::Diagnostic;
pub use shell::Shell;
