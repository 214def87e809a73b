//! motive-build - dependency bootstrap and native build orchestrator for the
//! Motive engine
//!
//! This crate provides the core library functionality: ensuring and building
//! third-party dependencies, probing optional features, resolving link
//! arguments, compiling shaders, and compiling and linking the engine.

pub mod builder;
pub mod core;
pub mod ops;
pub mod resolver;
pub mod sources;
pub mod util;

/// Test utilities and mocks for motive-build unit tests.
///
/// This module is only available when compiling with `--cfg test`. It
/// provides a mock process executor and on-disk fixtures.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{BuildError, Dependency, FeatureReport, LinkArgs};
pub use resolver::LibraryResolver;
pub use util::context::RootConfig;
