//! High-level operations.
//!
//! This module contains the implementation of motive-build commands.

pub mod bootstrap;
pub mod compile;
pub mod link_args;
pub mod pipeline;
pub mod probe;
pub mod shaders;

pub use bootstrap::{bootstrap, BootstrapReport, DependencyOutcome};
pub use compile::{compile_and_link, CompileOptions, COMPILE_COMMANDS_FILE};
pub use link_args::{engine_include_dirs, engine_lib_dirs, resolve_link_args};
pub use pipeline::{build, BuildOptions, BuildReport};
pub use probe::{print_feature_report, FeatureProber, HostEnv};
pub use shaders::compile_shaders;
