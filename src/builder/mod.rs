//! C++ build system.
//!
//! This module implements the engine's compiler driver and build planning,
//! plus the recipes that build third-party dependencies.

pub mod context;
pub mod native;
pub mod plan;
pub mod progress;
pub mod recipe;
pub mod toolchain;

pub use context::BuildContext;
pub use native::NativeBuilder;
pub use plan::BuildPlan;
pub use toolchain::{detect_toolchain, CommandSpec, GccToolchain, Toolchain};
