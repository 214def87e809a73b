//! Core data structures for motive-build.
//!
//! This module contains the foundational types used throughout the build:
//! - Dependencies and their build recipes
//! - Optional features and probe results
//! - Resolved libraries and link arguments
//! - Engine compilation units and artifacts
//! - The fatal error taxonomy

pub mod dependency;
pub mod error;
pub mod feature;
pub mod library;
pub mod unit;

pub use dependency::{BuildRecipe, Dependency, FetchPolicy, InstallMode, RevisionState};
pub use error::{BuildError, LinkFailure};
pub use feature::{FeatureFlag, FeatureReport, FeatureSpec, FeatureStatus};
pub use library::{LibraryReference, LinkArgs, ResolutionTier};
pub use unit::{BuildArtifact, RuntimeKind, SourceUnit};
