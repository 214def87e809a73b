//! Engine compilation units and the artifacts they form.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::library::LibraryReference;

/// What a source unit is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitRole {
    /// Member of the runtime library.
    Library,
    /// `main` of one executable.
    EntryPoint,
}

/// One source file and the object it compiles to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    pub source: PathBuf,
    pub object: PathBuf,
    pub role: UnitRole,
}

/// Runtime library flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeKind {
    /// `ar` archive; executables re-embed every resolved dependency.
    #[default]
    Static,
    /// Shared object linked against the resolved dependencies; executables
    /// link it directly.
    Dynamic,
}

impl RuntimeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeKind::Static => "static",
            RuntimeKind::Dynamic => "dynamic",
        }
    }
}

impl FromStr for RuntimeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "static" => Ok(RuntimeKind::Static),
            "dynamic" | "shared" => Ok(RuntimeKind::Dynamic),
            _ => Err(format!(
                "invalid runtime kind '{}'; expected 'static' or 'dynamic'",
                s
            )),
        }
    }
}

/// Kind of a produced artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Runtime(RuntimeKind),
    Executable,
}

/// A runtime library or an executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifact {
    pub name: String,
    pub kind: ArtifactKind,
    pub path: PathBuf,
    /// Objects this artifact owns.
    pub objects: Vec<PathBuf>,
    /// Libraries linked into it, in link order. Empty for a static archive.
    pub libraries: Vec<LibraryReference>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_kind_from_str() {
        assert_eq!("static".parse::<RuntimeKind>(), Ok(RuntimeKind::Static));
        assert_eq!("shared".parse::<RuntimeKind>(), Ok(RuntimeKind::Dynamic));
        assert!("both".parse::<RuntimeKind>().is_err());
    }
}
