//! Build planning.
//!
//! Discovers the engine's translation units, splits them into runtime
//! members and entry points, and names every object and artifact. Names are
//! a pure function of the source path, so workers never share an output.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::builder::toolchain::Toolchain;
use crate::core::error::BuildError;
use crate::core::library::LinkArgs;
use crate::core::unit::{ArtifactKind, BuildArtifact, RuntimeKind, SourceUnit, UnitRole};
use crate::util::config::EngineConfig;
use crate::util::context::RootConfig;
use crate::util::fs::files_with_extensions;

/// What to compile and link, in discovery order.
#[derive(Debug, Clone)]
pub struct BuildPlan {
    /// Every unit, sorted by source path.
    pub units: Vec<SourceUnit>,
    /// The runtime library, owning every library unit's object.
    pub runtime: BuildArtifact,
    /// One executable per entry point, in configured order.
    pub executables: Vec<BuildArtifact>,
}

impl BuildPlan {
    /// Scan the sources directory and plan the build.
    ///
    /// Every configured entry point must be present.
    pub fn discover(root: &RootConfig, engine: &EngineConfig, toolchain: &dyn Toolchain) -> Result<Self> {
        let sources = if root.sources_dir().is_dir() {
            files_with_extensions(root.sources_dir(), std::slice::from_ref(&engine.extension))?
        } else {
            Vec::new()
        };

        let obj_dir = root.obj_dir();
        let units: Vec<SourceUnit> = sources
            .into_iter()
            .map(|source| {
                let role = if is_entry_point(&source, engine) {
                    UnitRole::EntryPoint
                } else {
                    UnitRole::Library
                };
                SourceUnit {
                    object: object_path(&obj_dir, &source),
                    source,
                    role,
                }
            })
            .collect();

        let mut executables = Vec::new();
        for entry in &engine.entry_points {
            let unit = units
                .iter()
                .find(|u| u.role == UnitRole::EntryPoint && file_name(&u.source) == Some(entry.as_str()))
                .ok_or_else(|| BuildError::MissingPrerequisite {
                    what: format!(
                        "entry point {} not found in {}",
                        entry,
                        root.sources_dir().display()
                    ),
                    remediation: vec![format!(
                        "add {} or remove it from `engine.entry_points`",
                        entry
                    )],
                })?;

            let name = stem(&unit.source);
            executables.push(BuildArtifact {
                path: root.out_dir().join(&name),
                name,
                kind: ArtifactKind::Executable,
                objects: vec![unit.object.clone()],
                libraries: Vec::new(),
            });
        }

        let runtime_file = match engine.runtime {
            RuntimeKind::Static => toolchain.static_lib_name(&engine.name),
            RuntimeKind::Dynamic => toolchain.shared_lib_name(&engine.name),
        };
        let runtime = BuildArtifact {
            name: engine.name.clone(),
            kind: ArtifactKind::Runtime(engine.runtime),
            path: root.out_dir().join(runtime_file),
            objects: units
                .iter()
                .filter(|u| u.role == UnitRole::Library)
                .map(|u| u.object.clone())
                .collect(),
            libraries: Vec::new(),
        };

        tracing::debug!(
            "planned {} unit(s), {} executable(s)",
            units.len(),
            executables.len()
        );

        Ok(BuildPlan {
            units,
            runtime,
            executables,
        })
    }

    /// Attach the resolved libraries to every artifact that links them.
    ///
    /// A static runtime is only archived, so it carries none.
    pub fn with_libraries(mut self, link_args: &LinkArgs) -> Self {
        for exe in &mut self.executables {
            exe.libraries = link_args.references.clone();
        }
        if self.runtime_kind() == RuntimeKind::Dynamic {
            self.runtime.libraries = link_args.references.clone();
        }
        self
    }

    /// Number of compile steps.
    pub fn compile_count(&self) -> usize {
        self.units.len()
    }

    /// Number of link steps, runtime included.
    pub fn link_count(&self) -> usize {
        self.executables.len() + 1
    }

    /// The runtime kind being built.
    pub fn runtime_kind(&self) -> RuntimeKind {
        match self.runtime.kind {
            ArtifactKind::Runtime(kind) => kind,
            ArtifactKind::Executable => RuntimeKind::Static,
        }
    }
}

fn is_entry_point(source: &Path, engine: &EngineConfig) -> bool {
    file_name(source).is_some_and(|name| engine.entry_points.iter().any(|e| e == name))
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `<obj_dir>/<stem>.o`
pub fn object_path(obj_dir: &Path, source: &Path) -> PathBuf {
    obj_dir.join(format!("{}.o", stem(source)))
}
