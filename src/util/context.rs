//! Explicit root configuration.
//!
//! Every path the build touches is derived from one [`RootConfig`], which is
//! threaded through every phase. Nothing reads the process working directory
//! after the root has been established.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::config::PathsConfig;

/// Directory layout for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootConfig {
    root: PathBuf,
    deps_dir: PathBuf,
    sources_dir: PathBuf,
    shader_dir: PathBuf,
    out_dir: PathBuf,
}

impl RootConfig {
    /// Build the layout from a root directory and the configured paths.
    ///
    /// The root must exist; it is canonicalized so every derived path is
    /// absolute.
    pub fn new(root: &Path, paths: &PathsConfig) -> Result<Self> {
        let root = root
            .canonicalize()
            .with_context(|| format!("root directory not found: {}", root.display()))?;

        Ok(RootConfig {
            deps_dir: under(&root, &paths.deps),
            sources_dir: under(&root, &paths.sources),
            shader_dir: under(&root, &paths.shaders),
            out_dir: under(&root, &paths.out),
            root,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where dependency working trees live.
    pub fn deps_dir(&self) -> &Path {
        &self.deps_dir
    }

    /// Engine sources.
    pub fn sources_dir(&self) -> &Path {
        &self.sources_dir
    }

    pub fn shader_dir(&self) -> &Path {
        &self.shader_dir
    }

    /// Runtime library and executables.
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Object files.
    pub fn obj_dir(&self) -> PathBuf {
        self.out_dir.join("obj")
    }

    /// Resolve a deps-relative path. Absolute paths are returned unchanged.
    pub fn in_deps(&self, path: &Path) -> PathBuf {
        self.deps_dir.join(path)
    }

    /// Shorten a path for display.
    pub fn display(&self, path: &Path) -> String {
        crate::util::fs::relative_path(&self.root, path)
            .display()
            .to_string()
    }
}

/// `root.join(rel)` without `.` components, so `"."` is the root itself.
fn under(root: &Path, rel: &Path) -> PathBuf {
    let cleaned: PathBuf = rel
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();

    if cleaned.as_os_str().is_empty() {
        root.to_path_buf()
    } else {
        root.join(cleaned)
    }
}
