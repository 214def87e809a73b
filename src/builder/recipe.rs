//! Dependency build recipes.
//!
//! Each [`BuildRecipe`] expands into an ordered list of commands run inside
//! the dependency's tree. Installs go to the dependency's own prefix unless
//! it asks for a system-wide install, which is the only privileged step.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::builder::toolchain::{ArchiveInput, CompileInput, Toolchain};
use crate::core::dependency::{BuildRecipe, Dependency, InstallMode};
use crate::util::fs::{glob_files, write_string};
use crate::util::hash::Fingerprint;
use crate::util::process::ProcessBuilder;

/// File inside a dependency tree recording the last successful build.
pub const STAMP_FILE: &str = ".motive-build-stamp";

/// One command of a dependency build.
#[derive(Debug, Clone)]
pub struct RecipeStep {
    /// What the step does, for status output.
    pub label: String,
    pub command: ProcessBuilder,
    /// Runs under `sudo`.
    pub privileged: bool,
}

impl RecipeStep {
    fn new(label: impl Into<String>, command: ProcessBuilder) -> Self {
        RecipeStep {
            label: label.into(),
            command,
            privileged: false,
        }
    }
}

/// Inputs shared by every recipe expansion.
pub struct RecipeInputs<'a> {
    pub deps_dir: &'a Path,
    pub toolchain: &'a dyn Toolchain,
    /// Parallel make jobs.
    pub jobs: usize,
    /// Probed feature flags, appended when the dependency consumes them.
    pub feature_flags: &'a [String],
}

/// Expand a dependency's recipe into commands.
///
/// Archive sources containing glob metacharacters are expanded against the
/// working tree.
pub fn recipe_steps(dep: &Dependency, inputs: &RecipeInputs<'_>) -> Result<Vec<RecipeStep>> {
    let tree = dep.tree_dir(inputs.deps_dir);
    let prefix = dep.install_prefix(inputs.deps_dir);
    let make_jobs = format!("-j{}", inputs.jobs.max(1));

    match &dep.recipe {
        BuildRecipe::HeaderOnly => Ok(Vec::new()),

        BuildRecipe::Cmake { args } => {
            let build_dir = dep.build_dir(inputs.deps_dir);

            let mut configure = ProcessBuilder::new("cmake")
                .arg("-S")
                .arg(&tree)
                .arg("-B")
                .arg(&build_dir);
            if let Some(ref prefix) = prefix {
                configure = configure.arg(format!("-DCMAKE_INSTALL_PREFIX={}", prefix.display()));
            }
            configure = configure.args(args);

            let mut steps = vec![
                RecipeStep::new("configure", configure),
                RecipeStep::new("build", ProcessBuilder::new("make").arg(&make_jobs).cwd(&build_dir)),
            ];
            steps.extend(install_step(dep, &build_dir, &[]));
            Ok(steps)
        }

        BuildRecipe::Configure { args } => {
            let mut configure = ProcessBuilder::new(tree.join("configure")).cwd(&tree);
            if let Some(ref prefix) = prefix {
                configure = configure.arg(format!("--prefix={}", prefix.display()));
            }
            configure = configure.args(args);
            if dep.use_features {
                configure = configure.args(inputs.feature_flags);
            }

            let mut steps = vec![
                RecipeStep::new("configure", configure),
                RecipeStep::new("build", ProcessBuilder::new("make").arg(&make_jobs).cwd(&tree)),
            ];
            steps.extend(install_step(dep, &tree, &[]));
            Ok(steps)
        }

        BuildRecipe::Make { args } => {
            let prefix_arg: Vec<String> = prefix
                .iter()
                .map(|p| format!("PREFIX={}", p.display()))
                .collect();

            let build = ProcessBuilder::new("make")
                .arg(&make_jobs)
                .args(args)
                .args(&prefix_arg)
                .cwd(&tree);

            let mut extra = args.clone();
            extra.extend(prefix_arg);

            let mut steps = vec![RecipeStep::new("build", build)];
            steps.extend(install_step(dep, &tree, &extra));
            Ok(steps)
        }

        BuildRecipe::Archive {
            sources,
            std,
            output,
        } => {
            let mut steps = Vec::new();
            let mut objects = Vec::new();

            for source in expand_sources(&tree, sources)? {
                let object = source.with_extension("o");
                let spec = inputs.toolchain.compile_command(&CompileInput {
                    source: source.clone(),
                    output: object.clone(),
                    std: std.clone(),
                    ..Default::default()
                });
                steps.push(RecipeStep::new("compile", spec.to_process().cwd(&tree)));
                objects.push(object);
            }

            let archive = inputs.toolchain.archive_command(&ArchiveInput {
                objects,
                output: tree.join(output),
            });
            steps.push(RecipeStep::new("archive", archive.to_process().cwd(&tree)));
            Ok(steps)
        }
    }
}

fn expand_sources(tree: &Path, sources: &[String]) -> Result<Vec<PathBuf>> {
    let mut expanded = Vec::new();
    for source in sources {
        if source.contains(['*', '?', '[']) {
            expanded.extend(glob_files(tree, std::slice::from_ref(source))?);
        } else {
            expanded.push(tree.join(source));
        }
    }
    Ok(expanded)
}

fn install_step(dep: &Dependency, dir: &Path, extra: &[String]) -> Option<RecipeStep> {
    match dep.install {
        InstallMode::None => None,
        InstallMode::Prefix => Some(RecipeStep::new(
            "install",
            ProcessBuilder::new("make").arg("install").args(extra).cwd(dir),
        )),
        InstallMode::System => Some(RecipeStep {
            label: "install (system-wide)".to_string(),
            command: ProcessBuilder::new("sudo")
                .arg("make")
                .arg("install")
                .args(extra)
                .cwd(dir),
            privileged: true,
        }),
    }
}

/// Fingerprint of everything that decides how a dependency is built.
pub fn build_fingerprint(dep: &Dependency, feature_flags: &[String]) -> String {
    let mut fp = Fingerprint::new();
    fp.update_str(&dep.name);
    fp.update_str(&serde_json::to_string(&dep.recipe).unwrap_or_default());
    fp.update_str(&format!("{:?}", dep.install));
    fp.update_opt(dep.pin.as_deref());
    if dep.use_features {
        fp.update_strs(feature_flags.iter().map(String::as_str));
    }
    fp.finish()
}

fn stamp_path(dep: &Dependency, deps_dir: &Path) -> PathBuf {
    dep.tree_dir(deps_dir).join(STAMP_FILE)
}

/// The fingerprint stored by the last successful build, if any.
pub fn read_stamp(dep: &Dependency, deps_dir: &Path) -> Option<String> {
    std::fs::read_to_string(stamp_path(dep, deps_dir))
        .ok()
        .map(|s| s.trim().to_string())
}

/// Record a successful build.
pub fn write_stamp(dep: &Dependency, deps_dir: &Path, fingerprint: &str) -> Result<()> {
    write_string(&stamp_path(dep, deps_dir), &format!("{}\n", fingerprint))
}
