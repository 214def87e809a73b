//! Native C++ compiler driver.
//!
//! Compiles the planned units on a bounded pool, then links the runtime
//! library and the executables.
//!
//! Failure policy:
//! - Compile: once a unit fails, no unit after it in discovery order starts;
//!   units before it still run. The error is the first failing unit in
//!   discovery order, whatever the job count.
//! - Runtime link: fatal, and no executable is attempted.
//! - Executable links: independent. All are attempted and every failure is
//!   reported together.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use rayon::prelude::*;

use crate::builder::context::BuildContext;
use crate::builder::plan::BuildPlan;
use crate::builder::progress::BuildProgress;
use crate::builder::toolchain::{ArchiveInput, CommandSpec, CompileInput, LinkInput, Toolchain};
use crate::core::error::{BuildError, LinkFailure};
use crate::core::library::link_arguments;
use crate::core::unit::{BuildArtifact, RuntimeKind, SourceUnit};
use crate::util::fs::ensure_dir;

/// Native C++ builder.
pub struct NativeBuilder<'a> {
    ctx: &'a BuildContext,
    pool: rayon::ThreadPool,
    rpath: bool,
}

impl<'a> NativeBuilder<'a> {
    /// Create a builder with a pool of `ctx.jobs` workers.
    pub fn new(ctx: &'a BuildContext) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(ctx.jobs)
            .thread_name(|i| format!("motive-build-{}", i))
            .build()
            .context("failed to start the build worker pool")?;

        Ok(NativeBuilder {
            ctx,
            pool,
            rpath: false,
        })
    }

    /// Embed the output directory as rpath when the runtime is shared.
    pub fn with_rpath(mut self, rpath: bool) -> Self {
        self.rpath = rpath;
        self
    }

    pub fn toolchain(&self) -> &dyn Toolchain {
        self.ctx.toolchain()
    }

    /// Compile input for one unit.
    pub fn compile_input(&self, unit: &SourceUnit, include_dirs: &[PathBuf]) -> CompileInput {
        CompileInput {
            source: unit.source.clone(),
            output: unit.object.clone(),
            std: Some(self.ctx.settings.std.clone()),
            include_dirs: include_dirs.to_vec(),
            cflags: self.ctx.compile_flags(),
        }
    }

    /// Compile every unit of the plan.
    pub fn compile_all(
        &self,
        plan: &BuildPlan,
        include_dirs: &[PathBuf],
        progress: &BuildProgress,
    ) -> Result<()> {
        ensure_dir(&self.ctx.root.obj_dir())?;

        tracing::info!(
            "compiling {} unit(s) with {} worker(s)",
            plan.units.len(),
            self.ctx.jobs
        );

        // Index of the earliest unit known to have failed.
        let first_failed = AtomicUsize::new(usize::MAX);
        let results: Vec<Option<Result<(), BuildError>>> = self.pool.install(|| {
            plan.units
                .par_iter()
                .enumerate()
                .map(|(index, unit)| {
                    if index > first_failed.load(Ordering::SeqCst) {
                        return None;
                    }
                    let result = self.compile(unit, include_dirs);
                    if result.is_err() {
                        first_failed.fetch_min(index, Ordering::SeqCst);
                    }
                    progress.compiled(&self.ctx.root.display(&unit.source));
                    Some(result)
                })
                .collect()
        });

        // Results are in discovery order.
        for result in results.into_iter().flatten() {
            result?;
        }

        Ok(())
    }

    fn compile(&self, unit: &SourceUnit, include_dirs: &[PathBuf]) -> Result<(), BuildError> {
        let spec = self
            .ctx
            .toolchain()
            .compile_command(&self.compile_input(unit, include_dirs));
        let cmd = spec.to_process();

        tracing::debug!(
            "compiling {} -> {}",
            unit.source.display(),
            unit.object.display()
        );

        let output = self
            .ctx
            .executor()
            .run(&cmd)
            .map_err(|e| cmd.spawn_error(e))?;

        if !output.success() {
            return Err(BuildError::CompileFailed {
                source_file: unit.source.clone(),
                command: cmd.display_command(),
                code: output.code,
                stderr: output.stderr,
            });
        }

        Ok(())
    }

    /// Archive or link the runtime library.
    pub fn link_runtime(
        &self,
        plan: &BuildPlan,
        lib_dirs: &[PathBuf],
        progress: &BuildProgress,
    ) -> Result<()> {
        ensure_dir(self.ctx.root.out_dir())?;

        let runtime = &plan.runtime;
        let spec = match plan.runtime_kind() {
            RuntimeKind::Static => self.ctx.toolchain().archive_command(&ArchiveInput {
                objects: runtime.objects.clone(),
                output: runtime.path.clone(),
            }),
            RuntimeKind::Dynamic => self.ctx.toolchain().link_shared_command(&LinkInput {
                objects: runtime.objects.clone(),
                output: runtime.path.clone(),
                lib_dirs: lib_dirs.to_vec(),
                link_args: link_arguments(&runtime.libraries),
                ldflags: self.ctx.link_flags(),
            }),
        };

        // A stale archive would keep members of deleted units.
        if plan.runtime_kind() == RuntimeKind::Static && runtime.path.exists() {
            std::fs::remove_file(&runtime.path)
                .with_context(|| format!("failed to remove {}", runtime.path.display()))?;
        }

        self.run_link(&runtime_label(runtime), spec)
            .map_err(|failure| BuildError::LinkFailed {
                failures: vec![failure],
            })?;

        progress.linked(&runtime_label(runtime));
        Ok(())
    }

    /// Link every executable against the libraries it carries.
    pub fn link_executables(
        &self,
        plan: &BuildPlan,
        lib_dirs: &[PathBuf],
        progress: &BuildProgress,
    ) -> Result<()> {
        let failures: Vec<LinkFailure> = self.pool.install(|| {
            plan.executables
                .par_iter()
                .filter_map(|exe| {
                    let (dirs, args, ldflags) = self.executable_link_line(plan, lib_dirs, exe);
                    let spec = self.ctx.toolchain().link_exe_command(&LinkInput {
                        objects: exe.objects.clone(),
                        output: exe.path.clone(),
                        lib_dirs: dirs,
                        link_args: args,
                        ldflags,
                    });
                    let result = self.run_link(&exe.name, spec);
                    progress.linked(&exe.name);
                    result.err()
                })
                .collect()
        });

        if !failures.is_empty() {
            return Err(BuildError::LinkFailed { failures }.into());
        }

        Ok(())
    }

    /// Search dirs, libraries and flags for executables.
    ///
    /// The runtime always precedes the resolved libraries so the linker sees
    /// its undefined symbols before the archives that satisfy them.
    fn executable_link_line(
        &self,
        plan: &BuildPlan,
        lib_dirs: &[PathBuf],
        exe: &BuildArtifact,
    ) -> (Vec<PathBuf>, Vec<String>, Vec<String>) {
        let out_dir = self.ctx.root.out_dir().to_path_buf();
        let mut dirs = Vec::new();
        let mut args = Vec::new();
        let mut ldflags = self.ctx.link_flags();

        match plan.runtime_kind() {
            RuntimeKind::Static => {
                args.push(plan.runtime.path.display().to_string());
            }
            RuntimeKind::Dynamic => {
                dirs.push(out_dir.clone());
                args.push(format!("-l{}", plan.runtime.name));
                if self.rpath {
                    ldflags.push(format!("-Wl,-rpath,{}", out_dir.display()));
                }
            }
        }

        dirs.extend(lib_dirs.iter().cloned());
        args.extend(link_arguments(&exe.libraries));

        (dirs, args, ldflags)
    }

    fn run_link(&self, target: &str, spec: CommandSpec) -> Result<(), LinkFailure> {
        let cmd = spec.to_process();
        tracing::debug!("linking {}", target);

        let failure = |code, stderr| LinkFailure {
            target: target.to_string(),
            command: cmd.display_command(),
            code,
            stderr,
        };

        match self.ctx.executor().run(&cmd) {
            Ok(output) if output.success() => Ok(()),
            Ok(output) => Err(failure(output.code, output.stderr)),
            Err(e) => Err(failure(None, e.to_string())),
        }
    }
}

fn runtime_label(runtime: &BuildArtifact) -> String {
    runtime
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| runtime.name.clone())
}
