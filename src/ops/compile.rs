//! Implementation of `motive-build compile`.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::builder::native::NativeBuilder;
use crate::builder::plan::BuildPlan;
use crate::builder::progress::BuildProgress;
use crate::builder::BuildContext;
use crate::core::library::LinkArgs;
use crate::ops::link_args::{engine_include_dirs, engine_lib_dirs};
use crate::util::config::Config;
use crate::util::fs::write_string;
use crate::util::shell::{Shell, Status};

/// Name of the compilation database written at the root.
pub const COMPILE_COMMANDS_FILE: &str = "compile_commands.json";

/// Options for compiling and linking the engine.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Write `compile_commands.json` before compiling.
    pub emit_compile_commands: bool,
}

/// Compile every engine unit, then link the runtime and the executables.
///
/// Returns the plan that was built.
pub fn compile_and_link(
    ctx: &BuildContext,
    config: &Config,
    link_args: &LinkArgs,
    opts: &CompileOptions,
    shell: &Shell,
) -> Result<BuildPlan> {
    let plan = BuildPlan::discover(&ctx.root, &config.engine, ctx.toolchain())?.with_libraries(link_args);
    let include_dirs = engine_include_dirs(&ctx.root, &config.engine);
    let lib_dirs = engine_lib_dirs(&ctx.root, &config.engine);

    let builder = NativeBuilder::new(ctx)?.with_rpath(config.engine.rpath);

    if opts.emit_compile_commands {
        let path = ctx.root.root().join(COMPILE_COMMANDS_FILE);
        emit_compile_commands(&builder, &plan, &include_dirs, &path)?;
        tracing::info!("wrote {}", path.display());
    }

    shell.status(
        Status::Compiling,
        format!(
            "{} unit(s), {} runtime, {} worker(s)",
            plan.compile_count(),
            plan.runtime_kind().as_str(),
            ctx.jobs
        ),
    );

    let bar = shell.progress(
        (plan.compile_count() + plan.link_count()) as u64,
        "compiling",
    );
    let progress = BuildProgress::new(plan.compile_count(), plan.link_count()).with_bar(bar);

    let result = builder
        .compile_all(&plan, &include_dirs, &progress)
        .and_then(|()| {
            shell.status(Status::Linking, ctx.root.display(&plan.runtime.path));
            builder.link_runtime(&plan, &lib_dirs, &progress)
        })
        .and_then(|()| builder.link_executables(&plan, &lib_dirs, &progress));
    progress.finish();
    result?;

    for exe in &plan.executables {
        shell.status(Status::Finished, ctx.root.display(&exe.path));
    }

    if ctx.settings.cxxflags.iter().any(|f| f == "-g") {
        for exe in &plan.executables {
            tracing::debug!("debug with: gdb -ex run -ex bt --args {}", exe.path.display());
        }
    }

    Ok(plan)
}

/// Write a compilation database for the planned units.
pub fn emit_compile_commands(
    builder: &NativeBuilder<'_>,
    plan: &BuildPlan,
    include_dirs: &[PathBuf],
    path: &Path,
) -> Result<()> {
    let commands: Vec<CompileCommand> = plan
        .units
        .iter()
        .map(|unit| {
            let spec = builder
                .toolchain()
                .compile_command(&builder.compile_input(unit, include_dirs));

            let mut arguments = Vec::with_capacity(spec.args.len() + 1);
            arguments.push(spec.program.display().to_string());
            arguments.extend(spec.args);

            CompileCommand {
                directory: unit
                    .source
                    .parent()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| ".".to_string()),
                file: unit.source.display().to_string(),
                arguments,
                output: Some(unit.object.display().to_string()),
            }
        })
        .collect();

    let json = serde_json::to_string_pretty(&commands)?;
    write_string(path, &json)
}

/// compile_commands.json entry.
#[derive(Debug, Serialize, Deserialize)]
struct CompileCommand {
    directory: String,
    file: String,
    arguments: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
}
