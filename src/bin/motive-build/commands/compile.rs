//! `motive-build compile` command

use anyhow::Result;

use super::Session;
use crate::cli::{CompileArgs, GlobalArgs};
use motive_build::ops::{build, BuildOptions, CompileOptions, HostEnv};

pub fn execute(args: CompileArgs, global: &GlobalArgs) -> Result<()> {
    run(args, global, false)
}

/// Shared by `compile` and `build`, which differ only in bootstrapping.
pub(crate) fn run(args: CompileArgs, global: &GlobalArgs, bootstrap: bool) -> Result<()> {
    let mut session = Session::load(global)?;
    if let Some(runtime) = args.runtime {
        session.config.engine.runtime = runtime;
    }
    let ctx = session.build_context(args.jobs)?;

    let opts = BuildOptions {
        bootstrap,
        compile: CompileOptions {
            emit_compile_commands: args.emit_compile_commands,
        },
    };

    let report = build(&ctx, &session.config, &HostEnv::capture(), &opts, &session.shell)?;

    for exe in &report.plan.executables {
        eprintln!("    {}", exe.path.display());
    }

    Ok(())
}
