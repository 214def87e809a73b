//! Implementation of `motive-build shaders`.
//!
//! Every file in the shader directory with a recognized stage extension is
//! compiled to a binary beside it (`mesh.vert` -> `mesh.vert.spv`). The
//! first failure aborts.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::builder::BuildContext;
use crate::util::config::Config;
use crate::util::fs::files_with_extensions;
use crate::util::process::ProcessBuilder;
use crate::util::shell::{Shell, Status};

/// Binary produced for a shader source.
pub fn shader_output(source: &Path, extension: &str) -> PathBuf {
    let mut name = source.as_os_str().to_os_string();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// Compile every shader. Returns the binaries written.
pub fn compile_shaders(ctx: &BuildContext, config: &Config, shell: &Shell) -> Result<Vec<PathBuf>> {
    let dir = ctx.root.shader_dir();
    if !dir.is_dir() {
        shell.status(
            Status::Skipped,
            format!("shaders (no directory at {})", ctx.root.display(dir)),
        );
        return Ok(Vec::new());
    }

    let sources = files_with_extensions(dir, &config.shaders.extensions)?;
    let mut outputs = Vec::with_capacity(sources.len());

    for source in &sources {
        let output = shader_output(source, &config.shaders.output_extension);
        shell.status(Status::Compiling, ctx.root.display(source));

        ProcessBuilder::new(&ctx.settings.shader_compiler)
            .arg("-V")
            .arg(source)
            .arg("-o")
            .arg(&output)
            .exec_checked(ctx.executor(), "compiling shaders")?;

        outputs.push(output);
    }

    shell.status(Status::Finished, format!("{} shader(s)", outputs.len()));
    Ok(outputs)
}
