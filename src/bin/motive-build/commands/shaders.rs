//! `motive-build shaders` command

use anyhow::Result;

use super::Session;
use crate::cli::GlobalArgs;
use motive_build::ops::compile_shaders;

pub fn execute(global: &GlobalArgs) -> Result<()> {
    let session = Session::load(global)?;
    let ctx = session.build_context(None)?;

    compile_shaders(&ctx, &session.config, &session.shell)?;
    Ok(())
}
