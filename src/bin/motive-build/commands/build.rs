//! `motive-build build` command

use anyhow::Result;

use crate::cli::{CompileArgs, GlobalArgs};

pub fn execute(args: CompileArgs, global: &GlobalArgs) -> Result<()> {
    super::compile::run(args, global, true)
}
