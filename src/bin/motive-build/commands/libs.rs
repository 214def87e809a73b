//! `motive-build libs` command

use anyhow::Result;

use super::Session;
use crate::cli::GlobalArgs;
use motive_build::ops::resolve_link_args;

pub fn execute(global: &GlobalArgs) -> Result<()> {
    let session = Session::load(global)?;
    let ctx = session.build_context(None)?;

    let link_args = resolve_link_args(&ctx, &session.config, &session.shell)?;
    println!("{}", link_args.args().join(" "));

    Ok(())
}
