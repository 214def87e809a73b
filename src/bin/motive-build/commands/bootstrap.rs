//! `motive-build bootstrap` command

use anyhow::Result;

use super::Session;
use crate::cli::GlobalArgs;
use motive_build::ops::{bootstrap, HostEnv};

pub fn execute(global: &GlobalArgs) -> Result<()> {
    let session = Session::load(global)?;
    let ctx = session.build_context(None)?;

    bootstrap(&ctx, &session.config, &HostEnv::capture(), &session.shell)?;
    Ok(())
}
