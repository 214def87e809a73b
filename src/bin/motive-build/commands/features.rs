//! `motive-build features` command

use anyhow::Result;

use super::Session;
use crate::cli::{FeaturesArgs, GlobalArgs};
use motive_build::ops::{print_feature_report, FeatureProber, HostEnv};
use motive_build::util::process::SystemExecutor;

pub fn execute(args: FeaturesArgs, global: &GlobalArgs) -> Result<()> {
    let session = Session::load(global)?;
    let env = HostEnv::capture();
    let executor = SystemExecutor;

    let prober = FeatureProber::new(&executor, &env, session.root.deps_dir());
    let report = prober.probe_all(&session.config.features);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_feature_report(&report, &session.shell);
    }

    Ok(())
}
