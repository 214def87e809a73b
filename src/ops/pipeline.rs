//! Implementation of `motive-build build`.
//!
//! Runs every phase in order: bootstrap, link-argument resolution, shader
//! compilation, then compile and link. A phase only starts once the one
//! before it has succeeded.

use std::path::PathBuf;

use anyhow::Result;

use crate::builder::plan::BuildPlan;
use crate::builder::BuildContext;
use crate::core::library::LinkArgs;
use crate::ops::bootstrap::{bootstrap, BootstrapReport};
use crate::ops::compile::{compile_and_link, CompileOptions};
use crate::ops::link_args::resolve_link_args;
use crate::ops::probe::HostEnv;
use crate::ops::shaders::compile_shaders;
use crate::util::config::Config;
use crate::util::shell::Shell;

/// Options for a full build.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Ensure and build dependencies first.
    pub bootstrap: bool,
    pub compile: CompileOptions,
}

/// Everything a full build produced.
#[derive(Debug)]
pub struct BuildReport {
    pub bootstrap: Option<BootstrapReport>,
    pub link_args: LinkArgs,
    pub shaders: Vec<PathBuf>,
    pub plan: BuildPlan,
}

/// Run the build phases in order.
pub fn build(
    ctx: &BuildContext,
    config: &Config,
    env: &HostEnv,
    opts: &BuildOptions,
    shell: &Shell,
) -> Result<BuildReport> {
    let bootstrap = if opts.bootstrap {
        Some(bootstrap(ctx, config, env, shell)?)
    } else {
        None
    };

    let link_args = resolve_link_args(ctx, config, shell)?;
    let shaders = compile_shaders(ctx, config, shell)?;
    let plan = compile_and_link(ctx, config, &link_args, &opts.compile, shell)?;

    Ok(BuildReport {
        bootstrap,
        link_args,
        shaders,
        plan,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::builder::toolchain::GccToolchain;
    use crate::core::error::BuildError;
    use crate::test_support::{EngineFixture, MockExecutor, MockProcessOutput};
    use crate::util::config::{LibrariesConfig, PathsConfig, ToolchainSettings};
    use crate::util::context::RootConfig;
    use tempfile::TempDir;

    fn setup(exec: Arc<MockExecutor>) -> (TempDir, BuildContext, Config) {
        let tmp = TempDir::new().unwrap();
        EngineFixture::standard()
            .with_shader("mesh.vert")
            .with_shader("mesh.frag")
            .write_to(tmp.path())
            .unwrap();
        let root = RootConfig::new(tmp.path(), &PathsConfig::default()).unwrap();
        let ctx = BuildContext::with_parts(
            root,
            Arc::new(GccToolchain::new("g++", "ar")),
            exec,
            ToolchainSettings::default(),
            1,
        );

        let mut config = Config::default();
        config.dependencies.clear();
        config.libraries = LibrariesConfig {
            required: vec!["m".to_string()],
            optional: Vec::new(),
        };
        (tmp, ctx, config)
    }

    fn options() -> BuildOptions {
        BuildOptions {
            bootstrap: true,
            compile: CompileOptions::default(),
        }
    }

    /// `g++ -print-file-name=` answers with a real file for `libm.so`.
    fn expect_libm(exec: &MockExecutor, tmp: &TempDir) {
        let libm = tmp.path().join("libm.so");
        std::fs::write(&libm, "").unwrap();
        exec.expect(
            "g++ -print-file-name=libm.so",
            MockProcessOutput::success(format!("{}\n", libm.display())),
        );
    }

    #[test]
    fn test_phases_run_in_order() {
        let exec = Arc::new(MockExecutor::new());
        let (tmp, ctx, config) = setup(exec.clone());
        expect_libm(&exec, &tmp);
        exec.set_default(MockProcessOutput::success(""));

        let report = build(&ctx, &config, &HostEnv::default(), &options(), &Shell::quiet()).unwrap();

        assert_eq!(report.link_args.args(), vec!["-lm"]);
        assert_eq!(report.shaders.len(), 2);
        assert!(report.bootstrap.unwrap().dependencies.is_empty());

        let calls = exec.calls();
        let position = |needle: &str| calls.iter().position(|c| c.contains(needle)).unwrap();
        let resolve = position("-print-file-name=libm.so");
        let shader = position("glslangValidator");
        let compile = position(" -c ");
        let archive = position("ar rcs");
        let link = position("g++ -o");
        assert!(resolve < shader);
        assert!(shader < compile);
        assert!(compile < archive);
        assert!(archive < link);
        assert!(calls.iter().filter(|c| c.starts_with("g++ -o")).all(|c| c.ends_with("-lm")));
    }

    #[test]
    fn test_shader_failure_stops_before_compiling() {
        let exec = Arc::new(MockExecutor::new());
        let (tmp, ctx, config) = setup(exec.clone());
        expect_libm(&exec, &tmp);
        exec.expect_prefix("glslangValidator", MockProcessOutput::failure(1, "syntax error"));
        exec.set_default(MockProcessOutput::success(""));

        let err = build(&ctx, &config, &HostEnv::default(), &options(), &Shell::quiet()).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::CommandFailed { .. })
        ));
        assert!(exec.calls_containing(" -c ").is_empty());
    }

    #[test]
    fn test_unresolved_library_stops_before_shaders() {
        let exec = Arc::new(MockExecutor::new());
        let (_tmp, ctx, mut config) = setup(exec.clone());
        config.libraries.required = vec!["definitely_not_a_library_xyz".to_string()];
        exec.expect_prefix("g++ -print-file-name=", MockProcessOutput::success(""));
        exec.set_default(MockProcessOutput::success(""));

        let err = build(&ctx, &config, &HostEnv::default(), &options(), &Shell::quiet()).unwrap_err();

        assert_eq!(
            err.to_string(),
            "missing required libraries: definitely_not_a_library_xyz"
        );
        assert!(exec.calls_containing("glslangValidator").is_empty());
    }
}
