//! Command implementations

pub mod bootstrap;
pub mod build;
pub mod compile;
pub mod features;
pub mod libs;
pub mod shaders;

use anyhow::Result;

use crate::cli::GlobalArgs;
use motive_build::builder::BuildContext;
use motive_build::util::config::{Config, CONFIG_FILE};
use motive_build::util::shell::{Shell, Verbosity};
use motive_build::RootConfig;

/// Configuration, layout and output for one invocation.
pub struct Session {
    pub config: Config,
    pub root: RootConfig,
    pub shell: Shell,
}

impl Session {
    pub fn load(global: &GlobalArgs) -> Result<Self> {
        let config_path = global
            .config
            .clone()
            .unwrap_or_else(|| global.root.join(CONFIG_FILE));
        let config = Config::load_or_default(&config_path)?;
        let root = RootConfig::new(&global.root, &config.paths)?;

        let verbosity = if global.verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };

        Ok(Session {
            config,
            root,
            shell: Shell::new(verbosity, !global.no_color),
        })
    }

    /// Detect the toolchain and set up a build context.
    pub fn build_context(&self, jobs: Option<usize>) -> Result<BuildContext> {
        BuildContext::new(self.root.clone(), self.config.toolchain.clone(), jobs)
    }
}
