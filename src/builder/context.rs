//! Build context - toolchain, executor, and flag configuration.

use std::fmt;
use std::sync::Arc;

use anyhow::Result;

use crate::builder::toolchain::{detect_toolchain, Toolchain};
use crate::util::config::ToolchainSettings;
use crate::util::context::RootConfig;
use crate::util::process::{ProcessExecutor, SystemExecutor};

/// Everything a build phase needs besides its own inputs.
#[derive(Clone)]
pub struct BuildContext {
    /// Directory layout
    pub root: RootConfig,

    /// Toolchain implementation
    pub toolchain: Arc<dyn Toolchain>,

    /// Runs every external command
    pub executor: Arc<dyn ProcessExecutor>,

    /// Compiler settings from configuration
    pub settings: ToolchainSettings,

    /// Worker count for compilation and dependency builds
    pub jobs: usize,
}

impl fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildContext")
            .field("root", &self.root)
            .field("compiler", &self.toolchain.compiler_path())
            .field("archiver", &self.toolchain.archiver_path())
            .field("settings", &self.settings)
            .field("jobs", &self.jobs)
            .finish()
    }
}

impl BuildContext {
    /// Detect the toolchain and run commands on the host.
    pub fn new(root: RootConfig, settings: ToolchainSettings, jobs: Option<usize>) -> Result<Self> {
        let toolchain = detect_toolchain(&settings)?;

        Ok(BuildContext {
            root,
            toolchain: Arc::new(toolchain),
            executor: Arc::new(SystemExecutor),
            settings,
            jobs: jobs.unwrap_or_else(default_jobs).max(1),
        })
    }

    /// Assemble a context from explicit parts.
    pub fn with_parts(
        root: RootConfig,
        toolchain: Arc<dyn Toolchain>,
        executor: Arc<dyn ProcessExecutor>,
        settings: ToolchainSettings,
        jobs: usize,
    ) -> Self {
        BuildContext {
            root,
            toolchain,
            executor,
            settings,
            jobs: jobs.max(1),
        }
    }

    /// Get the toolchain.
    pub fn toolchain(&self) -> &dyn Toolchain {
        self.toolchain.as_ref()
    }

    /// Get the executor.
    pub fn executor(&self) -> &dyn ProcessExecutor {
        self.executor.as_ref()
    }

    /// Flags for every engine compile: configured flags, then sanitizer flags.
    pub fn compile_flags(&self) -> Vec<String> {
        let mut flags = self.settings.cxxflags.clone();
        if let Some(sanitizer) = self.settings.sanitize {
            flags.extend(sanitizer.flags().iter().map(|f| f.to_string()));
        }
        flags
    }

    /// Flags for every link: sanitizer flags, then configured flags.
    pub fn link_flags(&self) -> Vec<String> {
        let mut flags: Vec<String> = self
            .settings
            .sanitize
            .map(|s| s.flags().iter().map(|f| f.to_string()).collect())
            .unwrap_or_default();
        flags.extend(self.settings.ldflags.iter().cloned());
        flags
    }
}

/// Host parallelism, at least one.
pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
