//! Third-party dependency declarations.
//!
//! A [`Dependency`] is one row of the configuration-driven dependency table:
//! where the project comes from, where its working tree lives, how it is
//! built and installed, and which files prove it has been built.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

/// What to do when the working tree is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchPolicy {
    /// Clone the repository.
    #[default]
    Auto,
    /// Fail and tell the user how to fetch it.
    Manual,
}

/// Where a dependency's build is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstallMode {
    /// Used straight from its build tree.
    #[default]
    None,
    /// Installed into a prefix inside the dependency's own tree.
    Prefix,
    /// Installed system-wide with `sudo`.
    System,
}

/// How a dependency is built.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BuildRecipe {
    /// Nothing to build.
    #[default]
    HeaderOnly,
    /// `cmake` configure into `build/`, then parallel `make`.
    Cmake {
        #[serde(default)]
        args: Vec<String>,
    },
    /// `./configure` in the tree, then parallel `make`.
    Configure {
        #[serde(default)]
        args: Vec<String>,
    },
    /// Plain Makefile project.
    Make {
        #[serde(default)]
        args: Vec<String>,
    },
    /// Compile the given sources and archive them into a static library.
    Archive {
        sources: Vec<String>,
        #[serde(default)]
        std: Option<String>,
        output: PathBuf,
    },
}

impl BuildRecipe {
    /// Recipe name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildRecipe::HeaderOnly => "header-only",
            BuildRecipe::Cmake { .. } => "cmake",
            BuildRecipe::Configure { .. } => "configure",
            BuildRecipe::Make { .. } => "make",
            BuildRecipe::Archive { .. } => "archive",
        }
    }
}

/// Revision mode of a working tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevisionState {
    /// On a branch; updated on every bootstrap.
    Tracking { branch: String },
    /// Detached or explicitly pinned; never updated automatically.
    Pinned { rev: String },
}

impl RevisionState {
    pub fn is_pinned(&self) -> bool {
        matches!(self, RevisionState::Pinned { .. })
    }
}

/// A declared third-party project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,

    /// Repository URL, or a local path to a repository.
    pub repo: String,

    /// Working tree location, relative to the deps directory.
    pub path: PathBuf,

    #[serde(default)]
    pub fetch: FetchPolicy,

    /// Fixed revision to check out on clone. Implies pinned mode.
    #[serde(default)]
    pub pin: Option<String>,

    #[serde(default)]
    pub install: InstallMode,

    #[serde(default)]
    pub recipe: BuildRecipe,

    /// Files (relative to the tree) whose presence means the build is done.
    #[serde(default)]
    pub artifacts: Vec<PathBuf>,

    /// Append the probed hardware-acceleration flags to the configure line.
    #[serde(default)]
    pub use_features: bool,
}

impl Dependency {
    /// Create a header-only dependency tracking its default branch.
    pub fn new(name: impl Into<String>, repo: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Dependency {
            name: name.into(),
            repo: repo.into(),
            path: path.into(),
            fetch: FetchPolicy::Auto,
            pin: None,
            install: InstallMode::None,
            recipe: BuildRecipe::HeaderOnly,
            artifacts: Vec::new(),
            use_features: false,
        }
    }

    pub fn with_recipe(mut self, recipe: BuildRecipe) -> Self {
        self.recipe = recipe;
        self
    }

    pub fn with_install(mut self, install: InstallMode) -> Self {
        self.install = install;
        self
    }

    pub fn with_fetch(mut self, fetch: FetchPolicy) -> Self {
        self.fetch = fetch;
        self
    }

    pub fn with_pin(mut self, rev: impl Into<String>) -> Self {
        self.pin = Some(rev.into());
        self
    }

    pub fn with_artifacts<I, P>(mut self, artifacts: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.artifacts = artifacts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_features(mut self) -> Self {
        self.use_features = true;
        self
    }

    /// Parse the repository location into a URL git understands.
    ///
    /// Absolute filesystem paths become `file://` URLs.
    pub fn repo_url(&self) -> Option<Url> {
        Url::parse(&self.repo).ok().or_else(|| {
            let path = Path::new(&self.repo);
            if path.is_absolute() {
                Url::from_file_path(path).ok()
            } else {
                None
            }
        })
    }

    /// The working tree, given the deps directory.
    pub fn tree_dir(&self, deps_dir: &Path) -> PathBuf {
        deps_dir.join(&self.path)
    }

    /// Out-of-tree build directory used by cmake recipes.
    pub fn build_dir(&self, deps_dir: &Path) -> PathBuf {
        self.tree_dir(deps_dir).join("build")
    }

    /// Install prefix scoped to this dependency (`<tree>/.<name>`).
    ///
    /// `None` unless the install mode is [`InstallMode::Prefix`].
    pub fn install_prefix(&self, deps_dir: &Path) -> Option<PathBuf> {
        match self.install {
            InstallMode::Prefix => Some(
                self.tree_dir(deps_dir)
                    .join(format!(".{}", self.name.to_lowercase())),
            ),
            InstallMode::None | InstallMode::System => None,
        }
    }

    /// Whether every declared artifact exists. False when none are declared
    /// and the recipe builds something.
    pub fn artifacts_present(&self, deps_dir: &Path) -> bool {
        if self.artifacts.is_empty() {
            return self.recipe == BuildRecipe::HeaderOnly;
        }
        let tree = self.tree_dir(deps_dir);
        self.artifacts.iter().all(|a| tree.join(a).exists())
    }
}
