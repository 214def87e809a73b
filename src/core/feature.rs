//! Optional hardware-acceleration features.
//!
//! Feature definitions come from configuration; their status is recomputed
//! on every run and never persisted.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How a feature's availability is probed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Probe {
    /// Every package must be known to `pkg-config`.
    Packages { packages: Vec<String> },
    /// A GPU compute toolchain plus its vendor headers.
    GpuToolchain(GpuProbe),
}

/// Probe settings for a GPU compute toolchain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuProbe {
    /// Compiler front-end looked up on `PATH`.
    #[serde(default = "default_frontend")]
    pub frontend: String,

    /// Environment variable naming the toolchain root.
    #[serde(default = "default_root_env")]
    pub root_env: String,

    /// Conventional install location.
    #[serde(default = "default_root")]
    pub default_root: PathBuf,

    /// Environment variable naming the vendor headers root. Searched first.
    #[serde(default = "default_headers_env")]
    pub headers_env: String,

    /// Header that must exist below a candidate directory.
    #[serde(default = "default_header")]
    pub header: PathBuf,

    /// Candidate include directories in priority order. Relative entries are
    /// resolved against the deps directory.
    #[serde(default = "default_header_candidates")]
    pub header_candidates: Vec<PathBuf>,
}

fn default_frontend() -> String {
    "nvcc".to_string()
}

fn default_root_env() -> String {
    "CUDA_HOME".to_string()
}

fn default_root() -> PathBuf {
    PathBuf::from("/usr/local/cuda")
}

fn default_headers_env() -> String {
    "FFNVCODEC_ROOT".to_string()
}

fn default_header() -> PathBuf {
    PathBuf::from("ffnvcodec/nvEncodeAPI.h")
}

fn default_header_candidates() -> Vec<PathBuf> {
    vec![
        PathBuf::from("nv-codec-headers/.nv-codec-headers/include"),
        PathBuf::from("/usr/local/include"),
        PathBuf::from("/usr/include"),
    ]
}

impl Default for GpuProbe {
    fn default() -> Self {
        GpuProbe {
            frontend: default_frontend(),
            root_env: default_root_env(),
            default_root: default_root(),
            headers_env: default_headers_env(),
            header: default_header(),
            header_candidates: default_header_candidates(),
        }
    }
}

/// A feature as declared in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub name: String,

    /// Build flags added when enabled. `{include}` and `{root}` are replaced
    /// with the directories a GPU probe found.
    pub flags: Vec<String>,

    /// Skip without probing, for the given reason.
    #[serde(default)]
    pub skip: Option<String>,

    pub probe: Probe,
}

impl FeatureSpec {
    /// A feature gated on a set of `pkg-config` packages.
    pub fn packages<I, S>(name: impl Into<String>, packages: I, flags: &[&str]) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FeatureSpec {
            name: name.into(),
            flags: flags.iter().map(|f| f.to_string()).collect(),
            skip: None,
            probe: Probe::Packages {
                packages: packages.into_iter().map(Into::into).collect(),
            },
        }
    }

    /// A feature gated on a GPU toolchain.
    pub fn gpu(name: impl Into<String>, probe: GpuProbe, flags: &[&str]) -> Self {
        FeatureSpec {
            name: name.into(),
            flags: flags.iter().map(|f| f.to_string()).collect(),
            skip: None,
            probe: Probe::GpuToolchain(probe),
        }
    }

    /// Force-skip this feature.
    pub fn skipped(mut self, reason: impl Into<String>) -> Self {
        self.skip = Some(reason.into());
        self
    }
}

/// Outcome of probing one feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FeatureStatus {
    Enabled { reason: String },
    Skipped { reason: String },
}

/// A probed feature and the flags it contributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureFlag {
    pub name: String,
    /// Packages or files the probe looked at.
    pub probed: Vec<String>,
    /// Resolved flags; empty when skipped.
    pub flags: Vec<String>,
    #[serde(flatten)]
    pub status: FeatureStatus,
}

impl FeatureFlag {
    pub fn is_enabled(&self) -> bool {
        matches!(self.status, FeatureStatus::Enabled { .. })
    }

    pub fn reason(&self) -> &str {
        match &self.status {
            FeatureStatus::Enabled { reason } | FeatureStatus::Skipped { reason } => reason,
        }
    }
}

/// Result of a probing run, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeatureReport {
    pub features: Vec<FeatureFlag>,
}

impl FeatureReport {
    /// Enabled flags, in declaration order.
    pub fn enabled_flags(&self) -> Vec<String> {
        self.enabled().flat_map(|f| f.flags.iter().cloned()).collect()
    }

    pub fn enabled(&self) -> impl Iterator<Item = &FeatureFlag> {
        self.features.iter().filter(|f| f.is_enabled())
    }

    pub fn skipped(&self) -> impl Iterator<Item = &FeatureFlag> {
        self.features.iter().filter(|f| !f.is_enabled())
    }

    pub fn get(&self, name: &str) -> Option<&FeatureFlag> {
        self.features.iter().find(|f| f.name == name)
    }
}
