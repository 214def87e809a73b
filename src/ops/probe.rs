//! Hardware-acceleration feature probing.
//!
//! Decides, for the current host, which optional features a downstream
//! dependency's build may enable. An unavailable feature is always a skip
//! with a reason, never an error.
//!
//! ## Probes
//!
//! - **packages**: every listed package must be known to `pkg-config`.
//! - **gpu-toolchain**: the toolchain is a candidate when its front-end is on
//!   `PATH`, its root environment variable names an existing directory, or
//!   its conventional root exists. Candidacy alone is not enough: the vendor
//!   header must also be found, searching the headers environment variable
//!   first and then the configured candidate directories.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use crate::core::feature::{FeatureFlag, FeatureReport, FeatureSpec, FeatureStatus, GpuProbe, Probe};
use crate::util::process::{find_executable_in, ProcessBuilder, ProcessExecutor};
use crate::util::shell::{Shell, Status};

/// Snapshot of the environment variables probes read.
#[derive(Debug, Clone, Default)]
pub struct HostEnv {
    vars: HashMap<String, String>,
}

impl HostEnv {
    /// Capture the process environment.
    pub fn capture() -> Self {
        HostEnv {
            vars: std::env::vars().collect(),
        }
    }

    /// An explicit environment.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        HostEnv {
            vars: vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// A variable's value; empty values count as unset.
    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Look a program up on this environment's `PATH`.
    pub fn find_program(&self, name: &str, cwd: &Path) -> Option<PathBuf> {
        find_executable_in(name, self.var("PATH")?, cwd)
    }
}

/// A located GPU toolchain.
#[derive(Debug, Clone, PartialEq, Eq)]
struct GpuLocation {
    root: PathBuf,
    include: PathBuf,
    how: String,
}

/// Runs feature probes.
pub struct FeatureProber<'a> {
    executor: &'a dyn ProcessExecutor,
    env: &'a HostEnv,
    deps_dir: &'a Path,
}

impl<'a> FeatureProber<'a> {
    pub fn new(executor: &'a dyn ProcessExecutor, env: &'a HostEnv, deps_dir: &'a Path) -> Self {
        FeatureProber {
            executor,
            env,
            deps_dir,
        }
    }

    /// Probe every feature, keeping declaration order.
    pub fn probe_all(&self, specs: &[FeatureSpec]) -> FeatureReport {
        FeatureReport {
            features: specs.iter().map(|spec| self.probe(spec)).collect(),
        }
    }

    /// Probe one feature.
    pub fn probe(&self, spec: &FeatureSpec) -> FeatureFlag {
        let probed = probed_items(&spec.probe);

        if let Some(ref reason) = spec.skip {
            tracing::debug!("{}: force-skipped", spec.name);
            return FeatureFlag {
                name: spec.name.clone(),
                probed,
                flags: Vec::new(),
                status: FeatureStatus::Skipped {
                    reason: reason.clone(),
                },
            };
        }

        let outcome = match &spec.probe {
            Probe::Packages { packages } => self
                .probe_packages(packages)
                .map(|reason| (spec.flags.clone(), reason)),
            Probe::GpuToolchain(gpu) => self.probe_gpu(gpu).map(|loc| {
                let flags = spec
                    .flags
                    .iter()
                    .map(|f| {
                        f.replace("{include}", &loc.include.display().to_string())
                            .replace("{root}", &loc.root.display().to_string())
                    })
                    .collect();
                (flags, loc.how)
            }),
        };

        let (flags, status) = match outcome {
            Ok((flags, reason)) => (flags, FeatureStatus::Enabled { reason }),
            Err(reason) => (Vec::new(), FeatureStatus::Skipped { reason }),
        };
        tracing::debug!("{}: {:?}", spec.name, status);

        FeatureFlag {
            name: spec.name.clone(),
            probed,
            flags,
            status,
        }
    }

    fn probe_packages(&self, packages: &[String]) -> Result<String, String> {
        let mut missing = Vec::new();

        for package in packages {
            let cmd = ProcessBuilder::new("pkg-config").arg("--exists").arg(package);
            match self.executor.run(&cmd) {
                Ok(output) if output.success() => {}
                Ok(_) => missing.push(package.as_str()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return Err("pkg-config not available".to_string());
                }
                Err(e) => return Err(format!("pkg-config failed: {}", e)),
            }
        }

        if missing.is_empty() {
            Ok(format!("found {}", packages.join(", ")))
        } else {
            Err(format!("missing packages: {}", missing.join(", ")))
        }
    }

    fn probe_gpu(&self, gpu: &GpuProbe) -> Result<GpuLocation, String> {
        let (root, how) = self.gpu_root(gpu)?;

        let mut searched = Vec::new();
        for dir in self.header_dirs(gpu) {
            if dir.join(&gpu.header).is_file() {
                return Ok(GpuLocation {
                    root,
                    how: format!("{}; {} in {}", how, gpu.header.display(), dir.display()),
                    include: dir,
                });
            }
            searched.push(dir.display().to_string());
        }

        Err(format!(
            "{}, but {} was not found in: {}",
            how,
            gpu.header.display(),
            searched.join(", ")
        ))
    }

    /// The toolchain root, and how it was found.
    fn gpu_root(&self, gpu: &GpuProbe) -> Result<(PathBuf, String), String> {
        if let Some(root) = self.env.var(&gpu.root_env) {
            let root = PathBuf::from(root);
            if root.is_dir() {
                let how = format!("${} = {}", gpu.root_env, root.display());
                return Ok((root, how));
            }
        }

        if let Some(frontend) = self.env.find_program(&gpu.frontend, self.deps_dir) {
            // <root>/bin/<frontend>
            let root = frontend
                .parent()
                .and_then(Path::parent)
                .map(Path::to_path_buf)
                .unwrap_or_else(|| gpu.default_root.clone());
            let how = format!("{} at {}", gpu.frontend, frontend.display());
            return Ok((root, how));
        }

        if gpu.default_root.is_dir() {
            let how = format!("toolchain at {}", gpu.default_root.display());
            return Ok((gpu.default_root.clone(), how));
        }

        Err(format!(
            "no {} on PATH, ${} not set to an existing directory, {} missing",
            gpu.frontend,
            gpu.root_env,
            gpu.default_root.display()
        ))
    }

    /// Header search order: the override variable, then the candidates.
    fn header_dirs(&self, gpu: &GpuProbe) -> Vec<PathBuf> {
        let mut dirs = Vec::new();

        if let Some(root) = self.env.var(&gpu.headers_env) {
            let root = PathBuf::from(root);
            dirs.push(root.join("include"));
            dirs.push(root);
        }

        dirs.extend(gpu.header_candidates.iter().map(|c| self.deps_dir.join(c)));
        dirs
    }
}

/// Print one line per feature: enabled ones with what was found, skipped
/// ones with why.
pub fn print_feature_report(report: &FeatureReport, shell: &Shell) {
    for feature in &report.features {
        if feature.is_enabled() {
            shell.status(Status::Enabled, format!("{} ({})", feature.name, feature.reason()));
        } else {
            shell.status(Status::Skipped, format!("{}: {}", feature.name, feature.reason()));
        }
    }
    shell.status(
        Status::Finished,
        format!(
            "feature detection ({} enabled, {} skipped)",
            report.enabled().count(),
            report.skipped().count()
        ),
    );
}

fn probed_items(probe: &Probe) -> Vec<String> {
    match probe {
        Probe::Packages { packages } => packages.clone(),
        Probe::GpuToolchain(gpu) => vec![gpu.frontend.clone(), gpu.header.display().to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockExecutor, MockProcessOutput};
    use crate::util::config::default_features;
    use tempfile::TempDir;

    fn gpu_probe(tmp: &TempDir) -> GpuProbe {
        GpuProbe {
            default_root: tmp.path().join("no-default-cuda"),
            header_candidates: vec![PathBuf::from("nv-codec-headers/.nv-codec-headers/include")],
            ..Default::default()
        }
    }

    fn install_header(dir: &Path) {
        let header = dir.join("ffnvcodec/nvEncodeAPI.h");
        std::fs::create_dir_all(header.parent().unwrap()).unwrap();
        std::fs::write(header, "").unwrap();
    }

    fn cuda_spec(tmp: &TempDir) -> FeatureSpec {
        FeatureSpec::gpu(
            "cuda",
            gpu_probe(tmp),
            &["--enable-nvenc", "--extra-cflags=-I{include}", "--extra-ldflags=-L{root}/lib64"],
        )
    }

    #[test]
    fn test_packages_all_present_enables() {
        let exec = MockExecutor::new();
        exec.expect_prefix("pkg-config --exists", MockProcessOutput::success(""));
        let env = HostEnv::default();
        let tmp = TempDir::new().unwrap();

        let prober = FeatureProber::new(&exec, &env, tmp.path());
        let flag = prober.probe(&FeatureSpec::packages("vaapi", ["libva", "libva-drm"], &["--enable-vaapi"]));

        assert!(flag.is_enabled());
        assert_eq!(flag.flags, vec!["--enable-vaapi"]);
        assert_eq!(exec.calls().len(), 2);
    }

    #[test]
    fn test_one_missing_package_skips() {
        let exec = MockExecutor::new();
        exec.expect("pkg-config --exists libva", MockProcessOutput::success(""));
        exec.expect("pkg-config --exists libva-drm", MockProcessOutput::failure(1, ""));
        let env = HostEnv::default();
        let tmp = TempDir::new().unwrap();

        let prober = FeatureProber::new(&exec, &env, tmp.path());
        let flag = prober.probe(&FeatureSpec::packages("vaapi", ["libva", "libva-drm"], &["--enable-vaapi"]));

        assert!(!flag.is_enabled());
        assert!(flag.flags.is_empty());
        assert_eq!(flag.reason(), "missing packages: libva-drm");
    }

    #[test]
    fn test_missing_pkg_config_is_a_skip() {
        let exec = MockExecutor::new();
        let env = HostEnv::default();
        let tmp = TempDir::new().unwrap();

        let prober = FeatureProber::new(&exec, &env, tmp.path());
        let flag = prober.probe(&FeatureSpec::packages("vdpau", ["vdpau"], &["--enable-vdpau"]));

        assert_eq!(flag.reason(), "pkg-config not available");
    }

    #[test]
    fn test_force_skip_bypasses_probe() {
        let exec = MockExecutor::new();
        let env = HostEnv::default();
        let tmp = TempDir::new().unwrap();

        let prober = FeatureProber::new(&exec, &env, tmp.path());
        let report = prober.probe_all(&default_features());
        let vulkan = report.get("vulkan").unwrap();

        assert!(!vulkan.is_enabled());
        assert!(vulkan.reason().contains("Vulkan headers"));
        assert!(exec.calls_containing("vulkan").is_empty());
        assert_eq!(report.features.len(), default_features().len());
    }

    #[test]
    fn test_gpu_env_root_and_bundled_headers() {
        let tmp = TempDir::new().unwrap();
        let cuda = tmp.path().join("cuda");
        std::fs::create_dir_all(&cuda).unwrap();
        let bundled = tmp.path().join("nv-codec-headers/.nv-codec-headers/include");
        install_header(&bundled);

        let exec = MockExecutor::new();
        let env = HostEnv::from_vars([("CUDA_HOME", cuda.display().to_string())]);
        let prober = FeatureProber::new(&exec, &env, tmp.path());
        let flag = prober.probe(&cuda_spec(&tmp));

        assert!(flag.is_enabled(), "{}", flag.reason());
        assert_eq!(
            flag.flags,
            vec![
                "--enable-nvenc".to_string(),
                format!("--extra-cflags=-I{}", bundled.display()),
                format!("--extra-ldflags=-L{}/lib64", cuda.display()),
            ]
        );
    }

    #[test]
    fn test_gpu_headers_env_takes_priority() {
        let tmp = TempDir::new().unwrap();
        let cuda = tmp.path().join("cuda");
        std::fs::create_dir_all(&cuda).unwrap();
        install_header(&tmp.path().join("nv-codec-headers/.nv-codec-headers/include"));
        let custom = tmp.path().join("custom-ffnv");
        install_header(&custom.join("include"));

        let exec = MockExecutor::new();
        let env = HostEnv::from_vars([
            ("CUDA_HOME", cuda.display().to_string()),
            ("FFNVCODEC_ROOT", custom.display().to_string()),
        ]);
        let prober = FeatureProber::new(&exec, &env, tmp.path());
        let flag = prober.probe(&cuda_spec(&tmp));

        assert!(flag.flags.contains(&format!("--extra-cflags=-I{}", custom.join("include").display())));
    }

    #[cfg(unix)]
    #[test]
    fn test_gpu_frontend_on_path() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let bin = tmp.path().join("toolkit/bin");
        std::fs::create_dir_all(&bin).unwrap();
        let nvcc = bin.join("nvcc");
        std::fs::write(&nvcc, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&nvcc, std::fs::Permissions::from_mode(0o755)).unwrap();
        install_header(&tmp.path().join("nv-codec-headers/.nv-codec-headers/include"));

        let exec = MockExecutor::new();
        let env = HostEnv::from_vars([("PATH", bin.display().to_string())]);
        let prober = FeatureProber::new(&exec, &env, tmp.path());
        let flag = prober.probe(&cuda_spec(&tmp));

        assert!(flag.is_enabled(), "{}", flag.reason());
        assert!(flag
            .flags
            .contains(&format!("--extra-ldflags=-L{}/lib64", tmp.path().join("toolkit").display())));
    }

    #[test]
    fn test_gpu_without_toolchain_skips() {
        let tmp = TempDir::new().unwrap();
        install_header(&tmp.path().join("nv-codec-headers/.nv-codec-headers/include"));

        let exec = MockExecutor::new();
        let env = HostEnv::from_vars([("CUDA_HOME", "/definitely/not/here")]);
        let prober = FeatureProber::new(&exec, &env, tmp.path());
        let flag = prober.probe(&cuda_spec(&tmp));

        assert!(!flag.is_enabled());
        assert!(flag.reason().contains("no nvcc on PATH"));
    }

    #[test]
    fn test_gpu_without_headers_skips() {
        let tmp = TempDir::new().unwrap();
        let cuda = tmp.path().join("cuda");
        std::fs::create_dir_all(&cuda).unwrap();

        let exec = MockExecutor::new();
        let env = HostEnv::from_vars([("CUDA_HOME", cuda.display().to_string())]);
        let prober = FeatureProber::new(&exec, &env, tmp.path());
        let flag = prober.probe(&cuda_spec(&tmp));

        assert!(!flag.is_enabled());
        assert!(flag.reason().contains("ffnvcodec/nvEncodeAPI.h was not found"));
    }
}
