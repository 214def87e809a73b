//! Toolchain detection.

use std::path::PathBuf;

use crate::core::error::BuildError;
use crate::util::config::ToolchainSettings;
use crate::util::process::find_executable;

use super::GccToolchain;

/// Detect the compiler driver and archiver.
///
/// Tries, in order: the configured path, the `CXX`/`AR` environment
/// variables, then common names on PATH.
pub fn detect_toolchain(settings: &ToolchainSettings) -> Result<GccToolchain, BuildError> {
    let cxx = locate(settings.cxx.as_ref(), "CXX", &["g++", "c++", "clang++"]).ok_or_else(|| {
        BuildError::MissingPrerequisite {
            what: "no C++ compiler found".to_string(),
            remediation: vec![
                "install g++ or clang++".to_string(),
                "or set CXX / `toolchain.cxx` in motive.toml".to_string(),
            ],
        }
    })?;

    let ar = locate(settings.ar.as_ref(), "AR", &["ar", "llvm-ar"]).ok_or_else(|| {
        BuildError::MissingPrerequisite {
            what: "no archiver found".to_string(),
            remediation: vec![
                "install binutils".to_string(),
                "or set AR / `toolchain.ar` in motive.toml".to_string(),
            ],
        }
    })?;

    tracing::debug!("using toolchain: cxx={}, ar={}", cxx.display(), ar.display());

    Ok(GccToolchain::new(cxx, ar))
}

fn locate(configured: Option<&PathBuf>, env_var: &str, candidates: &[&str]) -> Option<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            return Some(path.clone());
        }
        if let Some(found) = path.to_str().and_then(find_executable) {
            return Some(found);
        }
        tracing::warn!("configured tool not found: {}", path.display());
    }

    if let Ok(value) = std::env::var(env_var) {
        if let Some(found) = find_executable(&value) {
            return Some(found);
        }
    }

    candidates.iter().find_map(|name| find_executable(name))
}
