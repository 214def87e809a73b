//! Configuration file support.
//!
//! The build is driven by `motive.toml` at the project root. Every section
//! is optional; an absent file or section means the built-in defaults, which
//! describe the Motive engine and its third-party projects. Variation between
//! setups (extra dependencies, different feature sets) is data in this file,
//! not separate scripts.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::dependency::{BuildRecipe, Dependency, InstallMode};
use crate::core::feature::{FeatureSpec, GpuProbe};
use crate::core::unit::RuntimeKind;

/// Default configuration file name.
pub const CONFIG_FILE: &str = "motive.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub toolchain: ToolchainSettings,
    pub engine: EngineConfig,
    pub libraries: LibrariesConfig,
    pub shaders: ShaderConfig,

    /// Third-party projects, bootstrapped in order.
    #[serde(rename = "dependency")]
    pub dependencies: Vec<Dependency>,

    /// Optional hardware-acceleration features.
    #[serde(rename = "feature")]
    pub features: Vec<FeatureSpec>,
}

/// Directory layout, relative to the root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Where dependency working trees live.
    pub deps: PathBuf,
    /// Engine sources.
    pub sources: PathBuf,
    /// Shader sources.
    pub shaders: PathBuf,
    /// Objects, the runtime library and executables.
    pub out: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        PathsConfig {
            deps: PathBuf::from("."),
            sources: PathBuf::from("."),
            shaders: PathBuf::from("shaders"),
            out: PathBuf::from("build"),
        }
    }
}

/// Sanitizer instrumentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sanitizer {
    Address,
}

impl Sanitizer {
    pub fn flags(&self) -> &'static [&'static str] {
        match self {
            Sanitizer::Address => &["-fsanitize=address", "-fno-omit-frame-pointer"],
        }
    }
}

/// Compiler and tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainSettings {
    /// C++ compiler driver. Falls back to `CXX`, then PATH search.
    pub cxx: Option<PathBuf>,

    /// Archiver. Falls back to `AR`, then PATH search.
    pub ar: Option<PathBuf>,

    /// Shader compiler.
    pub shader_compiler: PathBuf,

    /// Language standard for engine sources.
    pub std: String,

    /// Extra compile flags.
    pub cxxflags: Vec<String>,

    /// Extra link flags.
    pub ldflags: Vec<String>,

    pub sanitize: Option<Sanitizer>,
}

impl Default for ToolchainSettings {
    fn default() -> Self {
        ToolchainSettings {
            cxx: None,
            ar: None,
            shader_compiler: PathBuf::from("glslangValidator"),
            std: "c++17".to_string(),
            cxxflags: vec!["-g".to_string(), "-O0".to_string()],
            ldflags: Vec::new(),
            sanitize: None,
        }
    }
}

/// The engine's own sources and artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Runtime library name (`lib<name>.a` / `lib<name>.so`).
    pub name: String,

    pub runtime: RuntimeKind,

    /// Recognized source extension.
    pub extension: String,

    /// Source files holding `main`, one executable each.
    pub entry_points: Vec<String>,

    /// Include directories, relative to the deps directory.
    pub include_dirs: Vec<PathBuf>,

    /// Library directories in priority order, relative to the deps directory.
    pub lib_dirs: Vec<PathBuf>,

    /// Embed the output directory as rpath when the runtime is dynamic.
    pub rpath: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            name: "engine".to_string(),
            runtime: RuntimeKind::Static,
            extension: "cpp".to_string(),
            entry_points: strings(&["motive3d.cpp", "motive2d.cpp"]),
            include_dirs: paths(&[
                "Vulkan-Headers/include",
                "glfw/include",
                "tinygltf",
                "glm",
                "FFmpeg/.ffmpeg/include",
                "freetype/include",
                "freetype/build/include",
                "freetype/build/include/freetype2",
            ]),
            lib_dirs: paths(&[
                "Vulkan-Headers/lib",
                "glfw/build/src",
                "FFmpeg/.ffmpeg/lib",
                "freetype/build",
                "tinygltf",
            ]),
            rpath: true,
        }
    }
}

/// Libraries to resolve for the final link.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibrariesConfig {
    /// Missing any of these aborts the build.
    pub required: Vec<String>,
    /// Linked when found, otherwise left out with a warning.
    pub optional: Vec<String>,
}

impl Default for LibrariesConfig {
    fn default() -> Self {
        LibrariesConfig {
            required: strings(&[
                "glfw3",
                "tinygltf",
                "vulkan",
                "avformat",
                "avcodec",
                "swscale",
                "avutil",
                "swresample",
                "freetype",
                "m",
                "pthread",
                "dl",
            ]),
            optional: strings(&[
                "png",
                "brotlidec",
                "brotlicommon",
                "bz2",
                "lzma",
                "drm",
                "z",
                "OpenCL",
                "X11",
                "Xext",
                "vdpau",
            ]),
        }
    }
}

/// Shader compilation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderConfig {
    /// Stage extensions to compile.
    pub extensions: Vec<String>,
    /// Extension appended to produce the binary name.
    pub output_extension: String,
}

impl Default for ShaderConfig {
    fn default() -> Self {
        ShaderConfig {
            extensions: strings(&["vert", "frag", "comp"]),
            output_extension: "spv".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            paths: PathsConfig::default(),
            toolchain: ToolchainSettings::default(),
            engine: EngineConfig::default(),
            libraries: LibrariesConfig::default(),
            shaders: ShaderConfig::default(),
            dependencies: default_dependencies(),
            features: default_features(),
        }
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Load configuration, using defaults when the file doesn't exist.
    ///
    /// A file that exists but does not parse is an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("no config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn paths(items: &[&str]) -> Vec<PathBuf> {
    items.iter().map(PathBuf::from).collect()
}

/// The engine's third-party projects.
pub fn default_dependencies() -> Vec<Dependency> {
    vec![
        Dependency::new(
            "Vulkan-Headers",
            "https://github.com/KhronosGroup/Vulkan-Headers.git",
            "Vulkan-Headers",
        ),
        Dependency::new("glfw", "https://github.com/glfw/glfw.git", "glfw")
            .with_recipe(BuildRecipe::Cmake {
                args: strings(&[
                    "-DCMAKE_BUILD_TYPE=Release",
                    "-DGLFW_BUILD_EXAMPLES=OFF",
                    "-DGLFW_BUILD_TESTS=OFF",
                    "-DGLFW_BUILD_DOCS=OFF",
                ]),
            })
            .with_artifacts(["build/src/libglfw3.a"]),
        Dependency::new("tinygltf", "https://github.com/syoyo/tinygltf.git", "tinygltf")
            .with_recipe(BuildRecipe::Archive {
                sources: strings(&["tiny_gltf.cc"]),
                std: Some("c++11".to_string()),
                output: PathBuf::from("libtinygltf.a"),
            })
            .with_artifacts(["libtinygltf.a"]),
        Dependency::new("glm", "https://github.com/g-truc/glm.git", "glm"),
        Dependency::new(
            "nv-codec-headers",
            "https://github.com/FFmpeg/nv-codec-headers.git",
            "nv-codec-headers",
        )
        .with_recipe(BuildRecipe::Make { args: Vec::new() })
        .with_install(InstallMode::Prefix)
        .with_artifacts([".nv-codec-headers/include/ffnvcodec/nvEncodeAPI.h"]),
        Dependency::new("FFmpeg", "https://github.com/FFmpeg/FFmpeg.git", "FFmpeg")
            .with_recipe(BuildRecipe::Configure {
                args: strings(&["--disable-programs", "--disable-doc", "--enable-pic"]),
            })
            .with_install(InstallMode::Prefix)
            .with_artifacts([
                ".ffmpeg/lib/libavformat.a",
                ".ffmpeg/lib/libavcodec.a",
                ".ffmpeg/lib/libswscale.a",
                ".ffmpeg/lib/libavutil.a",
                ".ffmpeg/lib/libswresample.a",
            ])
            .with_features(),
        Dependency::new("freetype", "https://github.com/freetype/freetype.git", "freetype")
            .with_recipe(BuildRecipe::Cmake {
                args: strings(&[
                    "-DCMAKE_BUILD_TYPE=Release",
                    "-DCMAKE_POSITION_INDEPENDENT_CODE=ON",
                    "-DFT_DISABLE_HARFBUZZ=TRUE",
                ]),
            })
            .with_artifacts(["build/libfreetype.a"]),
    ]
}

/// FFmpeg's optional hardware-acceleration features.
pub fn default_features() -> Vec<FeatureSpec> {
    vec![
        FeatureSpec::packages("vaapi", ["libva", "libva-drm"], &["--enable-vaapi"]),
        FeatureSpec::packages("vdpau", ["vdpau"], &["--enable-vdpau"]),
        FeatureSpec::packages("libdrm", ["libdrm"], &["--enable-libdrm"]),
        FeatureSpec::packages("opencl", ["OpenCL"], &["--enable-opencl"]),
        FeatureSpec::packages("vulkan", ["vulkan"], &["--enable-vulkan"]).skipped(
            "FFmpeg's Vulkan hwaccel needs newer Vulkan headers than the system loader provides",
        ),
        FeatureSpec::gpu(
            "cuda",
            GpuProbe::default(),
            &[
                "--enable-ffnvcodec",
                "--enable-nvenc",
                "--enable-nvdec",
                "--enable-cuvid",
                "--extra-cflags=-I{include}",
                "--extra-ldflags=-L{root}/lib64",
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dependency::FetchPolicy;
    use crate::core::feature::Probe;

    #[test]
    fn test_empty_file_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.engine.entry_points, vec!["motive3d.cpp", "motive2d.cpp"]);
        assert_eq!(config.libraries.required.len(), 12);
        let dep = |name: &str| config.dependencies.iter().find(|d| d.name == name);
        assert!(dep("glfw").is_some());
        assert!(dep("FFmpeg").unwrap().use_features);
        assert_eq!(config.features.len(), 6);
    }

    #[test]
    fn test_partial_sections_override_only_given_fields() {
        let config: Config = toml::from_str(
            r#"
            [engine]
            runtime = "dynamic"
            entry_points = ["main.cpp"]

            [toolchain]
            sanitize = "address"
            "#,
        )
        .unwrap();

        assert_eq!(config.engine.runtime, RuntimeKind::Dynamic);
        assert_eq!(config.engine.entry_points, vec!["main.cpp"]);
        assert_eq!(config.engine.extension, "cpp");
        assert_eq!(config.toolchain.sanitize, Some(Sanitizer::Address));
        assert_eq!(config.toolchain.std, "c++17");
    }

    #[test]
    fn test_dependency_table_replaces_defaults() {
        let config: Config = toml::from_str(
            r#"
            [[dependency]]
            name = "glm"
            repo = "https://github.com/g-truc/glm.git"
            path = "third_party/glm"
            fetch = "manual"
            pin = "1.0.1"

            [[feature]]
            name = "vaapi"
            flags = ["--enable-vaapi"]
            probe = { kind = "packages", packages = ["libva"] }
            "#,
        )
        .unwrap();

        assert_eq!(config.dependencies.len(), 1);
        let glm = &config.dependencies[0];
        assert_eq!(glm.fetch, FetchPolicy::Manual);
        assert_eq!(glm.pin.as_deref(), Some("1.0.1"));
        assert_eq!(glm.recipe, BuildRecipe::HeaderOnly);

        assert_eq!(config.features.len(), 1);
        assert!(matches!(config.features[0].probe, Probe::Packages { .. }));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = Config::load_or_default(&tmp.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config.engine.name, "engine");
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        std::fs::write(&path, "[engine\nname = 1").unwrap();

        let err = Config::load_or_default(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("failed to parse config"));
    }
}
