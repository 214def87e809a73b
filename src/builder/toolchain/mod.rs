//! Toolchain abstraction for the C++ compiler driver.
//!
//! This module turns compile/archive/link requests into explicit argument
//! vectors. Only GCC-style drivers (g++, clang++) are supported.
//!
//! Toolchain detection priority:
//! 1. `[toolchain]` section of `motive.toml`
//! 2. Environment variables (`CXX`, `AR`)
//! 3. Searching PATH for common compilers

use std::path::{Path, PathBuf};

use crate::util::process::ProcessBuilder;

mod detect;
mod gcc;

pub use detect::detect_toolchain;
pub use gcc::GccToolchain;

/// A command to execute, with program and arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// The program to run (e.g., "g++", "ar")
    pub program: PathBuf,
    /// Command arguments
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Create a new command spec.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Add an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(|a| a.into()));
        self
    }

    /// Convert into a runnable process.
    pub fn to_process(&self) -> ProcessBuilder {
        ProcessBuilder::new(&self.program).args(&self.args)
    }
}

/// Input for a compile step.
#[derive(Debug, Clone, Default)]
pub struct CompileInput {
    /// Source file to compile
    pub source: PathBuf,
    /// Output object file
    pub output: PathBuf,
    /// Language standard (e.g. "c++17")
    pub std: Option<String>,
    /// Include directories
    pub include_dirs: Vec<PathBuf>,
    /// Additional compiler flags
    pub cflags: Vec<String>,
}

/// Input for an archive step (creating static library).
#[derive(Debug, Clone)]
pub struct ArchiveInput {
    /// Object files to archive
    pub objects: Vec<PathBuf>,
    /// Output archive file
    pub output: PathBuf,
}

/// Input for a link step.
///
/// Arguments are emitted in field order after the objects: search dirs,
/// then `link_args` exactly as given, then `ldflags`. Callers put the
/// runtime library at the front of `link_args` so it precedes the raw
/// system libraries it depends on.
#[derive(Debug, Clone, Default)]
pub struct LinkInput {
    /// Object files to link
    pub objects: Vec<PathBuf>,
    /// Output file (executable or shared library)
    pub output: PathBuf,
    /// Library search paths
    pub lib_dirs: Vec<PathBuf>,
    /// Libraries: `-l` flags or absolute paths
    pub link_args: Vec<String>,
    /// Additional linker flags
    pub ldflags: Vec<String>,
}

/// Trait for toolchain implementations.
pub trait Toolchain: Send + Sync {
    /// The compiler driver, also used for linking.
    fn compiler_path(&self) -> &Path;

    /// The archiver.
    fn archiver_path(&self) -> &Path;

    /// Generate a compile command.
    fn compile_command(&self, input: &CompileInput) -> CommandSpec;

    /// Generate an archive command (create static library).
    fn archive_command(&self, input: &ArchiveInput) -> CommandSpec;

    /// Generate a link command for a shared library.
    fn link_shared_command(&self, input: &LinkInput) -> CommandSpec;

    /// Generate a link command for an executable.
    fn link_exe_command(&self, input: &LinkInput) -> CommandSpec;

    /// Ask the driver which file it would use for `file` (`-print-file-name`).
    fn print_file_name_command(&self, file: &str) -> CommandSpec;

    /// `lib<name>.a`
    fn static_lib_name(&self, name: &str) -> String {
        format!("lib{}.a", name)
    }

    /// `lib<name>.so`
    fn shared_lib_name(&self, name: &str) -> String {
        format!("lib{}.so", name)
    }
}
