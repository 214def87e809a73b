//! GCC/Clang toolchain implementation.

use std::path::{Path, PathBuf};

use super::{ArchiveInput, CommandSpec, CompileInput, LinkInput, Toolchain};

/// GCC-style driver (g++, clang++) plus `ar`.
#[derive(Debug, Clone)]
pub struct GccToolchain {
    /// Path to the C++ compiler
    pub cxx: PathBuf,
    /// Path to the archiver
    pub ar: PathBuf,
}

impl GccToolchain {
    /// Create a new GCC-style toolchain.
    pub fn new(cxx: impl Into<PathBuf>, ar: impl Into<PathBuf>) -> Self {
        GccToolchain {
            cxx: cxx.into(),
            ar: ar.into(),
        }
    }

    fn link_tail(mut cmd: CommandSpec, input: &LinkInput) -> CommandSpec {
        // Output
        cmd = cmd.arg("-o");
        cmd = cmd.arg(input.output.display().to_string());

        // Object files
        for obj in &input.objects {
            cmd = cmd.arg(obj.display().to_string());
        }

        // Library search paths
        for dir in &input.lib_dirs {
            cmd = cmd.arg(format!("-L{}", dir.display()));
        }

        // Libraries, order preserved
        cmd = cmd.args(input.link_args.iter().cloned());

        // Custom flags
        cmd.args(input.ldflags.iter().cloned())
    }
}

impl Toolchain for GccToolchain {
    fn compiler_path(&self) -> &Path {
        &self.cxx
    }

    fn archiver_path(&self) -> &Path {
        &self.ar
    }

    fn compile_command(&self, input: &CompileInput) -> CommandSpec {
        let mut cmd = CommandSpec::new(&self.cxx);

        if let Some(ref std) = input.std {
            cmd = cmd.arg(format!("-std={}", std));
        }

        // Custom flags
        cmd = cmd.args(input.cflags.iter().cloned());

        // Every object may end up in a shared runtime
        cmd = cmd.arg("-fPIC");

        // Compile only
        cmd = cmd.arg("-c");

        // Include directories
        for dir in &input.include_dirs {
            cmd = cmd.arg(format!("-I{}", dir.display()));
        }

        // Input and output
        cmd = cmd.arg(input.source.display().to_string());
        cmd = cmd.arg("-o");
        cmd.arg(input.output.display().to_string())
    }

    fn archive_command(&self, input: &ArchiveInput) -> CommandSpec {
        let mut cmd = CommandSpec::new(&self.ar);

        // Create archive with symbol index, replace files
        cmd = cmd.arg("rcs");
        cmd = cmd.arg(input.output.display().to_string());

        for obj in &input.objects {
            cmd = cmd.arg(obj.display().to_string());
        }

        cmd
    }

    fn link_shared_command(&self, input: &LinkInput) -> CommandSpec {
        let cmd = CommandSpec::new(&self.cxx).arg("-shared");
        Self::link_tail(cmd, input)
    }

    fn link_exe_command(&self, input: &LinkInput) -> CommandSpec {
        Self::link_tail(CommandSpec::new(&self.cxx), input)
    }

    fn print_file_name_command(&self, file: &str) -> CommandSpec {
        CommandSpec::new(&self.cxx).arg(format!("-print-file-name={}", file))
    }
}
