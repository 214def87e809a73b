//! Subprocess execution utilities.
//!
//! Every external tool (git helpers, cmake, make, the compiler, the linker,
//! the shader compiler, `pkg-config`, `ldconfig`) is invoked through an
//! explicit argument vector. Nothing goes through a shell.

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::core::error::BuildError;

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Get the arguments.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Get the working directory, if one was set.
    pub fn get_cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd
    }

    /// Run through an executor and require a zero exit status.
    ///
    /// A program that cannot be spawned because it does not exist is a
    /// missing prerequisite; a non-zero exit is a command failure carrying
    /// the exact command line.
    pub fn exec_checked(
        &self,
        executor: &dyn ProcessExecutor,
        context: &str,
    ) -> Result<ProcessOutput, BuildError> {
        let output = executor.run(self).map_err(|e| self.spawn_error(e))?;

        if !output.success() {
            return Err(BuildError::CommandFailed {
                context: context.to_string(),
                command: self.display_command(),
                code: output.code,
                stderr: output.stderr,
            });
        }

        Ok(output)
    }

    /// Convert a spawn failure into the error taxonomy.
    pub fn spawn_error(&self, err: io::Error) -> BuildError {
        if err.kind() == io::ErrorKind::NotFound {
            BuildError::MissingPrerequisite {
                what: format!("`{}` was not found", self.program.display()),
                remediation: vec![format!(
                    "install `{}` and make sure it is on PATH",
                    self.program.display()
                )],
            }
        } else {
            BuildError::CommandFailed {
                context: "spawn".to_string(),
                command: self.display_command(),
                code: None,
                stderr: err.to_string(),
            }
        }
    }

    /// Display the command for error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Captured result of a finished subprocess.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// Whether the process exited with status zero.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs subprocesses to completion.
///
/// Invocations are synchronous and block the calling thread; the compile
/// pool gets its concurrency from running one invocation per worker.
pub trait ProcessExecutor: Send + Sync {
    /// Spawn the command and wait for it. `Err` only when it could not be
    /// spawned; a non-zero exit is reported through [`ProcessOutput`].
    fn run(&self, cmd: &ProcessBuilder) -> io::Result<ProcessOutput>;
}

/// Executor backed by `std::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

impl ProcessExecutor for SystemExecutor {
    fn run(&self, cmd: &ProcessBuilder) -> io::Result<ProcessOutput> {
        tracing::debug!("running `{}`", cmd.display_command());

        let output = cmd
            .build_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;

        Ok(ProcessOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Find an executable in an explicit search path (a `PATH`-style string).
pub fn find_executable_in(name: &str, search_path: &str, cwd: &Path) -> Option<PathBuf> {
    which::which_in(name, Some(search_path), cwd).ok()
}
