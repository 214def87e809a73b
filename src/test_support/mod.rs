//! Test utilities and mocks for unit tests.
//!
//! Provides a scripted [`ProcessExecutor`] so phases that shell out to
//! compilers, linkers, cmake or `ldconfig` can be tested without those tools.
//!
//! # Example
//!
//! ```rust,ignore
//! use motive_build::test_support::{MockExecutor, MockProcessOutput};
//!
//! let exec = MockExecutor::new();
//! exec.expect_prefix("g++ -print-file-name", MockProcessOutput::success("/usr/lib/libm.so\n"));
//! ```

pub mod fixtures;

use std::io;
use std::sync::Mutex;

use crate::util::process::{ProcessBuilder, ProcessExecutor, ProcessOutput};

pub use fixtures::*;

/// Mock process output for testing command execution.
#[derive(Debug, Clone)]
pub struct MockProcessOutput {
    /// Exit status code (0 = success).
    pub status: i32,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

impl MockProcessOutput {
    /// Create a successful output with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        MockProcessOutput {
            status: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Create a failure output with the given stderr and status code.
    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        MockProcessOutput {
            status,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    fn to_output(&self) -> ProcessOutput {
        ProcessOutput {
            code: Some(self.status),
            stdout: self.stdout.clone(),
            stderr: self.stderr.clone(),
        }
    }
}

/// Pattern for matching commands in MockExecutor.
#[derive(Debug, Clone)]
pub enum CommandPattern {
    /// Exact match on full command string.
    Exact(String),
    /// Match if command starts with prefix.
    StartsWith(String),
    /// Match if command contains substring.
    Contains(String),
}

impl CommandPattern {
    /// Check if this pattern matches the given command.
    pub fn matches(&self, cmd: &str) -> bool {
        match self {
            CommandPattern::Exact(s) => cmd == s,
            CommandPattern::StartsWith(s) => cmd.starts_with(s),
            CommandPattern::Contains(s) => cmd.contains(s),
        }
    }
}

#[derive(Debug)]
struct Expectation {
    pattern: CommandPattern,
    output: MockProcessOutput,
}

#[derive(Debug, Default)]
struct State {
    expectations: Vec<Expectation>,
    calls: Vec<String>,
    default_output: Option<MockProcessOutput>,
}

/// Mock process executor.
///
/// Expectations are matched in insertion order; the first match wins.
/// Unmatched commands behave like a missing program (`NotFound`) unless a
/// default output is set. Every invocation is recorded, including its
/// working directory when one was set (`(cd DIR) cmd ...`).
#[derive(Debug, Default)]
pub struct MockExecutor {
    state: Mutex<State>,
}

impl MockExecutor {
    /// Create a new mock executor.
    pub fn new() -> Self {
        MockExecutor::default()
    }

    fn push(&self, pattern: CommandPattern, output: MockProcessOutput) -> &Self {
        self.state
            .lock()
            .unwrap()
            .expectations
            .push(Expectation { pattern, output });
        self
    }

    /// Add an expectation for an exact command match.
    pub fn expect(&self, cmd: &str, output: MockProcessOutput) -> &Self {
        self.push(CommandPattern::Exact(cmd.to_string()), output)
    }

    /// Add an expectation for a command starting with a prefix.
    pub fn expect_prefix(&self, prefix: &str, output: MockProcessOutput) -> &Self {
        self.push(CommandPattern::StartsWith(prefix.to_string()), output)
    }

    /// Add an expectation for a command containing a substring.
    pub fn expect_contains(&self, substring: &str, output: MockProcessOutput) -> &Self {
        self.push(CommandPattern::Contains(substring.to_string()), output)
    }

    /// Set a default output for commands that don't match any expectation.
    pub fn set_default(&self, output: MockProcessOutput) -> &Self {
        self.state.lock().unwrap().default_output = Some(output);
        self
    }

    /// Get all commands that were called, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Calls whose command line contains `needle`.
    pub fn calls_containing(&self, needle: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.contains(needle))
            .collect()
    }
}

impl ProcessExecutor for MockExecutor {
    fn run(&self, cmd: &ProcessBuilder) -> io::Result<ProcessOutput> {
        let full_cmd = cmd.display_command();
        let mut state = self.state.lock().unwrap();

        let recorded = match cmd.get_cwd() {
            Some(cwd) => format!("(cd {}) {}", cwd.display(), full_cmd),
            None => full_cmd.clone(),
        };
        state.calls.push(recorded);

        if let Some(exp) = state
            .expectations
            .iter()
            .find(|e| e.pattern.matches(&full_cmd))
        {
            return Ok(exp.output.to_output());
        }

        match state.default_output {
            Some(ref default) => Ok(default.to_output()),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("unexpected command: {}", full_cmd),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_executor_first_match_wins() {
        let exec = MockExecutor::new();
        exec.expect("pkg-config --exists libva", MockProcessOutput::success(""));
        exec.expect_prefix("pkg-config", MockProcessOutput::failure(1, ""));

        let hit = exec
            .run(&ProcessBuilder::new("pkg-config").args(["--exists", "libva"]))
            .unwrap();
        let miss = exec
            .run(&ProcessBuilder::new("pkg-config").args(["--exists", "vdpau"]))
            .unwrap();

        assert!(hit.success());
        assert!(!miss.success());
        assert_eq!(exec.calls().len(), 2);
    }

    #[test]
    fn test_mock_executor_unmatched_is_not_found() {
        let exec = MockExecutor::new();
        let err = exec.run(&ProcessBuilder::new("nvcc")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_mock_executor_records_cwd() {
        let exec = MockExecutor::new();
        exec.set_default(MockProcessOutput::success(""));
        exec.run(&ProcessBuilder::new("make").cwd("/deps/glfw/build"))
            .unwrap();

        assert_eq!(exec.calls(), vec!["(cd /deps/glfw/build) make".to_string()]);
    }
}
