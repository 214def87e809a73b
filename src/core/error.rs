//! Fatal error taxonomy.
//!
//! Every phase reports fatal conditions through [`BuildError`]; the binary
//! uses [`BuildError::exit_code`] to pick the process exit code.
//! Non-fatal conditions (missing optional libraries, unavailable optional
//! features) are never errors: they travel in phase reports instead.

use std::path::PathBuf;

use thiserror::Error;

use crate::util::diagnostic::Diagnostic;

/// A fatal condition that halts the current phase.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A tree, tool or directory the build cannot proceed without.
    #[error("missing prerequisite: {what}")]
    MissingPrerequisite {
        what: String,
        remediation: Vec<String>,
    },

    /// An external command exited non-zero.
    #[error("command failed while {context}: `{command}`")]
    CommandFailed {
        context: String,
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// Required libraries that no resolution tier could find.
    #[error("missing required libraries: {}", names.join(", "))]
    UnresolvedLibraries {
        names: Vec<String>,
        /// Optional libraries that were not found either.
        missing_optional: Vec<String>,
    },

    /// A translation unit failed to compile.
    #[error("failed to compile {}", source_file.display())]
    CompileFailed {
        source_file: PathBuf,
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// One or more link targets failed.
    #[error("failed to link {}", failures.iter().map(|f| f.target.as_str()).collect::<Vec<_>>().join(", "))]
    LinkFailed { failures: Vec<LinkFailure> },
}

/// A single failed link.
#[derive(Debug, Clone)]
pub struct LinkFailure {
    pub target: String,
    pub command: String,
    pub code: Option<i32>,
    pub stderr: String,
}

impl BuildError {
    /// Process exit code for this error.
    ///
    /// External command failures mirror the command's own exit code.
    pub fn exit_code(&self) -> i32 {
        let code = match self {
            BuildError::CommandFailed { code, .. } | BuildError::CompileFailed { code, .. } => {
                *code
            }
            BuildError::LinkFailed { failures } => failures.first().and_then(|f| f.code),
            BuildError::MissingPrerequisite { .. } | BuildError::UnresolvedLibraries { .. } => {
                None
            }
        };

        match code {
            Some(c) if c != 0 => c,
            _ => 1,
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            BuildError::MissingPrerequisite { what, remediation } => {
                let mut diag = Diagnostic::error(format!("missing prerequisite: {}", what));
                for fix in remediation {
                    diag = diag.with_suggestion(fix.clone());
                }
                diag
            }

            BuildError::CommandFailed {
                context,
                command,
                code,
                stderr,
            } => Diagnostic::error(format!("command failed while {}", context))
                .with_context(format!("command: {}", command))
                .with_context(exit_line(*code))
                .with_stderr(stderr),

            BuildError::UnresolvedLibraries {
                names,
                missing_optional,
            } => {
                let mut diag = Diagnostic::error(format!(
                    "missing required libraries: {}",
                    names.join(", ")
                ));
                if !missing_optional.is_empty() {
                    diag = diag.with_context(format!(
                        "optional libraries also missing: {}",
                        missing_optional.join(", ")
                    ));
                }
                diag.with_suggestion("install the matching development packages")
                    .with_suggestion("or add the directory containing them to `engine.lib_dirs`")
            }

            BuildError::CompileFailed {
                source_file,
                command,
                code,
                stderr,
            } => Diagnostic::error(format!("failed to compile {}", source_file.display()))
                .with_location(source_file.clone())
                .with_context(format!("command: {}", command))
                .with_context(exit_line(*code))
                .with_stderr(stderr),

            BuildError::LinkFailed { failures } => {
                let mut diag = Diagnostic::error(format!(
                    "failed to link {} target(s)",
                    failures.len()
                ));
                for failure in failures {
                    diag = diag
                        .with_context(format!("{}: {}", failure.target, failure.command))
                        .with_stderr(&failure.stderr);
                }
                diag
            }
        }
    }
}

fn exit_line(code: Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code: {}", c),
        None => "terminated by signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_mirrors_command() {
        let err = BuildError::CommandFailed {
            context: "building glfw".into(),
            command: "make -j8".into(),
            code: Some(2),
            stderr: String::new(),
        };
        assert_eq!(err.exit_code(), 2);

        let signalled = BuildError::CompileFailed {
            source_file: PathBuf::from("engine.cpp"),
            command: "g++ -c engine.cpp".into(),
            code: None,
            stderr: String::new(),
        };
        assert_eq!(signalled.exit_code(), 1);
    }

    #[test]
    fn test_unresolved_libraries_names_all() {
        let err = BuildError::UnresolvedLibraries {
            names: vec!["glfw3".into(), "vulkan".into()],
            missing_optional: vec!["vdpau".into()],
        };
        assert_eq!(err.to_string(), "missing required libraries: glfw3, vulkan");
        assert_eq!(err.exit_code(), 1);

        let text = err.to_diagnostic().format(false);
        assert!(text.contains("= optional libraries also missing: vdpau"));
    }

    #[test]
    fn test_link_failed_lists_targets() {
        let err = BuildError::LinkFailed {
            failures: vec![
                LinkFailure {
                    target: "motive2d".into(),
                    command: "g++ -o motive2d".into(),
                    code: Some(1),
                    stderr: "undefined reference".into(),
                },
                LinkFailure {
                    target: "motive3d".into(),
                    command: "g++ -o motive3d".into(),
                    code: Some(1),
                    stderr: String::new(),
                },
            ],
        };
        assert_eq!(err.to_string(), "failed to link motive2d, motive3d");
        let rendered = err.to_diagnostic().format(false);
        assert!(rendered.contains("undefined reference"));
    }
}
