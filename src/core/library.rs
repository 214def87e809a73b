//! Resolved link arguments.

use std::fmt;
use std::path::PathBuf;

/// Which resolution tier produced a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionTier {
    /// The compiler's own search path (`-print-file-name`).
    Compiler,
    /// An explicitly configured library directory.
    SearchDir,
    /// The system shared-library cache (`ldconfig -p`).
    LinkerCache,
}

impl ResolutionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionTier::Compiler => "compiler",
            ResolutionTier::SearchDir => "search-dir",
            ResolutionTier::LinkerCache => "linker-cache",
        }
    }
}

/// The token handed to the linker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkArgument {
    /// `-l<name>`, left to the compiler's search.
    Flag(String),
    /// A library file given by absolute path.
    Path(PathBuf),
}

impl LinkArgument {
    /// The argument as passed on the command line.
    pub fn to_arg(&self) -> String {
        match self {
            LinkArgument::Flag(flag) => flag.clone(),
            LinkArgument::Path(path) => path.display().to_string(),
        }
    }
}

impl fmt::Display for LinkArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_arg())
    }
}

/// A requested library and how it was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryReference {
    pub name: String,
    pub tier: ResolutionTier,
    pub argument: LinkArgument,
}

/// The final link-argument list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkArgs {
    /// Resolved references; required libraries first, then optional ones.
    pub references: Vec<LibraryReference>,
    /// Optional libraries that were left out.
    pub missing_optional: Vec<String>,
}

impl LinkArgs {
    /// Linker arguments in order.
    pub fn args(&self) -> Vec<String> {
        link_arguments(&self.references)
    }
}

/// Command-line tokens for `references`, in order.
pub fn link_arguments(references: &[LibraryReference]) -> Vec<String> {
    references.iter().map(|r| r.argument.to_arg()).collect()
}
