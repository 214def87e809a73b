//! Library resolution.
//!
//! Turns a library name into a link argument through three tiers, first
//! success wins:
//!
//! 1. **Compiler**: ask the driver where it would find `lib<name>.so`, then
//!    `lib<name>.a`. An answer that differs from the bare file name and
//!    exists means the compiler's own search finds it, so `-l<name>` is used.
//! 2. **Search directories**: configured directories in priority order,
//!    `lib<name>.a` before `lib<name>.so` within a directory. The first
//!    existing file is used by absolute path.
//! 3. **Linker cache**: `ldconfig -p` entries whose soname is `lib<name>`
//!    plus a version suffix only. The cached path is used if it exists.
//!
//! Results are cached for the lifetime of the resolver.

pub mod ldconfig;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::builder::toolchain::Toolchain;
use crate::core::error::BuildError;
use crate::core::library::{LibraryReference, LinkArgs, LinkArgument, ResolutionTier};
use crate::util::process::{find_executable, ProcessBuilder, ProcessExecutor};

use ldconfig::CacheEntry;

/// Resolves library names to link arguments.
pub struct LibraryResolver<'a> {
    executor: &'a dyn ProcessExecutor,
    toolchain: &'a dyn Toolchain,
    lib_dirs: Vec<PathBuf>,
    ldconfig: PathBuf,
    resolved: HashMap<String, Option<LibraryReference>>,
    linker_cache: Option<Vec<CacheEntry>>,
}

impl<'a> LibraryResolver<'a> {
    /// Create a resolver searching `lib_dirs` (absolute, priority order).
    pub fn new(
        executor: &'a dyn ProcessExecutor,
        toolchain: &'a dyn Toolchain,
        lib_dirs: Vec<PathBuf>,
    ) -> Self {
        let ldconfig = find_executable("ldconfig").unwrap_or_else(|| PathBuf::from("/sbin/ldconfig"));

        LibraryResolver {
            executor,
            toolchain,
            lib_dirs,
            ldconfig,
            resolved: HashMap::new(),
            linker_cache: None,
        }
    }

    /// Use a specific `ldconfig` program.
    pub fn with_ldconfig(mut self, ldconfig: impl Into<PathBuf>) -> Self {
        self.ldconfig = ldconfig.into();
        self
    }

    /// Resolve one library. `None` when no tier finds it.
    pub fn resolve(&mut self, name: &str) -> Option<LibraryReference> {
        if let Some(cached) = self.resolved.get(name) {
            return cached.clone();
        }

        let found = self
            .from_compiler(name)
            .or_else(|| self.from_search_dirs(name))
            .or_else(|| self.from_linker_cache(name));

        match found {
            Some(ref r) => tracing::debug!("resolved {} via {}: {}", name, r.tier.as_str(), r.argument),
            None => tracing::debug!("could not resolve {}", name),
        }

        self.resolved.insert(name.to_string(), found.clone());
        found
    }

    /// Resolve the full link list.
    ///
    /// Both lists are resolved in full before failing, so the error names
    /// every missing required library and also carries the missing optional
    /// ones. On success, missing optional libraries are recorded in
    /// [`LinkArgs::missing_optional`] and left out.
    pub fn collect(&mut self, required: &[String], optional: &[String]) -> Result<LinkArgs, BuildError> {
        let mut args = LinkArgs::default();
        let mut missing_required = Vec::new();

        for name in required {
            match self.resolve(name) {
                Some(reference) => args.references.push(reference),
                None => missing_required.push(name.clone()),
            }
        }

        for name in optional {
            match self.resolve(name) {
                Some(reference) => args.references.push(reference),
                None => args.missing_optional.push(name.clone()),
            }
        }

        if !missing_required.is_empty() {
            return Err(BuildError::UnresolvedLibraries {
                names: missing_required,
                missing_optional: args.missing_optional,
            });
        }

        Ok(args)
    }

    fn from_compiler(&self, name: &str) -> Option<LibraryReference> {
        let candidates = [
            self.toolchain.shared_lib_name(name),
            self.toolchain.static_lib_name(name),
        ];

        for file in candidates {
            let cmd = self.toolchain.print_file_name_command(&file).to_process();
            // A driver that cannot run is a miss, not an error.
            let output = match self.executor.run(&cmd) {
                Ok(output) if output.success() => output,
                _ => continue,
            };

            let answer = output.stdout.trim();
            if !answer.is_empty() && answer != file && Path::new(answer).exists() {
                return Some(LibraryReference {
                    name: name.to_string(),
                    tier: ResolutionTier::Compiler,
                    argument: LinkArgument::Flag(format!("-l{}", name)),
                });
            }
        }
        None
    }

    fn from_search_dirs(&self, name: &str) -> Option<LibraryReference> {
        let files = [
            self.toolchain.static_lib_name(name),
            self.toolchain.shared_lib_name(name),
        ];

        for dir in &self.lib_dirs {
            for file in &files {
                let candidate = dir.join(file);
                if candidate.is_file() {
                    return Some(LibraryReference {
                        name: name.to_string(),
                        tier: ResolutionTier::SearchDir,
                        argument: LinkArgument::Path(candidate),
                    });
                }
            }
        }
        None
    }

    fn from_linker_cache(&mut self, name: &str) -> Option<LibraryReference> {
        let entries = self.linker_cache();

        ldconfig::candidates(entries, name)
            .into_iter()
            .find(|e| e.path.exists())
            .map(|e| LibraryReference {
                name: name.to_string(),
                tier: ResolutionTier::LinkerCache,
                argument: LinkArgument::Path(e.path.clone()),
            })
    }

    fn linker_cache(&mut self) -> &[CacheEntry] {
        if self.linker_cache.is_none() {
            let cmd = ProcessBuilder::new(&self.ldconfig).arg("-p");
            let entries = match self.executor.run(&cmd) {
                Ok(output) if output.success() => ldconfig::parse(&output.stdout),
                Ok(output) => {
                    tracing::debug!("`{}` exited with {:?}", cmd.display_command(), output.code);
                    Vec::new()
                }
                Err(e) => {
                    tracing::debug!("linker cache unavailable: {}", e);
                    Vec::new()
                }
            };
            self.linker_cache = Some(entries);
        }
        self.linker_cache.as_deref().unwrap_or_default()
    }
}
