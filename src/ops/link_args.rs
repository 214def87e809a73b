//! Implementation of `motive-build libs`.

use std::path::PathBuf;

use anyhow::Result;

use crate::builder::BuildContext;
use crate::core::library::LinkArgs;
use crate::resolver::LibraryResolver;
use crate::util::config::{Config, EngineConfig};
use crate::util::context::RootConfig;
use crate::util::diagnostic::Diagnostic;
use crate::util::shell::{Shell, Status};

/// Configured library directories, resolved against the deps directory.
pub fn engine_lib_dirs(root: &RootConfig, engine: &EngineConfig) -> Vec<PathBuf> {
    engine.lib_dirs.iter().map(|d| root.in_deps(d)).collect()
}

/// Configured include directories, resolved against the deps directory.
pub fn engine_include_dirs(root: &RootConfig, engine: &EngineConfig) -> Vec<PathBuf> {
    engine.include_dirs.iter().map(|d| root.in_deps(d)).collect()
}

/// Resolve the required and optional libraries into the final link list.
///
/// Fails naming every missing required library. Missing optional
/// libraries produce one warning and are left out.
pub fn resolve_link_args(ctx: &BuildContext, config: &Config, shell: &Shell) -> Result<LinkArgs> {
    let libraries = &config.libraries;
    shell.status(
        Status::Resolving,
        format!(
            "{} required and {} optional libraries",
            libraries.required.len(),
            libraries.optional.len()
        ),
    );

    let mut resolver = LibraryResolver::new(
        ctx.executor(),
        ctx.toolchain(),
        engine_lib_dirs(&ctx.root, &config.engine),
    );
    let args = resolver.collect(&libraries.required, &libraries.optional)?;

    for reference in &args.references {
        tracing::debug!("{} -> {} ({})", reference.name, reference.argument, reference.tier.as_str());
    }

    if !args.missing_optional.is_empty() {
        shell.diagnostic(&missing_optional_warning(&args.missing_optional));
    }

    shell.status(
        Status::Finished,
        format!("resolved {} link arguments", args.references.len()),
    );

    Ok(args)
}

fn missing_optional_warning(names: &[String]) -> Diagnostic {
    Diagnostic::warning(format!(
        "optional libraries not found, linking without them: {}",
        names.join(", ")
    ))
    .with_suggestion("install the matching development packages to enable them")
}
