//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use motive_build::core::RuntimeKind;

/// motive-build - dependency bootstrap and native build orchestrator for the
/// Motive engine
#[derive(Parser)]
#[command(name = "motive-build")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command.
#[derive(Args)]
pub struct GlobalArgs {
    /// Project root; every other path is derived from it
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Configuration file (defaults to <root>/motive.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ensure, update and build every third-party dependency
    Bootstrap,

    /// Probe optional hardware-acceleration features
    Features(FeaturesArgs),

    /// Resolve and print the link-argument list
    Libs,

    /// Compile shaders
    Shaders,

    /// Compile and link the engine against already-built dependencies
    Compile(CompileArgs),

    /// Bootstrap dependencies, then compile and link the engine
    Build(CompileArgs),
}

#[derive(Args)]
pub struct FeaturesArgs {
    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct CompileArgs {
    /// Number of parallel jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Emit compile_commands.json
    #[arg(long)]
    pub emit_compile_commands: bool,

    /// Runtime library kind (static or dynamic); overrides `engine.runtime`
    #[arg(long)]
    pub runtime: Option<RuntimeKind>,
}
