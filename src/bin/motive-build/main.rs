//! motive-build CLI - dependency bootstrap and build driver for the Motive engine

use std::io::IsTerminal;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use motive_build::core::BuildError;
use motive_build::util::diagnostic;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    let color = !cli.global.no_color && std::io::stderr().is_terminal();

    // Set up logging
    let filter = if cli.global.verbose {
        EnvFilter::new("motive_build=debug")
    } else {
        EnvFilter::new("motive_build=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        match e.downcast_ref::<BuildError>() {
            Some(err) => {
                diagnostic::emit(&err.to_diagnostic(), color);
                std::process::exit(err.exit_code());
            }
            None => {
                eprintln!("error: {:#}", e);
                std::process::exit(1);
            }
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let global = cli.global;

    match cli.command {
        Commands::Bootstrap => commands::bootstrap::execute(&global),
        Commands::Features(args) => commands::features::execute(args, &global),
        Commands::Libs => commands::libs::execute(&global),
        Commands::Shaders => commands::shaders::execute(&global),
        Commands::Compile(args) => commands::compile::execute(args, &global),
        Commands::Build(args) => commands::build::execute(args, &global),
    }
}
