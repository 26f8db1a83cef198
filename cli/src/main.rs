//! # dotlink Main Entry Point
//!
//! File: cli/src/main.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This file serves as the main entry point for the dotlink CLI application.
//! It handles:
//! - Command-line argument parsing using Clap
//! - Setting up the logging system based on verbosity flags
//! - Routing execution to the command handlers
//! - Turning the outcome into a process exit status
//!
//! ## Architecture
//!
//! Each top-level command is a variant of the `Commands` enum mapped to a
//! handler in its module. Errors propagate to this level and are reported
//! uniformly. A run in which some links failed is not an error, but it still
//! exits with status 1.
//!
//! ## Examples
//!
//! ```bash
//! # Get help
//! dotlink --help
//!
//! # Set up links with per-entry progress
//! dotlink -vv link
//! ```
//!
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod commands; // Command logic (link)
mod common; // Shared utilities (fs, process)
mod core; // Core infrastructure (errors, config, manifest, context)

/// Top-level command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "dotlink",
    about = "dotlink: declarative symlink manager for dotfiles",
    long_about = "Reads a mapping of destination paths to sources and converges the\n\
                  filesystem onto it: creates, repairs and verifies symbolic links,\n\
                  backing up anything it displaces.",
    propagate_version = true,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

/// All available top-level commands.
#[derive(Parser, Debug)]
enum Commands {
    /// Create or repair every link declared in the mapping document.
    #[command(alias = "l")]
    Link(commands::link::LinkArgs),
}

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    let command_result = match cli.command {
        Commands::Link(args) => commands::link::handle_link(args),
    };

    match command_result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            tracing::error!("Command execution failed: {:?}", e);
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
