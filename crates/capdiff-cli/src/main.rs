//! capdiff CLI
//!
//! Command-line interface for the Cap'n Proto schema differ.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod render;

#[derive(Debug, Parser)]
#[command(name = "capdiff")]
#[command(about = "Semantic diff for Cap'n Proto schemas", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compare two schema versions and print every change
    Diff(commands::diff::DiffArgs),
    /// Compare two schema versions and gate on the worst breakage
    Check(commands::check::CheckArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Diff(args) => commands::diff::execute(args).map(|()| 0),
        Commands::Check(args) => commands::check::execute(args),
    };

    match result {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
