//! Diff command: print every change between two schema versions.
//!
//! Usage:
//!   capdiff diff --old v1.capnp --new v2.capnp
//!   capdiff diff --old api.capnp --old-git HEAD~1 --new api.capnp --format json

use crate::commands::InputArgs;
use crate::render;
use capdiff_loader::attach_source_context;
use clap::{Args, ValueEnum};

#[derive(Debug, Args)]
pub struct DiffArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Attach line/column info and N lines of context to each change
    #[arg(long, value_name = "LINES")]
    pub context: Option<u32>,

    /// Disable colors in text output
    #[arg(long)]
    pub no_color: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Execute diff command
pub fn execute(args: DiffArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut diff = args.input.load_and_diff()?;
    if let Some(context_lines) = args.context {
        attach_source_context(&mut diff, context_lines)?;
    }

    if args.no_color {
        colored::control::set_override(false);
    }
    match args.format {
        OutputFormat::Text => print!("{}", render::text::render(&diff)),
        OutputFormat::Json => println!("{}", render::json::render(&diff)?),
    }
    Ok(())
}
