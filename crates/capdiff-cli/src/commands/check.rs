//! Check command: CI gate on the worst breakage in a diff.
//!
//! Exit codes: 0 when the change set passes, 2 when source-breaking
//! changes block it, 3 for wire-breaking changes.

use crate::commands::InputArgs;
use crate::render;
use capdiff_core::Breakage;
use clap::{Args, ValueEnum};

#[derive(Debug, Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Lowest breakage level that fails the check
    #[arg(long, value_enum, default_value_t = FailOn::Code)]
    pub fail_on: FailOn,

    /// Only set the exit code; print nothing
    #[arg(long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FailOn {
    Code,
    Wire,
}

/// Execute check command, returning the process exit code.
pub fn execute(args: CheckArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let diff = args.input.load_and_diff()?;
    if !args.quiet {
        print!("{}", render::text::render(&diff));
    }

    let code = match (diff.max_breakage(), args.fail_on) {
        (Breakage::Wire, _) => 3,
        (Breakage::Code, FailOn::Code) => 2,
        _ => 0,
    };
    Ok(code)
}
