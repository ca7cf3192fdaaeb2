//! Human-readable renderer: one line per change, breakage tag first, with
//! optional line/column and snippet detail from the source locator.

use capdiff_core::{Breakage, SchemaDiff};
use colored::Colorize;
use std::fmt::Write as _;

pub fn render(diff: &SchemaDiff) -> String {
    if diff.is_empty() {
        return "No changes.\n".to_string();
    }

    let mut out = String::new();
    for change in &diff.changes {
        let path = diff.path_of(change.file_id).unwrap_or("<unknown>");
        let _ = writeln!(
            out,
            "{} {}:{}-{} {}",
            breakage_tag(change.breakage),
            path,
            change.location.start_byte,
            change.location.end_byte,
            change.kind.describe()
        );
        if let Some(source) = &change.source {
            let _ = writeln!(
                out,
                "       at line {}, column {}",
                source.start_position.line, source.start_position.column
            );
            if let Some(snippet) = &source.snippet {
                for line in snippet.lines() {
                    let _ = writeln!(out, "       | {line}");
                }
            }
        }
    }

    let wire = count(diff, Breakage::Wire);
    let code = count(diff, Breakage::Code);
    let none = count(diff, Breakage::None);
    let _ = writeln!(
        out,
        "\n{} change(s): {} wire-breaking, {} source-breaking, {} compatible",
        diff.changes.len(),
        wire,
        code,
        none
    );
    out
}

fn count(diff: &SchemaDiff, breakage: Breakage) -> usize {
    diff.changes
        .iter()
        .filter(|c| c.breakage == breakage)
        .count()
}

fn breakage_tag(breakage: Breakage) -> String {
    match breakage {
        Breakage::Wire => format!("[{}]", "wire".red().bold()),
        Breakage::Code => format!("[{}]", "code".yellow()),
        Breakage::None => format!("[{}]", "none".green()),
    }
}
