//! Source locator: byte ranges to line/column positions and snippets.
//!
//! Runs after diffing. Reads each referenced file once and fills the
//! `source` of every change with 1-based line/column positions computed
//! from its byte range, plus an optional snippet of surrounding lines.

use crate::errors::{LoadError, Result};
use capdiff_core::{Position, SchemaDiff, SourceContext};
use capdiff_model::{NodeId, SourceLocation};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Attach line/column positions (and, with `context_lines > 0`, snippets)
/// to every change whose file can be read.
///
/// # Errors
///
/// `Io` when a referenced file cannot be read. Files the diff does not
/// reference are never touched.
pub fn attach_source_context(diff: &mut SchemaDiff, context_lines: u32) -> Result<()> {
    let paths: HashMap<NodeId, String> = diff
        .files
        .iter()
        .map(|f| (f.id, f.path.clone()))
        .collect();

    let mut contents: HashMap<NodeId, String> = HashMap::new();
    for change in &mut diff.changes {
        let Some(path) = paths.get(&change.file_id) else {
            continue;
        };
        let text = match contents.entry(change.file_id) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let read = std::fs::read_to_string(path)
                    .map_err(|source| LoadError::io(format!("failed to read {path}"), source))?;
                entry.insert(read)
            }
        };
        change.source = Some(source_context(text, change.location, context_lines));
    }
    Ok(())
}

fn source_context(text: &str, location: SourceLocation, context_lines: u32) -> SourceContext {
    let start_position = position_at(text, location.start_byte as usize);
    let end_position = position_at(text, location.end_byte as usize);
    let snippet = (context_lines > 0).then(|| {
        snippet_lines(
            text,
            start_position.line,
            end_position.line,
            context_lines,
        )
    });
    SourceContext {
        start_position,
        end_position,
        snippet,
    }
}

/// 1-based line and column of a byte offset. Offsets past the end clamp to
/// the final position.
fn position_at(text: &str, offset: usize) -> Position {
    let clamped = offset.min(text.len());
    let before = &text.as_bytes()[..clamped];
    let line = before.iter().filter(|b| **b == b'\n').count() as u32 + 1;
    let line_start = before
        .iter()
        .rposition(|b| *b == b'\n')
        .map(|p| p + 1)
        .unwrap_or(0);
    Position {
        line,
        column: (clamped - line_start) as u32 + 1,
    }
}

/// The lines spanning `first..=last` plus `context` lines on both sides.
fn snippet_lines(text: &str, first: u32, last: u32, context: u32) -> String {
    let from = first.saturating_sub(context).max(1) as usize;
    let to = last.saturating_add(context) as usize;
    text.lines()
        .skip(from - 1)
        .take(to - from + 1)
        .collect::<Vec<_>>()
        .join("\n")
}
